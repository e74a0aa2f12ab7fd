//! Rust client generation.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tempfile::NamedTempFile;

use crate::config::GenConfig;
use crate::error::CodegenError;
use crate::method::{MethodDescriptor, ReturnKind, Verb};
use crate::naming::{NameScope, Reserved, pascal_case};
use crate::param::{ParamType, ParameterDescriptor};
use crate::tree::{NodeId, ResourceNode, ResourceTree};

const CLIENT_FIELD: &str = "client";
const PARAMS_LOCAL: &str = "req_params";

/// Parameters in emission order: required before optional, each group
/// sorted by wire name. Ancestor keys are dropped, they come from the
/// constructor.
pub fn ordered_parameters<'m>(
    method: &'m MethodDescriptor,
    key_chain: &[String],
) -> Vec<&'m ParameterDescriptor> {
    let mut params: Vec<&ParameterDescriptor> = method
        .parameters
        .iter()
        .filter(|p| !key_chain.iter().any(|key| key == &p.wire_name))
        .collect();
    params.sort_by(|a, b| {
        a.optional
            .cmp(&b.optional)
            .then_with(|| a.wire_name.cmp(&b.wire_name))
    });
    params
}

pub fn generate(tree: &ResourceTree, config: &GenConfig) -> Result<String, CodegenError> {
    let tokens = Emitter::new(tree, config).emit()?;
    let file = validate_code(tokens)?;
    Ok(format_code(&file, config))
}

pub fn validate_code(tokens: TokenStream) -> Result<syn::File, CodegenError> {
    Ok(syn::parse2(tokens)?)
}

pub fn format_code(file: &syn::File, config: &GenConfig) -> String {
    let mut out = String::from(
        "// This code was automatically generated by gen_client. Do not edit manually.\n",
    );
    if let Some(header) = &config.header {
        for line in header.lines() {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out.push_str(&prettyplease::unparse(file));
    out
}

/// Writes through a temp file and a rename so readers never see a partial file.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), CodegenError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_err = |source| CodegenError::Write {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(dir).map_err(|source| CodegenError::Write {
        path: dir.display().to_string(),
        source,
    })?;
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

struct Emitter<'a> {
    tree: &'a ResourceTree,
    config: &'a GenConfig,
    reserved: Reserved,
    type_names: HashMap<NodeId, Ident>,
    imports: BTreeSet<&'static str>,
    method_count: usize,
}

impl<'a> Emitter<'a> {
    fn new(tree: &'a ResourceTree, config: &'a GenConfig) -> Self {
        Self {
            tree,
            config,
            reserved: config.reserved(),
            type_names: HashMap::new(),
            imports: BTreeSet::new(),
            method_count: 0,
        }
    }

    fn emit(mut self) -> Result<TokenStream, CodegenError> {
        self.assign_type_names();

        let root = self.tree.root();
        let mut items = vec![self.emit_node(root)];
        for id in self.tree.descendants(root) {
            items.push(self.emit_node(id));
        }

        tracing::debug!(
            types = items.len(),
            methods = self.method_count,
            "generated client types"
        );

        let runtime: syn::Path = syn::parse_str(&self.config.runtime_path)?;
        self.imports.insert("Client");
        let imports = self.imports.iter().map(|name| format_ident!("{}", name));

        Ok(quote! {
            use #runtime::{#(#imports),*};

            #(#items)*
        })
    }

    fn assign_type_names(&mut self) {
        let root = self.tree.root();
        let mut used = HashSet::new();
        let root_name = self.config.root_name();
        used.insert(root_name.clone());
        self.type_names.insert(root, format_ident!("{}", root_name));

        let mut bases: HashMap<NodeId, String> = HashMap::new();
        bases.insert(root, self.config.prefix.clone());

        for id in self.tree.descendants(root) {
            let node = self.tree.node(id);
            let parent_base = node
                .parent
                .and_then(|parent| bases.get(&parent))
                .cloned()
                .unwrap_or_default();
            let fragment = if node.is_indexed {
                format!("Item{}", pascal_case(&node.index_name))
            } else {
                pascal_case(&node.name)
            };
            let base = format!("{parent_base}{fragment}");

            let mut name = base.clone();
            let mut idx = 2;
            while !used.insert(name.clone()) {
                name = format!("{base}{idx}");
                idx += 1;
            }
            bases.insert(id, base);
            self.type_names.insert(id, format_ident!("{}", name));
        }
    }

    fn type_name(&self, id: NodeId) -> &Ident {
        &self.type_names[&id]
    }

    fn key_ident(&self, key: &str) -> Ident {
        let mut name = self.reserved.member(key);
        if name == CLIENT_FIELD {
            name.push('_');
        }
        format_ident!("{}", name)
    }

    fn emit_node(&mut self, id: NodeId) -> TokenStream {
        let tree = self.tree;
        let node = tree.node(id);
        let name = self.type_name(id).clone();
        let keys: Vec<Ident> = node.key_chain.iter().map(|k| self.key_ident(k)).collect();

        let struct_doc = if node.resource_path.is_empty() {
            doc_lines("Entry point of the API resource tree.")
        } else {
            doc_lines(&format!("`{}`", node.resource_path))
        };

        let mut scope = NameScope::default();
        let mut members = Vec::new();
        for (child_id, child) in tree.children(id) {
            members.push(self.emit_accessor(&mut scope, node, child_id, child));
        }
        for method in &node.methods {
            members.push(self.emit_method(&mut scope, node, method));
        }

        quote! {
            #(#struct_doc)*
            #[derive(Clone)]
            pub struct #name<'a> {
                client: &'a Client,
                #(#keys: String,)*
            }

            impl<'a> #name<'a> {
                pub fn new(client: &'a Client #(, #keys: String)*) -> Self {
                    Self { client #(, #keys)* }
                }

                #(#members)*
            }
        }
    }

    fn emit_accessor(
        &self,
        scope: &mut NameScope,
        parent: &ResourceNode,
        child_id: NodeId,
        child: &ResourceNode,
    ) -> TokenStream {
        let child_type = self.type_name(child_id);
        let inherited: Vec<Ident> = parent.key_chain.iter().map(|k| self.key_ident(k)).collect();

        if child.is_indexed {
            let accessor = format_ident!("{}", scope.claim(&self.reserved.member(&child.index_name), "item"));
            let key = self.key_ident(&child.index_name);
            let doc = doc_lines(&format!("`{}`", child.resource_path));
            quote! {
                #(#doc)*
                pub fn #accessor(&self, #key: impl ::std::fmt::Display) -> #child_type<'a> {
                    #child_type::new(self.client #(, self.#inherited.clone())*, #key.to_string())
                }
            }
        } else {
            let accessor = format_ident!("{}", scope.claim(&self.reserved.member(&child.name), "resource"));
            quote! {
                pub fn #accessor(&self) -> #child_type<'a> {
                    #child_type::new(self.client #(, self.#inherited.clone())*)
                }
            }
        }
    }

    fn emit_method(
        &mut self,
        scope: &mut NameScope,
        node: &ResourceNode,
        method: &MethodDescriptor,
    ) -> TokenStream {
        self.method_count += 1;
        self.imports.insert("ClientError");
        self.imports.insert("Params");
        self.imports.insert("Verb");

        let fn_name = format_ident!("{}", scope.claim(&self.reserved.member(&method.name), method.verb.as_lower()));
        let verb = match method.verb {
            Verb::Get => quote!(Verb::Get),
            Verb::Post => quote!(Verb::Post),
            Verb::Put => quote!(Verb::Put),
            Verb::Delete => quote!(Verb::Delete),
        };

        let mut locals = NameScope::default();
        locals.claim(PARAMS_LOCAL, "");

        let mut args = Vec::new();
        let mut sets = Vec::new();
        let mut arg_docs = Vec::new();
        for param in ordered_parameters(method, &node.key_chain) {
            let raw = if param.is_indexed_family {
                param.family_prefix()
            } else {
                param.wire_name.as_str()
            };
            let ident = format_ident!("{}", locals.claim(&self.reserved.member(raw), "arg"));
            let wire = param.wire_name.as_str();

            args.push(param_signature(&ident, param));
            sets.push(if param.is_indexed_family {
                if param.optional {
                    quote!(req_params.set_indexed(#wire, #ident);)
                } else {
                    quote!(req_params.set_indexed(#wire, Some(#ident));)
                }
            } else {
                quote!(req_params.set(#wire, #ident);)
            });
            arg_docs.push(format!(
                "* `{}` - `{}`{}",
                ident,
                wire,
                param
                    .description
                    .as_deref()
                    .map(|d| format!(": {}", d.replace('\n', " ")))
                    .unwrap_or_default()
            ));
        }

        let path = self.path_expr(node);
        let params_decl = if sets.is_empty() {
            quote!(let req_params = Params::new();)
        } else {
            quote!(let mut req_params = Params::new();)
        };

        let mut doc_text = method.comment.clone().unwrap_or_default();
        if !doc_text.is_empty() {
            doc_text.push_str("\n\n");
        }
        doc_text.push_str(&format!("`{} {}`", method.verb, node.resource_path));
        if method.return_kind != ReturnKind::None {
            doc_text.push_str(&format!("\n\nReturns: {}.", method.return_kind.as_str()));
        }
        if !arg_docs.is_empty() {
            doc_text.push_str("\n\n# Arguments\n\n");
            doc_text.push_str(&arg_docs.join("\n"));
        }
        let doc = doc_lines(&doc_text);

        match method.return_kind {
            ReturnKind::None => quote! {
                #(#doc)*
                pub fn #fn_name(&self #(, #args)*) -> Result<(), ClientError> {
                    #params_decl
                    #(#sets)*
                    self.client.execute(#verb, #path, req_params)?;
                    Ok(())
                }
            },
            _ => {
                self.imports.insert("ApiResult");
                quote! {
                    #(#doc)*
                    pub fn #fn_name(&self #(, #args)*) -> Result<ApiResult, ClientError> {
                        #params_decl
                        #(#sets)*
                        self.client.execute(#verb, #path, req_params)
                    }
                }
            }
        }
    }

    fn path_expr(&mut self, node: &ResourceNode) -> TokenStream {
        let mut template = String::new();
        let mut values = Vec::new();
        let mut keys = node.key_chain.iter();
        for segment in node.resource_path.split('/').filter(|s| !s.is_empty()) {
            template.push('/');
            if segment.starts_with('{') {
                template.push_str("{}");
                if let Some(key) = keys.next() {
                    values.push(self.key_ident(key));
                }
            } else {
                template.push_str(segment);
            }
        }

        if values.is_empty() {
            quote!(#template)
        } else {
            self.imports.insert("encode_segment");
            quote!(&format!(#template #(, encode_segment(&self.#values))*))
        }
    }
}

fn param_signature(ident: &Ident, param: &ParameterDescriptor) -> TokenStream {
    let ty = if param.is_indexed_family {
        quote!(&::std::collections::BTreeMap<u32, String>)
    } else {
        match param.param_type {
            ParamType::Bool => quote!(bool),
            ParamType::Int => quote!(i64),
            ParamType::String => quote!(&str),
        }
    };
    if param.optional {
        quote!(#ident: Option<#ty>)
    } else {
        quote!(#ident: #ty)
    }
}

fn doc_lines(text: &str) -> Vec<TokenStream> {
    text.lines()
        .map(|line| {
            let line = if line.is_empty() {
                String::new()
            } else {
                format!(" {}", line.trim_end())
            };
            quote!(#[doc = #line])
        })
        .collect()
}
