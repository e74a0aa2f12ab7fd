//! Resource tree built from the API descriptor.

use serde::Serialize;
use serde::ser::{SerializeSeq, SerializeStruct, Serializer};
use serde_json::Value;

use crate::error::BuildError;
use crate::method::{MethodDescriptor, Verb};
use crate::schema::{SchemaValue, parse_payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub name: String,
    pub index_name: String,
    pub is_indexed: bool,
    pub resource_path: String,
    pub key_chain: Vec<String>,
    pub children: Vec<NodeId>,
    pub methods: Vec<MethodDescriptor>,
    pub parent: Option<NodeId>,
}

impl ResourceNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn method(&self, verb: Verb) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.verb == verb)
    }

    pub fn has_method(&self, verb: Verb) -> bool {
        self.method(verb).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
}

const ROOT: NodeId = NodeId(0);

impl ResourceTree {
    pub fn from_text(text: &str) -> Result<Self, BuildError> {
        let value = parse_payload(text)?;
        Self::build(&value)
    }

    pub fn build(schema: &Value) -> Result<Self, BuildError> {
        let mut tree = Self {
            nodes: vec![ResourceNode {
                name: String::new(),
                index_name: String::new(),
                is_indexed: false,
                resource_path: String::new(),
                key_chain: Vec::new(),
                children: Vec::new(),
                methods: Vec::new(),
                parent: None,
            }],
        };

        let root = SchemaValue::root(schema);
        for entry in root.items()? {
            tree.add_entry(&entry, ROOT)?;
        }

        tracing::debug!(
            nodes = tree.nodes.len() - 1,
            methods = tree.nodes.iter().map(|n| n.methods.len()).sum::<usize>(),
            "built resource tree"
        );
        Ok(tree)
    }

    fn add_entry(&mut self, entry: &SchemaValue<'_>, parent: NodeId) -> Result<NodeId, BuildError> {
        let parent_path = self.nodes[parent.0].resource_path.clone();

        let text = match entry.opt_str("text") {
            Some(text) => text,
            None => {
                let path = entry
                    .opt_str("path")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{parent_path}/<{}>", entry.path()));
                return Err(BuildError::MissingField { path, field: "text" });
            }
        };
        let path = entry.opt_str("path").ok_or_else(|| BuildError::MissingField {
            path: format!("{parent_path}/{text}"),
            field: "path",
        })?;

        if path != format!("{parent_path}/{text}") {
            return Err(BuildError::PathMismatch {
                path: path.to_string(),
                parent: parent_path,
                segment: text.to_string(),
            });
        }

        let is_indexed = text.starts_with('{');
        if is_indexed && let Some(existing) = self.indexed_child(parent) {
            return Err(BuildError::DuplicateIndexedChild {
                parent: parent_path,
                existing: self.nodes[existing.0].name.clone(),
                segment: text.to_string(),
            });
        }
        let index_name = text.replace(['{', '}'], "");
        let mut key_chain = self.nodes[parent.0].key_chain.clone();
        if is_indexed {
            key_chain.push(index_name.clone());
        }

        let mut methods = Vec::new();
        if let Some(info) = entry.get("info") {
            for (verb_text, method) in info.entries()? {
                let Some(verb) = Verb::parse(verb_text) else {
                    tracing::warn!(path, verb = verb_text, "skipping unsupported http method");
                    continue;
                };
                methods.push(MethodDescriptor::from_schema(verb, &method)?);
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ResourceNode {
            name: text.to_string(),
            index_name,
            is_indexed,
            resource_path: path.to_string(),
            key_chain,
            children: Vec::new(),
            methods,
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);

        if let Some(children) = entry.get("children") {
            for child in children.items()? {
                self.add_entry(&child, id)?;
            }
        }
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &ResourceNode)> {
        self.nodes[id.0]
            .children
            .iter()
            .map(move |child| (*child, &self.nodes[child.0]))
    }

    /// The single `{placeholder}` child, if any.
    pub fn indexed_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .find(|(_, node)| node.is_indexed)
            .map(|(child, _)| child)
    }

    pub fn literal_child(&self, id: NodeId, segment: &str) -> Option<NodeId> {
        self.children(id)
            .find(|(_, node)| !node.is_indexed && node.name == segment)
            .map(|(child, _)| child)
    }

    /// Every resource node (root excluded) in depth-first schema order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct NodeView<'a> {
    tree: &'a ResourceTree,
    id: NodeId,
}

struct ChildrenView<'a> {
    tree: &'a ResourceTree,
    id: NodeId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.node(self.id);
        let mut state = serializer.serialize_struct("ResourceNode", 6)?;
        state.serialize_field("name", &node.name)?;
        state.serialize_field("path", &node.resource_path)?;
        state.serialize_field("indexed", &node.is_indexed)?;
        state.serialize_field("key_chain", &node.key_chain)?;
        state.serialize_field("methods", &node.methods)?;
        state.serialize_field(
            "children",
            &ChildrenView {
                tree: self.tree,
                id: self.id,
            },
        )?;
        state.end()
    }
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children = &self.tree.node(self.id).children;
        let mut seq = serializer.serialize_seq(Some(children.len()))?;
        for child in children {
            seq.serialize_element(&NodeView {
                tree: self.tree,
                id: *child,
            })?;
        }
        seq.end()
    }
}

impl Serialize for ResourceTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChildrenView { tree: self, id: ROOT }.serialize(serializer)
    }
}
