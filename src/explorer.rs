use serde_json::Value;

use crate::codegen::ordered_parameters;
use crate::method::{MethodDescriptor, ReturnKind, Verb};
use crate::param::ParameterDescriptor;
use crate::render::{Renderer, format_value};
use crate::tree::{NodeId, ResourceNode, ResourceTree};

const NAME_GAP: &str = "        ";

pub fn child_flags(node: &ResourceNode) -> String {
    format!(
        "{}r{}",
        if node.has_children() { 'D' } else { '-' },
        if node.has_method(Verb::Post) { 'c' } else { '-' }
    )
}

/// One `Dr-        name` line per child resource, schema order.
pub fn list_children(tree: &ResourceTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .map(|(_, child)| format!("{}{NAME_GAP}{}", child_flags(child), child.name))
        .collect()
}

/// Lists concrete children from a GET result: each element's link-key field
/// names one instance of the `{placeholder}` child. Falls back to the schema
/// listing when the node has no such link.
pub fn list_values(tree: &ResourceTree, id: NodeId, result: &Value) -> Vec<String> {
    let node = tree.node(id);
    let link_key = node
        .method(Verb::Get)
        .map(|m| m.return_link_key.as_str())
        .filter(|key| !key.is_empty());
    let (Some(link_key), Some(indexed), Some(items)) =
        (link_key, tree.indexed_child(id), result.as_array())
    else {
        return list_children(tree, id);
    };

    let flags = child_flags(tree.node(indexed));
    let mut lines: Vec<String> = items
        .iter()
        .filter_map(|item| match item.get(link_key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .map(|name| format!("{flags}{NAME_GAP}{name}"))
        .collect();

    // literal siblings of the placeholder stay reachable
    lines.extend(
        tree.children(id)
            .filter(|(_, child)| !child.is_indexed)
            .map(|(_, child)| format!("{}{NAME_GAP}{}", child_flags(child), child.name)),
    );
    lines
}

/// Replaces returned fields that carry a renderer hint with their
/// human-readable text. Unhinted fields and unknown shapes pass through.
pub fn render_result(method: &MethodDescriptor, result: &Value) -> Value {
    let hinted: Vec<&ParameterDescriptor> = method
        .return_parameters
        .iter()
        .filter(|p| p.renderer != Renderer::None)
        .collect();
    if hinted.is_empty() {
        return result.clone();
    }

    let render_object = |item: &Value| {
        let mut item = item.clone();
        if let Value::Object(map) = &mut item {
            for param in &hinted {
                if let Some(field) = map.get_mut(&param.wire_name) {
                    *field = Value::String(format_value(&param.renderer, field));
                }
            }
        }
        item
    };

    match (method.return_kind, result) {
        (ReturnKind::Array, Value::Array(items)) => Value::Array(items.iter().map(render_object).collect()),
        (ReturnKind::Object, Value::Object(_)) => render_object(result),
        _ => result.clone(),
    }
}

fn argument_hint(param: &ParameterDescriptor) -> String {
    if !param.enum_values.is_empty() {
        return format!("{}:<{}>", param.wire_name, param.enum_values.join("|"));
    }
    match &param.type_text {
        Some(text) if text.starts_with('<') => format!("{}:{}", param.wire_name, text),
        Some(text) => format!("{}:<{}>", param.wire_name, text),
        None => format!("{}:<{}>", param.wire_name, param.param_type.as_str()),
    }
}

/// `VERB /path name:<type>... [OPTIONS]`; `None` when the verb is not
/// exposed on the node.
pub fn usage(tree: &ResourceTree, id: NodeId, verb: Verb, verbose: bool) -> Option<String> {
    let node = tree.node(id);
    let method = node.method(verb)?;
    let params = ordered_parameters(method, &node.key_chain);

    let mut line = format!("{} {}", verb, node.resource_path);
    for param in params.iter().filter(|p| !p.optional) {
        line.push(' ');
        line.push_str(&argument_hint(param));
    }
    if params.iter().any(|p| p.optional) {
        line.push_str(" [OPTIONS]");
    }

    if !verbose {
        return Some(line);
    }

    let mut out = vec![line];
    describe_method(method, &params, &mut out);
    Some(out.join("\n"))
}

/// Usage for every verb the node exposes, in schema order.
pub fn usage_all(tree: &ResourceTree, id: NodeId, verbose: bool) -> Vec<String> {
    tree.node(id)
        .methods
        .iter()
        .filter_map(|m| usage(tree, id, m.verb, verbose))
        .collect()
}

fn describe_method(method: &MethodDescriptor, params: &[&ParameterDescriptor], out: &mut Vec<String>) {
    if let Some(comment) = &method.comment {
        out.push(String::new());
        out.extend(comment.lines().map(|l| format!("  {l}")));
    }

    if !params.is_empty() {
        out.push(String::new());
        out.push("Parameters:".to_string());
        for param in params {
            describe_parameter(param, "  ", out);
        }
    }

    if method.return_kind != ReturnKind::None {
        out.push(String::new());
        out.push(format!("Returns: {}", method.return_kind.as_str()));
        for field in &method.return_parameters {
            describe_parameter(field, "  ", out);
        }
    }
}

fn describe_parameter(param: &ParameterDescriptor, indent: &str, out: &mut Vec<String>) {
    let mut line = format!("{indent}{:<24} {}", param.wire_name, param.display_type());
    if param.optional {
        line.push_str(" (optional)");
    }
    match (param.minimum, param.maximum) {
        (Some(min), Some(max)) => line.push_str(&format!(" [{min} - {max}]")),
        (Some(min), None) => line.push_str(&format!(" [>= {min}]")),
        (None, Some(max)) => line.push_str(&format!(" [<= {max}]")),
        (None, None) => {}
    }
    if let Some(default) = &param.default {
        line.push_str(&format!(" default={default}"));
    }
    out.push(line);

    if !param.enum_values.is_empty() {
        out.push(format!("{indent}    one of: {}", param.enum_values.join(", ")));
    }
    if let Some(description) = &param.description {
        out.extend(description.lines().map(|l| format!("{indent}    {l}")));
    }
    if !param.nested_formats.is_empty() {
        out.push(format!("{indent}    format:"));
        let nested_indent = format!("{indent}      ");
        for nested in &param.nested_formats {
            describe_parameter(nested, &nested_indent, out);
        }
    }
}
