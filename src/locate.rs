use crate::tree::{NodeId, ResourceTree};

/// Resolves a slash-delimited path. Literal segments win; otherwise any text
/// stands in for the node's `{placeholder}` child. A miss is `None`.
pub fn locate(tree: &ResourceTree, path: &str) -> Option<NodeId> {
    let mut current = tree.root();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = tree
            .literal_child(current, segment)
            .or_else(|| tree.indexed_child(current))?;
    }
    Some(current)
}

/// Placeholder values bound while walking `path`, in key-chain order.
pub fn bind_keys(tree: &ResourceTree, path: &str) -> Option<Vec<(String, String)>> {
    let mut current = tree.root();
    let mut keys = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = match tree.literal_child(current, segment) {
            Some(child) => child,
            None => {
                let child = tree.indexed_child(current)?;
                keys.push((tree.node(child).index_name.clone(), segment.to_string()));
                child
            }
        };
    }
    Some(keys)
}
