//! Recursive traversal toolkit.
//!
//! Every tree walk the engine performs lives here so all operations agree
//! on one traversal order: depth-first, children in insertion order, first
//! match wins. Callers guarantee global id uniqueness, so "first match" is
//! simply "the match".

use vtree_core::TreeNode;

/// Find a node by id anywhere in the forest.
#[must_use]
pub fn find<'a>(nodes: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find(node.children(), id) {
            return Some(found);
        }
    }
    None
}

/// Find a node by id anywhere in the forest, mutably.
pub fn find_mut<'a>(nodes: &'a mut [TreeNode], id: &str) -> Option<&'a mut TreeNode> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_mut(node.children_mut(), id) {
            return Some(found);
        }
    }
    None
}

/// The root-to-target id path for a node, inclusive of the target.
///
/// Unique because the forest is a tree. `None` when the id is absent.
#[must_use]
pub fn path_to(nodes: &[TreeNode], id: &str) -> Option<Vec<String>> {
    fn descend(nodes: &[TreeNode], id: &str, path: &mut Vec<String>) -> bool {
        for node in nodes {
            path.push(node.id().to_string());
            if node.id() == id || descend(node.children(), id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    descend(nodes, id, &mut path).then_some(path)
}

/// Remove a subtree by value, reporting its former parent id.
///
/// Returns `(subtree, parent_id)` where `parent_id` is `None` when the node
/// was a root. One descent locates the node and its parent together. `None`
/// when the id is absent (the forest is untouched).
pub fn detach(nodes: &mut Vec<TreeNode>, id: &str) -> Option<(TreeNode, Option<String>)> {
    fn detach_under(parent: &mut TreeNode, id: &str) -> Option<(TreeNode, Option<String>)> {
        if let Some(pos) = parent.children().iter().position(|n| n.id() == id) {
            let node = parent.children_mut().remove(pos);
            return Some((node, Some(parent.id().to_string())));
        }
        for child in parent.children_mut() {
            if let Some(found) = detach_under(child, id) {
                return Some(found);
            }
        }
        None
    }

    if let Some(pos) = nodes.iter().position(|n| n.id() == id) {
        return Some((nodes.remove(pos), None));
    }
    for node in nodes.iter_mut() {
        if let Some(found) = detach_under(node, id) {
            return Some(found);
        }
    }
    None
}

/// Pre-order visitor over every node in the forest.
pub fn visit<F: FnMut(&TreeNode)>(nodes: &[TreeNode], f: &mut F) {
    for node in nodes {
        f(node);
        visit(node.children(), f);
    }
}
