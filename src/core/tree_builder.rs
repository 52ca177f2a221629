use crate::config::{DEFAULT_MAX_TREE_DEPTH, DEFAULT_MAX_TREE_NODES};
use crate::models::closure::ResolvedClosure;
use crate::models::tree::{NodeMark, TreeNode};

/// Projects `closure` into a tree rooted at `root_id`.
///
/// Only the current path is tracked, not a global visited set: a dependency
/// shared by two branches shows up under both. An id that reappears on its
/// own ancestor path becomes a [`NodeMark::Cyclic`] leaf, and nodes at
/// `max_depth` levels with further dependencies become
/// [`NodeMark::DepthLimited`] leaves.
pub fn build_tree(root_id: &str, closure: &ResolvedClosure, max_depth: Option<usize>) -> TreeNode {
    build_tree_bounded(root_id, closure, max_depth, DEFAULT_MAX_TREE_NODES)
}

/// Like [`build_tree`], but stops expanding once `max_nodes` nodes exist.
/// Stacked diamonds grow the tree exponentially with depth; past the budget
/// any node that still has dependencies becomes a [`NodeMark::DepthLimited`]
/// leaf.
pub fn build_tree_bounded(
    root_id: &str,
    closure: &ResolvedClosure,
    max_depth: Option<usize>,
    max_nodes: usize,
) -> TreeNode {
    let mut walk = Walk {
        closure,
        path: Vec::new(),
        max_depth: max_depth.unwrap_or(DEFAULT_MAX_TREE_DEPTH).max(1),
        remaining: max_nodes.max(1),
    };
    walk.descend(root_id, 1)
}

struct Walk<'a> {
    closure: &'a ResolvedClosure,
    path: Vec<&'a str>,
    max_depth: usize,
    /// Nodes left before expansion stops.
    remaining: usize,
}

impl<'a> Walk<'a> {
    fn descend(&mut self, id: &'a str, depth: usize) -> TreeNode {
        self.remaining = self.remaining.saturating_sub(1);

        let closure = self.closure;
        let Some(record) = closure.get(id) else {
            return TreeNode::leaf(id, id, NodeMark::Unresolved);
        };

        let mut node = TreeNode {
            id: record.id.clone(),
            name: record.display_name().to_string(),
            version: record.version.clone(),
            mark: NodeMark::Resolved,
            children: Vec::new(),
        };

        if self.path.contains(&id) {
            node.mark = NodeMark::Cyclic;
            return node;
        }
        if closure.is_unresolved(id) {
            node.mark = NodeMark::Unresolved;
            return node;
        }
        if record.dependency_ids.is_empty() {
            return node;
        }
        if depth >= self.max_depth || self.remaining == 0 {
            node.mark = NodeMark::DepthLimited;
            return node;
        }

        self.path.push(id);
        node.children = record
            .dependency_ids
            .iter()
            .map(|dep| self.descend(dep, depth + 1))
            .collect();
        self.path.pop();

        node
    }
}
