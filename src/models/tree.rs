use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NodeMark {
    #[default]
    Resolved,
    /// The id already appears on this node's ancestor path.
    Cyclic,
    /// Descent stopped at the depth limit.
    DepthLimited,
    /// No catalog data for this id.
    Unresolved,
}

/// Display projection of a dependency closure. The same id reached through
/// two paths yields two separate nodes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub version: String,
    pub mark: NodeMark,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, mark: NodeMark) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: String::new(),
            mark,
            children: Vec::new(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.mark, NodeMark::Cyclic | NodeMark::DepthLimited)
    }

    /// Total number of nodes, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Number of levels, a lone node being depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// All nodes with the given id, in pre-order.
    pub fn find_all<'a>(&'a self, id: &str) -> Vec<&'a TreeNode> {
        let mut out = Vec::new();
        self.collect_matching(id, &mut out);
        out
    }

    fn collect_matching<'a>(&'a self, id: &str, out: &mut Vec<&'a TreeNode>) {
        if self.id == id {
            out.push(self);
        }
        for child in &self.children {
            child.collect_matching(id, out);
        }
    }

    /// Indented outline, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, level: usize, out: &mut String) {
        out.push_str(&"  ".repeat(level));
        out.push_str(&self.name);
        if !self.version.is_empty() {
            out.push_str(&format!(" v{}", self.version));
        }
        match self.mark {
            NodeMark::Resolved => {}
            NodeMark::Cyclic => out.push_str(" (cyclic)"),
            NodeMark::DepthLimited => out.push_str(" (truncated)"),
            NodeMark::Unresolved => out.push_str(" (unresolved)"),
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(level + 1, out);
        }
    }
}
