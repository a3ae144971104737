use crate::node::{LegendNode, NodeId};
use crate::tree::LegendTree;

/// One renderable line of the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendRow {
    pub node: NodeId,
    /// Zero-based depth below the root.
    pub depth: usize,
}

impl LegendTree {
    /// Flatten the tree into the rows a renderer should draw.
    ///
    /// Rows come depth-first in declaration order. The root itself, hidden
    /// nodes (with their subtrees) and children of collapsed containers are
    /// left out.
    pub fn rows(&self) -> Vec<LegendRow> {
        let mut rows = Vec::new();
        if let Some(root) = self.node(self.root) {
            for child in root.children() {
                self.push_row(*child, 0, &mut rows);
            }
        }
        rows
    }

    fn push_row(&self, id: NodeId, depth: usize, rows: &mut Vec<LegendRow>) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.is_hidden() {
            return;
        }

        rows.push(LegendRow { node: id, depth });

        if is_open(node) {
            for child in node.children() {
                self.push_row(*child, depth + 1, rows);
            }
        }
    }
}

fn is_open(node: &LegendNode) -> bool {
    node.as_group().is_some_and(|group| group.expanded())
}
