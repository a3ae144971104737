use std::collections::{HashMap, VecDeque};

use crate::controls::Controls;
use crate::diagnostics::Diagnostic;
use crate::error::{LegendError, Result};
use crate::layer::Symbology;
use crate::node::{
    ChangeMarker, EntryNode, GroupNode, LegendNode, NodeId, NodeVariant,
};

/// Legend tree stored as an arena of nodes.
///
/// Children are owned top-down through index lists; the parent link is a
/// plain index used only for upward walks. Every mutating operation takes
/// `&mut self`, so one toggle-and-propagate pass always runs to completion
/// before another can start.
#[derive(Debug)]
pub struct LegendTree {
    pub(crate) nodes: Vec<LegendNode>,
    pub(crate) root: NodeId,
    pub(crate) index: HashMap<String, NodeId>,
    pub(crate) revision: u64,
    pub(crate) diagnostics: VecDeque<Diagnostic>,
}

impl LegendTree {
    pub(crate) fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            index: HashMap::new(),
            revision: 0,
            diagnostics: VecDeque::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&LegendNode> {
        self.nodes.get(id.0)
    }

    /// Look a node up by its config id.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn find_node(&self, id: &str) -> Option<&LegendNode> {
        self.find(id).and_then(|id| self.node(id))
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&LegendNode> {
        self.nodes.get(id.0).ok_or(LegendError::UnknownNode(id))
    }

    /// Own visibility of a node, see [`LegendNode::visibility`].
    pub fn visibility(&self, id: NodeId) -> Option<bool> {
        self.node(id).and_then(LegendNode::visibility)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(LegendNode::is_visible)
    }

    pub fn change_marker(&self, id: NodeId) -> Option<ChangeMarker> {
        self.node(id).map(LegendNode::change_marker)
    }

    /// Current symbology stack of an entry's layer.
    pub fn symbology(&self, id: NodeId) -> Vec<Symbology> {
        self.node(id)
            .and_then(LegendNode::as_entry)
            .and_then(|entry| entry.layer.as_ref())
            .map(|layer| layer.borrow().symbology().to_vec())
            .unwrap_or_default()
    }

    /// Node ids in pre-order, root first, children in declaration order.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_from(self.root)
    }

    pub(crate) fn pre_order_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.nodes.get(id.0).is_none() {
                continue;
            }
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Expand, collapse or flip a group or set.
    pub fn toggle_expanded(
        &mut self,
        id: NodeId,
        expanded: Option<bool>,
    ) -> Result<bool> {
        self.expect_group(id)?;
        let group = self.group_state_mut(id);
        let next = expanded.unwrap_or(!group.expanded);
        if next == group.expanded {
            return Ok(next);
        }
        group.expanded = next;
        self.bump(id);
        Ok(next)
    }

    /// Take every diagnostic recorded since the last drain.
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    /// Direct children of `id` that are currently visible.
    pub(crate) fn visible_children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.is_visible(*child))
            .collect()
    }

    /// Whether any layer under `id` is actually shown.
    ///
    /// Unlike [`LegendTree::is_visible`] this does not trust a container's
    /// own flag, which may still hold its config default.
    pub(crate) fn shows_anything(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        match &node.variant {
            NodeVariant::Entry(_) => node.is_visible(),
            NodeVariant::Group(group) | NodeVariant::Set(group) => {
                group.visibility
                    && node
                        .children
                        .iter()
                        .any(|child| self.shows_anything(*child))
            },
            NodeVariant::Info => false,
        }
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push_back(diagnostic);
    }

    pub(crate) fn bump(&mut self, id: NodeId) {
        self.revision += 1;
        self.nodes[id.0].change = ChangeMarker(self.revision);
    }

    pub(crate) fn has_control(&self, id: NodeId, control: Controls) -> bool {
        self.nodes[id.0].controls.contains(control)
    }

    pub(crate) fn expect_group(&self, id: NodeId) -> Result<&LegendNode> {
        let node = self.get(id)?;
        if !node.is_container() {
            return Err(LegendError::NotAGroup {
                id: node.id.clone(),
            });
        }
        Ok(node)
    }

    pub(crate) fn expect_entry(&self, id: NodeId) -> Result<&LegendNode> {
        let node = self.get(id)?;
        if node.as_entry().is_none() {
            return Err(LegendError::NotAnEntry {
                id: node.id.clone(),
            });
        }
        Ok(node)
    }

    pub(crate) fn is_set(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].variant, NodeVariant::Set(_))
    }

    pub(crate) fn group_state(&self, id: NodeId) -> &GroupNode {
        match &self.nodes[id.0].variant {
            NodeVariant::Group(group) | NodeVariant::Set(group) => group,
            _ => panic!("legend node {id} is not a group"),
        }
    }

    pub(crate) fn group_state_mut(&mut self, id: NodeId) -> &mut GroupNode {
        match &mut self.nodes[id.0].variant {
            NodeVariant::Group(group) | NodeVariant::Set(group) => group,
            _ => panic!("legend node {id} is not a group"),
        }
    }

    pub(crate) fn entry_state(&self, id: NodeId) -> &EntryNode {
        match &self.nodes[id.0].variant {
            NodeVariant::Entry(entry) => entry,
            _ => panic!("legend node {id} is not an entry"),
        }
    }

    pub(crate) fn entry_state_mut(&mut self, id: NodeId) -> &mut EntryNode {
        match &mut self.nodes[id.0].variant {
            NodeVariant::Entry(entry) => entry,
            _ => panic!("legend node {id} is not an entry"),
        }
    }
}
