//! One-time repair of the default visibility declared in config.
//!
//! Config can declare states that break the tree's rules: two visible
//! children under one visibility set, or a visible child below a hidden
//! ancestor. The pass walks the tree root first and hides offenders, then
//! recomputes every container's aggregate from the repaired leaves.
//!
//! Inside a set the first visible child in declaration order wins; later
//! visible siblings are hidden. Conflicting config is overridden silently.

use crate::error::Result;
use crate::node::NodeId;
use crate::tree::LegendTree;

impl LegendTree {
    /// Run the initialization pass over the whole tree.
    ///
    /// Call once, right after [`LegendTree::build`].
    pub fn initialize(&mut self) {
        for id in self.pre_order() {
            self.apply_visibility_rules(id);
        }
        self.sync_aggregates(self.root);
    }

    /// Hide `id` if its parent is hidden, or if it sits in a visibility set
    /// behind a sibling that already shows something, then repeat for its
    /// descendants. Never walks upwards.
    pub fn check_visibility_rules(&mut self, id: NodeId) -> Result<()> {
        self.get(id)?;
        for node in self.pre_order_from(id) {
            self.apply_visibility_rules(node);
        }
        Ok(())
    }

    fn apply_visibility_rules(&mut self, id: NodeId) {
        if !self.is_visible(id) {
            return;
        }
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };

        // Earlier siblings were already repaired; their container flags
        // may still be config defaults, so look at what they really show.
        let hide = if !self.is_visible(parent) {
            true
        } else if self.is_set(parent) {
            self.nodes[parent.0]
                .children
                .iter()
                .take_while(|sibling| **sibling != id)
                .any(|sibling| self.shows_anything(*sibling))
        } else {
            false
        };

        if hide {
            self.force_hidden(id);
        }
    }

    /// Switch `id` off for the pass. Containers only drop their own flag;
    /// their descendants follow when the pass reaches them, whatever their
    /// controls say.
    fn force_hidden(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        if node.as_entry().is_some() {
            self.hide_entry(id);
            return;
        }
        if !node.is_container() {
            return;
        }

        if self.is_set(id) {
            let shown = self.nodes[id.0]
                .children
                .iter()
                .copied()
                .find(|child| self.shows_anything(*child));
            if shown.is_some() {
                self.group_state_mut(id).last_visible = shown;
            }
        }
        self.group_state_mut(id).visibility = false;
        self.bump(id);
    }

    fn sync_aggregates(&mut self, id: NodeId) {
        if !self.nodes[id.0].is_container() {
            return;
        }

        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.sync_aggregates(child);
        }

        let visible = self.visible_children_of(id);
        let is_set = self.is_set(id);
        let state = self.group_state_mut(id);
        let before = state.visibility;
        state.visibility = !visible.is_empty();
        if is_set {
            if let Some(first) = visible.first() {
                state.last_visible = Some(*first);
            }
        } else {
            state.visible_children = visible;
        }

        if state.visibility != before {
            self.bump(id);
        }
    }
}
