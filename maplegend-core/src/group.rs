//! Visibility propagation through groups and visibility sets.
//!
//! Changes travel two ways. A child whose visibility changed asks its
//! parent to reconcile ([`LegendTree::check_visibility`]), which keeps
//! walking up to the root. An explicit toggle on a container cascades down
//! to its children; calls made during the cascade never walk back up, the
//! container reconciles its own parent once at the end.

use crate::error::{LegendError, Result};
use crate::node::NodeId;
use crate::tree::LegendTree;

impl LegendTree {
    /// Set a node's visibility (or flip it when `visible` is `None`) and
    /// propagate the change to its ancestors.
    pub fn toggle_visibility(
        &mut self,
        id: NodeId,
        visible: Option<bool>,
    ) -> Result<()> {
        self.get(id)?;
        self.toggle(id, visible, true);
        Ok(())
    }

    /// Same as [`LegendTree::toggle_visibility`] but leaves ancestors alone.
    pub fn toggle_visibility_detached(
        &mut self,
        id: NodeId,
        visible: Option<bool>,
    ) -> Result<()> {
        self.get(id)?;
        self.toggle(id, visible, false);
        Ok(())
    }

    /// Reconcile `group` after the visibility of its direct child `changed`
    /// changed behind the tree's back.
    pub fn check_visibility(
        &mut self,
        group: NodeId,
        changed: NodeId,
    ) -> Result<()> {
        let parent = self.expect_group(group)?;
        let child = self.get(changed)?;
        if child.parent != Some(group) {
            return Err(LegendError::NotAChild {
                parent: parent.id.clone(),
                child: child.id.clone(),
            });
        }
        self.reconcile_group(group, changed);
        Ok(())
    }

    pub(crate) fn toggle(
        &mut self,
        id: NodeId,
        visible: Option<bool>,
        update_parent: bool,
    ) {
        let node = &self.nodes[id.0];
        if node.as_entry().is_some() {
            self.toggle_entry(id, visible, update_parent);
        } else if node.is_container() {
            self.toggle_group(id, visible, update_parent);
        }
    }

    /// Bottom-up pass: recompute `id` from its children, then its parent.
    pub(crate) fn reconcile_group(&mut self, id: NodeId, changed: NodeId) {
        let before = self.group_state(id).visibility;

        if self.is_set(id) {
            if self.is_visible(changed) {
                self.force_exclusive(id, changed);
            }
            let visible = self.visible_children_of(id);
            let set = self.group_state_mut(id);
            set.visibility = !visible.is_empty();
            set.last_visible = visible.first().copied().or(Some(changed));
        } else {
            let visible = self.visible_children_of(id);
            let group = self.group_state_mut(id);
            group.visibility = !visible.is_empty();
            group.visible_children = visible;
        }

        if self.group_state(id).visibility != before {
            self.bump(id);
        }

        if let Some(parent) = self.nodes[id.0].parent {
            self.reconcile_group(parent, id);
        }
    }

    /// Hide every sibling of `shown`. If one of them cannot be hidden,
    /// `shown` gives way instead.
    fn force_exclusive(&mut self, set: NodeId, shown: NodeId) {
        let others: Vec<NodeId> = self.nodes[set.0]
            .children
            .iter()
            .copied()
            .filter(|child| *child != shown)
            .collect();
        for child in &others {
            if self.is_visible(*child) {
                self.toggle(*child, Some(false), false);
            }
        }

        if others.iter().any(|child| self.is_visible(*child)) {
            self.toggle(shown, Some(false), false);
        }
    }

    /// Top-down pass: switch a container and cascade to its children.
    ///
    /// Children that ignore the cascade (no visibility control, still
    /// loading) keep the container in the state they leave it in.
    pub(crate) fn toggle_group(
        &mut self,
        id: NodeId,
        visible: Option<bool>,
        update_parent: bool,
    ) {
        let current = self.group_state(id).visibility;
        let next = visible.unwrap_or(!current);
        if next == current {
            return;
        }

        let children = self.nodes[id.0].children.clone();
        let is_set = self.is_set(id);
        if is_set {
            if next {
                let target = self
                    .group_state(id)
                    .last_visible
                    .or_else(|| children.first().copied());
                if let Some(child) = target {
                    self.toggle(child, Some(true), false);
                }
            } else if let Some(child) =
                children.iter().copied().find(|child| self.is_visible(*child))
            {
                self.toggle(child, Some(false), false);
                self.group_state_mut(id).last_visible = Some(child);
            }
        } else if next {
            let cached = self.group_state(id).visible_children.clone();
            let targets = if cached.is_empty() { children } else { cached };
            for child in targets {
                self.toggle(child, Some(true), false);
            }
        } else {
            for child in children {
                self.toggle(child, Some(false), false);
            }
        }

        let visible = self.visible_children_of(id);
        let first = visible.first().copied();
        let group = self.group_state_mut(id);
        group.visibility = first.is_some();
        if let Some(first) = first {
            if is_set {
                group.last_visible = Some(first);
            } else {
                group.visible_children = visible;
            }
        }
        if group.visibility == current {
            return;
        }

        self.bump(id);

        if update_parent {
            if let Some(parent) = self.nodes[id.0].parent {
                self.reconcile_group(parent, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::LegendError;
    use crate::layer::LayerResource;
    use crate::memory::MemoryLayer;
    use crate::test_support::{build_initialized, shared_layers};

    #[test]
    fn given_group_when_last_child_hidden_then_group_turns_off() {
        let layers = shared_layers(&[("a", true), ("b", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [
                    { "layerId": "a" }, { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let a = tree.find("a").expect("a");

        tree.toggle_visibility(a, Some(false)).expect("toggle");

        assert_eq!(tree.visibility(g), Some(false));
        assert_eq!(tree.visibility(tree.root()), Some(false));
        let group = tree.node(g).and_then(|node| node.as_group()).expect("g");
        assert!(group.visible_children().is_empty());
    }

    #[test]
    fn given_hidden_group_when_child_shown_then_ancestors_turn_on() {
        let layers = shared_layers(&[("a", false), ("b", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "outer", "children": [
                    { "layerId": "inner", "children": [
                        { "layerId": "a" }, { "layerId": "b" }
                    ]}
                ]}]
            }),
            &layers,
        );
        let b = tree.find("b").expect("b");
        let inner = tree.find("inner").expect("inner");
        let outer = tree.find("outer").expect("outer");
        assert_eq!(tree.visibility(outer), Some(false));

        tree.toggle_visibility(b, Some(true)).expect("toggle");

        assert_eq!(tree.visibility(inner), Some(true));
        assert_eq!(tree.visibility(outer), Some(true));
        assert_eq!(tree.visibility(tree.root()), Some(true));
        let group =
            tree.node(inner).and_then(|node| node.as_group()).expect("inner");
        assert_eq!(group.visible_children(), &[b]);
    }

    #[test]
    fn given_group_toggled_off_and_on_then_visible_subset_is_restored() {
        let layers = shared_layers(&[("a", true), ("b", false), ("c", true)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [
                    { "layerId": "a" }, { "layerId": "b" }, { "layerId": "c" }
                ]}]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");

        tree.toggle_visibility(g, Some(false)).expect("off");
        assert!(layers.iter().all(|layer| !layer.borrow().visibility()));

        tree.toggle_visibility(g, Some(true)).expect("on");
        let flags: Vec<bool> = layers
            .iter()
            .map(|layer| layer.borrow().visibility())
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn given_group_with_no_remembered_children_when_turned_on_then_all_show() {
        let layers = shared_layers(&[("a", true), ("b", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [
                    { "layerId": "a" }, { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let a = tree.find("a").expect("a");

        tree.toggle_visibility(a, Some(false)).expect("hide last child");
        tree.toggle_visibility(g, Some(true)).expect("on");

        assert!(layers.iter().all(|layer| layer.borrow().visibility()));
    }

    #[test]
    fn given_set_when_child_shown_then_previous_child_hides() {
        let layers = shared_layers(&[("a", true), ("b", false), ("c", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "s", "exclusiveVisibility": [
                    { "layerId": "a" }, { "layerId": "b" }, { "layerId": "c" }
                ]}]
            }),
            &layers,
        );
        let s = tree.find("s").expect("s");
        let a = tree.find("a").expect("a");
        let c = tree.find("c").expect("c");

        tree.toggle_visibility(c, Some(true)).expect("toggle");

        assert!(!tree.is_visible(a));
        assert!(tree.is_visible(c));
        assert_eq!(tree.visibility(s), Some(true));
        let set = tree.node(s).and_then(|node| node.as_group()).expect("s");
        assert_eq!(set.last_visible(), Some(c));
    }

    #[test]
    fn given_set_toggled_off_and_on_then_last_child_is_restored() {
        let layers = shared_layers(&[("a", false), ("b", true)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "s", "exclusiveVisibility": [
                    { "layerId": "a" }, { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let s = tree.find("s").expect("s");
        let a = tree.find("a").expect("a");
        let b = tree.find("b").expect("b");

        tree.toggle_visibility(s, None).expect("off");
        assert!(!tree.is_visible(b));
        assert_eq!(tree.visibility(tree.root()), Some(false));

        tree.toggle_visibility(s, None).expect("on");
        assert!(tree.is_visible(b));
        assert!(!tree.is_visible(a));
        assert_eq!(tree.visibility(tree.root()), Some(true));
    }

    #[test]
    fn given_fresh_set_without_visible_child_when_turned_on_then_first_shows()
    {
        let layers = shared_layers(&[("a", false), ("b", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "s", "exclusiveVisibility": [
                    { "layerId": "a" }, { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let s = tree.find("s").expect("s");
        let a = tree.find("a").expect("a");

        tree.toggle_visibility(s, Some(true)).expect("on");

        assert!(tree.is_visible(a));
        assert_eq!(tree.visibility(tree.root()), Some(true));
    }

    #[test]
    fn given_container_at_current_value_when_toggled_then_marker_is_unchanged()
    {
        let layers = shared_layers(&[("a", true)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [{ "layerId": "a" }] }]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let before = tree.change_marker(g);

        tree.toggle_visibility(g, Some(true)).expect("toggle");

        assert_eq!(tree.change_marker(g), before);
    }

    #[test]
    fn given_detached_toggle_when_child_hidden_then_parent_is_not_reconciled() {
        let layers = shared_layers(&[("a", true)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [{ "layerId": "a" }] }]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let a = tree.find("a").expect("a");

        tree.toggle_visibility_detached(a, Some(false)).expect("toggle");
        assert_eq!(tree.visibility(g), Some(true));

        tree.check_visibility(g, a).expect("reconcile");
        assert_eq!(tree.visibility(g), Some(false));
    }

    #[test]
    fn given_non_child_when_check_visibility_called_then_precondition_fails() {
        let layers = vec![MemoryLayer::new("a").into_shared()];
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [
                    { "layerId": "g", "children": [] },
                    { "layerId": "a" }
                ]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let a = tree.find("a").expect("a");

        assert!(matches!(
            tree.check_visibility(g, a),
            Err(LegendError::NotAChild { .. })
        ));
        assert!(matches!(
            tree.check_visibility(a, g),
            Err(LegendError::NotAGroup { .. })
        ));
    }

    #[test]
    fn given_child_without_visibility_control_when_group_hidden_then_group_stays_on()
     {
        let layers = shared_layers(&[("a", true), ("b", true)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [
                    { "layerId": "a", "controls": ["metadata"] },
                    { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        let a = tree.find("a").expect("a");
        let before = tree.change_marker(g);

        tree.toggle_visibility(g, Some(false)).expect("toggle");

        assert!(layers[0].borrow().visibility());
        assert!(!layers[1].borrow().visibility());
        assert_eq!(tree.visibility(g), Some(true));
        assert_eq!(tree.visibility(tree.root()), Some(true));
        assert_eq!(tree.change_marker(g), before);
        let group = tree.node(g).and_then(|node| node.as_group()).expect("g");
        assert_eq!(group.visible_children(), &[a]);
    }

    #[test]
    fn given_loading_child_when_group_hidden_then_group_follows_the_layer() {
        let layers = vec![MemoryLayer::pending("a").into_shared()];
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "g", "children": [{ "layerId": "a" }] }]
            }),
            &layers,
        );
        let g = tree.find("g").expect("g");
        assert_eq!(tree.visibility(g), Some(true));

        tree.toggle_visibility(g, Some(false)).expect("toggle");

        assert!(layers[0].borrow().visibility());
        assert_eq!(tree.visibility(g), Some(true));
    }

    #[test]
    fn given_set_sibling_without_visibility_control_when_other_shown_then_it_gives_way()
     {
        let layers = shared_layers(&[("a", true), ("b", false)]);
        let mut tree = build_initialized(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "s", "exclusiveVisibility": [
                    { "layerId": "a", "controls": ["metadata"] },
                    { "layerId": "b" }
                ]}]
            }),
            &layers,
        );
        let s = tree.find("s").expect("s");
        let a = tree.find("a").expect("a");
        let b = tree.find("b").expect("b");

        tree.toggle_visibility(b, Some(true)).expect("toggle");

        assert!(tree.is_visible(a));
        assert!(!tree.is_visible(b));
        let set = tree.node(s).and_then(|node| node.as_group()).expect("s");
        assert!(set.visibility());
        assert_eq!(set.last_visible(), Some(a));
    }
}
