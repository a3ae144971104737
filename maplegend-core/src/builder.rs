use std::rc::Rc;

use crate::config::NodeConfig;
use crate::diagnostics::Diagnostic;
use crate::error::{LegendError, Result};
use crate::layer::LayerHandle;
use crate::node::{
    ChangeMarker, EntryNode, GroupNode, LegendNode, NodeId, NodeKind,
    NodeVariant,
};
use crate::tree::LegendTree;

impl LegendTree {
    /// Build a legend tree from config, binding entries to `layers` by id.
    ///
    /// Entries whose layer is missing or not yet valid start out as
    /// placeholders. Readiness signals are registered but never awaited
    /// here; call [`LegendTree::initialize`] and then
    /// [`LegendTree::poll_bindings`] to finish the setup.
    pub fn build(config: &NodeConfig, layers: &[LayerHandle]) -> Result<Self> {
        let mut builder = TreeBuilder {
            tree: LegendTree::empty(),
            layers,
        };
        let root = builder.push(config, None)?;
        builder.tree.root = root;
        Ok(builder.tree)
    }

    /// Parse JSON config and build the tree from it.
    pub fn from_json(json: &str, layers: &[LayerHandle]) -> Result<Self> {
        let config = NodeConfig::from_json(json)?;
        Self::build(&config, layers)
    }
}

struct TreeBuilder<'a> {
    tree: LegendTree,
    layers: &'a [LayerHandle],
}

impl TreeBuilder<'_> {
    fn push(
        &mut self,
        config: &NodeConfig,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = NodeId(self.tree.nodes.len());

        let (key, variant) = match config.child_configs() {
            Some(children) => {
                let group = GroupNode {
                    expanded: config.expanded.unwrap_or(true),
                    visibility: config.visibility.unwrap_or(true),
                    ..GroupNode::default()
                };
                let variant = match children.kind {
                    NodeKind::Set => NodeVariant::Set(group),
                    _ => NodeVariant::Group(group),
                };
                (self.container_key(config, id, children.kind), variant)
            },
            None if config.node_type == Some(NodeKind::Info) => {
                let key = self.container_key(config, id, NodeKind::Info);
                (key, NodeVariant::Info)
            },
            None => {
                let (key, entry) = self.entry(config)?;
                (key, NodeVariant::Entry(entry))
            },
        };

        self.tree.nodes.push(LegendNode {
            id: key.clone(),
            name: config.name.clone().unwrap_or_default(),
            controls: config.resolved_controls(),
            hidden: config.hidden.unwrap_or(false),
            change: ChangeMarker::default(),
            raw_config: config.raw_value(),
            parent,
            children: Vec::new(),
            variant,
        });

        if self.tree.index.contains_key(&key) {
            self.tree.report(Diagnostic::DuplicateId { id: key });
        } else {
            self.tree.index.insert(key, id);
        }

        if let Some(children) = config.child_configs() {
            for child in children.children {
                let child = self.push(child, Some(id))?;
                self.tree.nodes[id.0].children.push(child);
            }
        }

        Ok(id)
    }

    fn container_key(
        &self,
        config: &NodeConfig,
        id: NodeId,
        kind: NodeKind,
    ) -> String {
        if !config.layer_id.is_empty() {
            return config.layer_id.clone();
        }
        let prefix = match kind {
            NodeKind::Set => "set",
            NodeKind::Info => "info",
            _ => "group",
        };
        format!("{prefix}-{}", id.0)
    }

    fn entry(&self, config: &NodeConfig) -> Result<(String, EntryNode)> {
        if config.layer_id.is_empty() {
            return Err(LegendError::InvalidConfig {
                id: config.name.clone().unwrap_or_default(),
                reason: String::from("layer entry has no layerId"),
            });
        }

        // Sublayer entries of one source would collide on the source id.
        let (key, layer_parent_id) = match config.entry_index {
            Some(index) => (
                format!("{}-{index}", config.layer_id),
                Some(config.layer_id.clone()),
            ),
            None => (config.layer_id.clone(), None),
        };

        let layer = self
            .layers
            .iter()
            .find(|layer| layer.borrow().id() == key)
            .map(Rc::clone);

        let mut pending = None;
        let mut placeholder = true;
        if let Some(layer) = &layer {
            let mut resource = layer.borrow_mut();
            if let Some(visible) = config.visibility {
                resource.set_visibility(visible);
            }
            placeholder = !resource.is_valid()
                || config.node_type == Some(NodeKind::Placeholder);
            pending = Some(resource.load_signal());
        } else {
            log::debug!("legend entry `{key}` has no matching layer yet");
        }

        let entry = EntryNode {
            layer,
            placeholder,
            layer_parent_id,
            entry_index: config.entry_index,
            display_symbology: config.symbology_expanded.unwrap_or(false),
            is_default: config.is_default,
            pending,
            ..EntryNode::default()
        };

        Ok((key, entry))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::NodeConfig;
    use crate::diagnostics::Diagnostic;
    use crate::error::LegendError;
    use crate::memory::MemoryLayer;
    use crate::node::NodeKind;
    use crate::test_support::{build, handles};
    use crate::tree::LegendTree;

    #[test]
    fn given_nested_config_when_built_then_kinds_and_order_follow_config() {
        let layers = vec![
            MemoryLayer::new("a").into_shared(),
            MemoryLayer::new("b").into_shared(),
        ];
        let tree = build(
            json!({
                "layerId": "root",
                "children": [
                    { "layerId": "a" },
                    { "layerId": "set", "exclusiveVisibility": [
                        { "layerId": "b" },
                        { "layerId": "note", "type": "InfoSection" }
                    ]}
                ]
            }),
            &layers,
        );

        let root = tree.node(tree.root()).expect("root");
        assert_eq!(root.kind(), NodeKind::Group);
        assert_eq!(root.parent(), None);

        let kinds: Vec<(String, NodeKind)> = tree
            .pre_order()
            .into_iter()
            .filter_map(|id| tree.node(id))
            .map(|node| (node.id().to_owned(), node.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (String::from("root"), NodeKind::Group),
                (String::from("a"), NodeKind::Entry),
                (String::from("set"), NodeKind::Set),
                (String::from("b"), NodeKind::Entry),
                (String::from("note"), NodeKind::Info),
            ]
        );

        let set = tree.find("set").expect("set");
        let b = tree.find("b").expect("b");
        assert_eq!(tree.node(b).and_then(|node| node.parent()), Some(set));
    }

    #[test]
    fn given_unmatched_or_loading_layer_when_built_then_entry_is_placeholder()
    {
        let layers = vec![MemoryLayer::pending("slow").into_shared()];
        let tree = build(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "missing" }, { "layerId": "slow" }]
            }),
            &layers,
        );

        let missing = tree.find_node("missing").expect("missing");
        let slow = tree.find_node("slow").expect("slow");
        assert_eq!(missing.kind(), NodeKind::Placeholder);
        assert_eq!(slow.kind(), NodeKind::Placeholder);
        assert!(missing.as_entry().is_some_and(|entry| entry.is_loaded()));
        assert!(slow.as_entry().is_some_and(|entry| !entry.is_loaded()));
        assert!(slow.as_entry().is_some_and(|entry| entry.is_pending()));
    }

    #[test]
    fn given_sublayer_entries_when_built_then_ids_are_composed_with_index() {
        let layers = vec![
            MemoryLayer::new("census-1").into_shared(),
            MemoryLayer::new("census-4").into_shared(),
        ];
        let tree = build(
            json!({
                "layerId": "root",
                "children": [
                    { "layerId": "census", "entryIndex": 1 },
                    { "layerId": "census", "entryIndex": 4 }
                ]
            }),
            &layers,
        );

        let first = tree.find_node("census-1").expect("first sublayer");
        let second = tree.find_node("census-4").expect("second sublayer");
        assert_eq!(first.kind(), NodeKind::Entry);
        assert_eq!(second.kind(), NodeKind::Entry);

        let entry = first.as_entry().expect("entry");
        assert_eq!(entry.layer_parent_id(), Some("census"));
        assert_eq!(entry.entry_index(), Some(1));
    }

    #[test]
    fn given_config_defaults_when_built_then_group_is_expanded_and_visible() {
        let tree = build(
            json!({ "layerId": "root", "name": "Root", "children": [] }),
            &[],
        );

        let root = tree.node(tree.root()).expect("root");
        let group = root.as_group().expect("group");
        assert!(group.expanded());
        assert!(group.visibility());
        assert!(!root.is_hidden());
        assert_eq!(root.name(), "Root");
    }

    #[test]
    fn given_entry_visibility_in_config_when_built_then_layer_adopts_it() {
        let layer = MemoryLayer::new("a").into_shared();
        let tree = build(
            json!({
                "layerId": "root",
                "children": [{ "layerId": "a", "visibility": false }]
            }),
            &[layer.clone()],
        );

        let a = tree.find("a").expect("a");
        assert_eq!(tree.visibility(a), Some(false));
    }

    #[test]
    fn given_duplicate_ids_when_built_then_first_wins_and_diagnostic_is_queued()
     {
        let mut tree = build(
            json!({
                "layerId": "root",
                "children": [
                    { "layerId": "dup", "children": [] },
                    { "layerId": "dup", "children": [] }
                ]
            }),
            &[],
        );

        let first = tree.node(tree.root()).expect("root").children()[0];
        assert_eq!(tree.find("dup"), Some(first));
        assert_eq!(
            tree.drain_diagnostics(),
            vec![Diagnostic::DuplicateId {
                id: String::from("dup")
            }]
        );
    }

    #[test]
    fn given_entry_without_layer_id_when_built_then_config_is_rejected() {
        let config = NodeConfig::from_value(json!({
            "layerId": "root",
            "children": [{ "name": "nameless" }]
        }))
        .expect("config parses");

        let result = LegendTree::build(&config, &handles(&[]));
        assert!(matches!(
            result,
            Err(LegendError::InvalidConfig { ref id, .. }) if id == "nameless"
        ));
    }

    #[test]
    fn given_group_without_id_when_built_then_id_is_synthesised() {
        let tree = build(
            json!({ "children": [{ "exclusiveVisibility": [] }] }),
            &[],
        );

        assert_eq!(tree.find("group-0"), Some(tree.root()));
        assert!(tree.find("set-1").is_some());
    }
}
