use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::controls::Controls;
use crate::layer::{LayerHandle, LayerTree, LoadSignal};

/// Index of a node inside its [`LegendTree`](crate::LegendTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Version token bumped whenever observable node state changes.
///
/// Markers only ever grow, so a renderer can compare the value it last saw
/// with the current one instead of diffing the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeMarker(pub(crate) u64);

impl ChangeMarker {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Kind of a legend node as reported to renderers and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "LegendEntry")]
    Entry,
    #[serde(rename = "LegendGroup")]
    Group,
    #[serde(rename = "VisibilitySet")]
    Set,
    #[serde(rename = "InfoSection")]
    Info,
    Placeholder,
}

/// State shared by every legend node.
#[derive(Debug)]
pub struct LegendNode {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) controls: Controls,
    pub(crate) hidden: bool,
    pub(crate) change: ChangeMarker,
    pub(crate) raw_config: Value,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) variant: NodeVariant,
}

/// Kind-specific state.
#[derive(Debug)]
pub enum NodeVariant {
    Entry(EntryNode),
    Group(GroupNode),
    /// Same shape as a group, but at most one child may be visible.
    Set(GroupNode),
    Info,
}

impl LegendNode {
    /// Stable identifier, unique within the tree.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        match &self.variant {
            NodeVariant::Entry(entry) if entry.placeholder => {
                NodeKind::Placeholder
            },
            NodeVariant::Entry(_) => NodeKind::Entry,
            NodeVariant::Group(_) => NodeKind::Group,
            NodeVariant::Set(_) => NodeKind::Set,
            NodeVariant::Info => NodeKind::Info,
        }
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn has_control(&self, control: Controls) -> bool {
        self.controls.contains(control)
    }

    /// Hidden nodes stay in the tree but are not rendered.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn change_marker(&self) -> ChangeMarker {
        self.change
    }

    /// Config this node was built from, child lists stripped.
    pub fn raw_config(&self) -> &Value {
        &self.raw_config
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn variant(&self) -> &NodeVariant {
        &self.variant
    }

    pub fn as_entry(&self) -> Option<&EntryNode> {
        match &self.variant {
            NodeVariant::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match &self.variant {
            NodeVariant::Group(group) | NodeVariant::Set(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.as_group().is_some()
    }

    /// Own visibility: the layer's flag for entries, the aggregate for
    /// groups and sets, `None` for info sections and unbound entries.
    pub fn visibility(&self) -> Option<bool> {
        match &self.variant {
            NodeVariant::Entry(entry) => entry.visibility(),
            NodeVariant::Group(group) | NodeVariant::Set(group) => {
                Some(group.visibility)
            },
            NodeVariant::Info => None,
        }
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visibility().unwrap_or(false)
    }
}

/// Leaf bound to a layer resource.
#[derive(Debug, Default)]
pub struct EntryNode {
    pub(crate) layer: Option<LayerHandle>,
    pub(crate) placeholder: bool,
    pub(crate) layer_parent_id: Option<String>,
    pub(crate) entry_index: Option<u32>,
    pub(crate) layer_uid: Option<String>,
    pub(crate) layer_tree: Option<LayerTree>,
    pub(crate) display_symbology: bool,
    pub(crate) is_default: Option<bool>,
    pub(crate) pending: Option<LoadSignal>,
}

impl EntryNode {
    pub fn layer(&self) -> Option<&LayerHandle> {
        self.layer.as_ref()
    }

    /// Layer the entry may act on; `None` while it is a placeholder.
    pub(crate) fn bound_layer(&self) -> Option<&LayerHandle> {
        if self.placeholder {
            return None;
        }
        self.layer.as_ref()
    }

    pub fn visibility(&self) -> Option<bool> {
        self.layer.as_ref().map(|layer| layer.borrow().visibility())
    }

    /// Whether the bound layer is usable. Entries without a layer count as
    /// loaded so they do not show a spinner forever.
    pub fn is_loaded(&self) -> bool {
        self.layer
            .as_ref()
            .is_none_or(|layer| layer.borrow().is_valid())
    }

    /// Whether a readiness signal is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn layer_uid(&self) -> Option<String> {
        self.layer_uid.clone().or_else(|| {
            self.layer
                .as_ref()
                .map(|layer| layer.borrow().uid().to_owned())
        })
    }

    /// Source layer id for sublayer entries.
    pub fn layer_parent_id(&self) -> Option<&str> {
        self.layer_parent_id.as_deref()
    }

    pub fn entry_index(&self) -> Option<u32> {
        self.entry_index
    }

    pub fn layer_tree(&self) -> Option<&LayerTree> {
        self.layer_tree.as_ref()
    }

    pub fn display_symbology(&self) -> bool {
        self.display_symbology
    }

    /// True when the entry was not declared in config.
    pub fn is_default(&self) -> Option<bool> {
        self.is_default
    }
}

/// Container state for groups and visibility sets.
#[derive(Debug, Clone, Default)]
pub struct GroupNode {
    pub(crate) expanded: bool,
    pub(crate) visibility: bool,
    pub(crate) visible_children: Vec<NodeId>,
    pub(crate) last_visible: Option<NodeId>,
}

impl GroupNode {
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn visibility(&self) -> bool {
        self.visibility
    }

    /// Children restored when a group is switched back on.
    pub fn visible_children(&self) -> &[NodeId] {
        &self.visible_children
    }

    /// Child restored when a set is switched back on.
    pub fn last_visible(&self) -> Option<NodeId> {
        self.last_visible
    }
}
