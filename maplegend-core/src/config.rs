use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::controls::{Control, Controls};
use crate::error::Result;
use crate::node::NodeKind;

/// Declarative description of one legend node and, recursively, its children.
///
/// A node with `exclusiveVisibility` becomes a visibility set, a node with
/// `children` becomes a group, anything else is a layer entry (or an info
/// section when `type` says so). Keys this struct does not know are kept in
/// [`NodeConfig::extra`] and handed back through the node's raw config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default)]
    pub layer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<Control>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_visibility: Option<Vec<NodeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbology_expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Child list of a container config together with the kind it implies.
pub(crate) struct ChildConfigs<'a> {
    pub(crate) kind: NodeKind,
    pub(crate) children: &'a [NodeConfig],
}

impl NodeConfig {
    /// Parse a config tree from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a config tree from an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Kind this config resolves to before any layer matching happens.
    pub fn declared_kind(&self) -> NodeKind {
        match self.child_configs() {
            Some(children) => children.kind,
            None => match self.node_type {
                Some(NodeKind::Info) => NodeKind::Info,
                _ => NodeKind::Entry,
            },
        }
    }

    pub(crate) fn child_configs(&self) -> Option<ChildConfigs<'_>> {
        if let Some(children) = &self.exclusive_visibility {
            return Some(ChildConfigs {
                kind: NodeKind::Set,
                children,
            });
        }

        self.children.as_deref().map(|children| ChildConfigs {
            kind: NodeKind::Group,
            children,
        })
    }

    pub(crate) fn resolved_controls(&self) -> Controls {
        match &self.controls {
            Some(controls) => controls.iter().copied().collect(),
            None => Controls::default(),
        }
    }

    /// Config of this node alone, with child lists stripped.
    pub(crate) fn raw_value(&self) -> Value {
        let own = NodeConfig {
            children: None,
            exclusive_visibility: None,
            ..self.clone()
        };
        serde_json::to_value(own).unwrap_or(Value::Null)
    }
}
