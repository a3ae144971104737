use thiserror::Error;

use crate::node::NodeId;

/// Errors returned by legend tree operations addressed to a specific node.
///
/// Propagation itself never fails; these variants describe callers handing
/// the tree a node of the wrong shape or a config that cannot be built.
#[derive(Debug, Error)]
pub enum LegendError {
    #[error("legend node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("legend node `{id}` is not a group or visibility set")]
    NotAGroup { id: String },

    #[error("legend node `{id}` is not a layer entry")]
    NotAnEntry { id: String },

    #[error("legend node `{child}` is not a direct child of `{parent}`")]
    NotAChild { parent: String, child: String },

    #[error("legend config could not be parsed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid legend config for `{id}`: {reason}")]
    InvalidConfig { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LegendError>;
