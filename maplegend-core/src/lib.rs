//! Map legend model that keeps legend nodes and map layers in sync.
//!
//! A legend is a tree of nodes built from declarative config:
//! - entries, bound to one layer (or one sublayer of a map image source);
//! - groups, visible whenever any child is visible;
//! - visibility sets, where at most one child may be visible;
//! - info sections, which carry no state.
//!
//! Visibility flows both ways. Toggling a group or set cascades down to its
//! children and remembers what was visible so it can be restored later;
//! toggling anything reconciles every ancestor up to the root. Each node
//! carries a [`ChangeMarker`] renderers can compare instead of diffing.
//!
//! Typical flow:
//! 1. parse a [`NodeConfig`] and collect the [`LayerHandle`]s the map knows;
//! 2. [`LegendTree::build`] the tree and run [`LegendTree::initialize`];
//! 3. call [`LegendTree::poll_bindings`] whenever layers may have finished
//!    loading;
//! 4. drive the tree with [`LegendTree::toggle_visibility`] and friends,
//!    draining [`Diagnostic`]s as they show up.
//!
//! ```
//! use maplegend_core::{LegendTree, MemoryLayer, as_handles};
//!
//! let layers = vec![
//!     MemoryLayer::new("roads").into_shared(),
//!     MemoryLayer::new("rivers").with_visibility(false).into_shared(),
//! ];
//! let config = r#"{
//!     "layerId": "root",
//!     "children": [{ "layerId": "water", "children": [
//!         { "layerId": "roads" }, { "layerId": "rivers" }
//!     ]}]
//! }"#;
//!
//! let mut tree = LegendTree::from_json(config, &as_handles(&layers)).unwrap();
//! tree.initialize();
//!
//! let water = tree.find("water").unwrap();
//! tree.toggle_visibility(water, Some(false)).unwrap();
//! tree.toggle_visibility(water, Some(true)).unwrap();
//!
//! // Only the layer that was on before comes back.
//! assert_eq!(tree.visibility(tree.find("roads").unwrap()), Some(true));
//! assert_eq!(tree.visibility(tree.find("rivers").unwrap()), Some(false));
//! ```

mod binding;
mod builder;
mod config;
mod controls;
mod diagnostics;
mod entry;
mod error;
mod group;
mod layer;
mod memory;
mod node;
mod rows;
mod rules;
mod tree;

#[cfg(test)]
mod test_support;

pub use config::NodeConfig;
pub use controls::{Control, Controls};
pub use diagnostics::Diagnostic;
pub use error::{LegendError, Result};
pub use layer::{
    LayerHandle, LayerResource, LayerTree, LayerType, LoadNotifier,
    LoadOutcome, LoadSignal, Symbology,
};
pub use memory::{LayerSpec, MemoryLayer, as_handles, load_catalogue};
pub use node::{
    ChangeMarker, EntryNode, GroupNode, LegendNode, NodeId, NodeKind,
    NodeVariant,
};
pub use rows::LegendRow;
pub use tree::LegendTree;
