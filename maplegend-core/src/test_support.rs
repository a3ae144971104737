use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::config::NodeConfig;
use crate::layer::LayerHandle;
use crate::memory::{MemoryLayer, as_handles};
use crate::tree::LegendTree;

pub(crate) fn handles(
    layers: &[Rc<RefCell<MemoryLayer>>],
) -> Vec<LayerHandle> {
    as_handles(layers)
}

pub(crate) fn shared_layers(
    layers: &[(&str, bool)],
) -> Vec<Rc<RefCell<MemoryLayer>>> {
    layers
        .iter()
        .map(|(id, visible)| {
            MemoryLayer::new(*id).with_visibility(*visible).into_shared()
        })
        .collect()
}

pub(crate) fn build(
    config: Value,
    layers: &[Rc<RefCell<MemoryLayer>>],
) -> LegendTree {
    let config = NodeConfig::from_value(config).expect("config parses");
    LegendTree::build(&config, &handles(layers)).expect("tree builds")
}

pub(crate) fn build_initialized(
    config: Value,
    layers: &[Rc<RefCell<MemoryLayer>>],
) -> LegendTree {
    let mut tree = build(config, layers);
    tree.initialize();
    tree
}
