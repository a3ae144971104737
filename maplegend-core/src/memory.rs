use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use uuid::Uuid;

use crate::layer::{
    LayerHandle, LayerResource, LayerTree, LayerType, LoadNotifier,
    LoadOutcome, LoadSignal, Symbology,
};

/// Layer catalogue entry describing a [`MemoryLayer`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layer_type: LayerType,
    #[serde(default = "default_true")]
    pub visibility: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Whether the layer is already loaded when the catalogue is read.
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub symbology: Vec<Symbology>,
    /// Service index of a sublayer; only meaningful inside `sublayers`.
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub sublayers: Vec<LayerSpec>,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

/// In-memory layer resource.
///
/// Loading is driven by hand through [`MemoryLayer::finish_loading`] and
/// [`MemoryLayer::fail_loading`].
#[derive(Debug)]
pub struct MemoryLayer {
    id: String,
    uid: String,
    name: String,
    layer_type: LayerType,
    valid: bool,
    visible: bool,
    opacity: f32,
    symbology: Vec<Symbology>,
    sublayers: Vec<LayerTree>,
    notifier: LoadNotifier,
}

impl MemoryLayer {
    /// Create a loaded, visible layer.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut notifier = LoadNotifier::new();
        notifier.resolve(LoadOutcome::Loaded);
        Self {
            name: id.clone(),
            id,
            uid: Uuid::new_v4().to_string(),
            layer_type: LayerType::default(),
            valid: true,
            visible: true,
            opacity: 1.0,
            symbology: Vec::new(),
            sublayers: Vec::new(),
            notifier,
        }
    }

    /// Create a layer that is still loading.
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            valid: false,
            notifier: LoadNotifier::new(),
            ..Self::new(id)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, layer_type: LayerType) -> Self {
        self.layer_type = layer_type;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_symbology(mut self, symbology: Vec<Symbology>) -> Self {
        self.symbology = symbology;
        self
    }

    pub fn with_sublayers(mut self, sublayers: Vec<LayerTree>) -> Self {
        self.sublayers = sublayers;
        self
    }

    /// Mark the layer loaded and resolve waiting signals.
    pub fn finish_loading(&mut self) {
        self.valid = true;
        self.notifier.resolve(LoadOutcome::Loaded);
    }

    /// Reject waiting signals; the layer stays invalid.
    pub fn fail_loading(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.notifier.resolve(LoadOutcome::Failed(reason.into()));
    }

    pub fn into_shared(self) -> Rc<RefCell<MemoryLayer>> {
        Rc::new(RefCell::new(self))
    }
}

impl LayerResource for MemoryLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn uid(&self) -> &str {
        &self.uid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn visibility(&self) -> bool {
        self.visible
    }

    fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn symbology(&self) -> &[Symbology] {
        &self.symbology
    }

    fn symbology_mut(&mut self) -> &mut [Symbology] {
        &mut self.symbology
    }

    fn layer_tree(&self) -> LayerTree {
        LayerTree {
            layer_id: self.id.clone(),
            name: self.name.clone(),
            children: self.sublayers.clone(),
        }
    }

    fn load_signal(&mut self) -> LoadSignal {
        self.notifier.subscribe()
    }
}

/// Build memory layers for a catalogue, sublayers included.
///
/// A sublayer gets the id `<parent>-<index>`, which is the id legend entries
/// with an `entryIndex` are matched against.
pub fn load_catalogue(specs: Vec<LayerSpec>) -> Vec<Rc<RefCell<MemoryLayer>>> {
    let mut layers = Vec::new();
    for spec in specs {
        push_spec(spec, None, &mut layers);
    }
    layers
}

fn push_spec(
    spec: LayerSpec,
    parent: Option<&str>,
    layers: &mut Vec<Rc<RefCell<MemoryLayer>>>,
) -> LayerTree {
    let id = match (parent, spec.index) {
        (Some(parent), Some(index)) => format!("{parent}-{index}"),
        _ => spec.id.clone(),
    };
    let name = if spec.name.is_empty() {
        id.clone()
    } else {
        spec.name.clone()
    };

    let sublayers = spec
        .sublayers
        .into_iter()
        .map(|sublayer| push_spec(sublayer, Some(&id), layers))
        .collect::<Vec<_>>();

    let mut layer = if spec.valid {
        MemoryLayer::new(id.clone())
    } else {
        MemoryLayer::pending(id.clone())
    }
    .with_name(name.clone())
    .with_type(spec.layer_type)
    .with_visibility(spec.visibility)
    .with_symbology(spec.symbology)
    .with_sublayers(sublayers.clone());
    layer.set_opacity(spec.opacity);
    layers.push(layer.into_shared());

    LayerTree {
        layer_id: id,
        name,
        children: sublayers,
    }
}

/// Erase concrete layer types for handing a catalogue to the tree builder.
pub fn as_handles(layers: &[Rc<RefCell<MemoryLayer>>]) -> Vec<LayerHandle> {
    layers
        .iter()
        .map(|layer| {
            let handle: LayerHandle = layer.clone();
            handle
        })
        .collect()
}
