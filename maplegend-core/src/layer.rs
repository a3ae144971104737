//! Contract between the legend and the map layers it mirrors.
//!
//! The legend never loads, projects or draws a layer. It only reads and
//! writes the handful of properties below and waits on the layer's own
//! readiness signal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use flume::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};

/// Shared, single-threaded reference to a layer resource.
pub type LayerHandle = Rc<RefCell<dyn LayerResource>>;

/// Source type of a layer, as far as the legend cares.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum LayerType {
    #[default]
    Feature,
    /// Multi-sublayer source; legend entries must address one sublayer.
    MapImage,
    Tile,
    Image,
    Other,
}

/// One item of a layer's symbology stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbology {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Visibility the user last chose for this item.
    #[serde(default = "default_true")]
    pub last_visible: bool,
}

impl Symbology {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible: true,
            last_visible: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Structural snapshot of a layer and its sublayers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTree {
    pub layer_id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<LayerTree>,
}

/// Result delivered by a layer's readiness signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

/// Receiving half of a one-shot readiness signal.
///
/// Polling never blocks. A signal whose sender went away without
/// delivering an outcome reads as a failure.
#[derive(Debug)]
pub struct LoadSignal {
    receiver: Receiver<LoadOutcome>,
}

impl LoadSignal {
    /// Signal that is already resolved with `outcome`.
    pub fn resolved(outcome: LoadOutcome) -> Self {
        let (sender, receiver) = flume::bounded(1);
        let _ = sender.send(outcome);
        Self { receiver }
    }

    /// Outcome if the layer finished loading, `None` while still pending.
    pub fn try_outcome(&self) -> Option<LoadOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(LoadOutcome::Failed(
                String::from("layer dropped its load signal"),
            )),
        }
    }
}

/// Sending half used by layer implementations to resolve their signals.
#[derive(Debug, Default)]
pub struct LoadNotifier {
    outcome: Option<LoadOutcome>,
    waiters: Vec<Sender<LoadOutcome>>,
}

impl LoadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a new signal; resolved immediately once loading finished.
    pub fn subscribe(&mut self) -> LoadSignal {
        if let Some(outcome) = &self.outcome {
            return LoadSignal::resolved(outcome.clone());
        }

        let (sender, receiver) = flume::bounded(1);
        self.waiters.push(sender);
        LoadSignal { receiver }
    }

    /// Resolve every outstanding signal. Only the first outcome counts.
    pub fn resolve(&mut self, outcome: LoadOutcome) {
        if self.outcome.is_some() {
            return;
        }

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }
}

/// Map layer as seen by a legend entry.
pub trait LayerResource: fmt::Debug {
    /// Identifier legend config refers to.
    fn id(&self) -> &str;
    /// Identifier unique to this layer instance.
    fn uid(&self) -> &str;
    fn name(&self) -> &str;
    fn layer_type(&self) -> LayerType;
    /// Whether the layer is loaded and usable.
    fn is_valid(&self) -> bool;
    fn visibility(&self) -> bool;
    fn set_visibility(&mut self, visible: bool);
    fn opacity(&self) -> f32;
    fn set_opacity(&mut self, opacity: f32);
    fn symbology(&self) -> &[Symbology];
    fn symbology_mut(&mut self) -> &mut [Symbology];
    fn layer_tree(&self) -> LayerTree;
    /// Readiness signal resolved when the layer finishes loading.
    fn load_signal(&mut self) -> LoadSignal;
}
