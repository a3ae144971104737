use std::rc::Rc;

use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::layer::{LayerHandle, LayerType, LoadOutcome, LoadSignal};
use crate::node::NodeId;
use crate::tree::LegendTree;

impl LegendTree {
    /// Complete every binding whose layer finished loading.
    ///
    /// Never blocks: signals that are still pending are left for a later
    /// call. Returns how many signals resolved, loaded or failed.
    pub fn poll_bindings(&mut self) -> usize {
        let pending: Vec<NodeId> = self
            .pre_order()
            .into_iter()
            .filter(|id| {
                self.nodes[id.0]
                    .as_entry()
                    .is_some_and(|entry| entry.is_pending())
            })
            .collect();

        pending
            .into_iter()
            .filter(|id| self.poll_binding(*id))
            .count()
    }

    /// Attach `layer` to an entry, replacing any previous binding.
    ///
    /// The entry acts as a placeholder until the layer's readiness signal
    /// resolves; an already loaded layer completes the binding right away.
    pub fn rebind(&mut self, id: NodeId, layer: LayerHandle) -> Result<()> {
        self.expect_entry(id)?;

        let (signal, valid) = {
            let mut resource = layer.borrow_mut();
            (resource.load_signal(), resource.is_valid())
        };
        log::debug!(
            "rebinding legend entry `{}` to layer `{}`",
            self.nodes[id.0].id,
            layer.borrow().id()
        );

        let entry = self.entry_state_mut(id);
        entry.layer = Some(layer);
        entry.layer_tree = None;
        entry.layer_uid = None;
        entry.pending = Some(signal);
        if !valid {
            entry.placeholder = true;
        }
        self.bump(id);

        self.poll_binding(id);
        Ok(())
    }

    fn poll_binding(&mut self, id: NodeId) -> bool {
        let entry = self.entry_state(id);
        let Some(outcome) =
            entry.pending.as_ref().and_then(LoadSignal::try_outcome)
        else {
            return false;
        };
        self.entry_state_mut(id).pending = None;

        match outcome {
            LoadOutcome::Loaded => self.complete_binding(id),
            LoadOutcome::Failed(reason) => {
                let entry = self.nodes[id.0].id.clone();
                self.report(Diagnostic::LoadFailed { entry, reason });
            },
        }
        true
    }

    fn complete_binding(&mut self, id: NodeId) {
        let Some(handle) = self.entry_state(id).layer.as_ref().map(Rc::clone)
        else {
            return;
        };

        let (valid, snapshot, uid, layer_type) = {
            let layer = handle.borrow();
            (
                layer.is_valid(),
                layer.layer_tree(),
                layer.uid().to_owned(),
                layer.layer_type(),
            )
        };
        if !valid {
            log::debug!(
                "layer for legend entry `{}` reported loaded but is not valid",
                self.nodes[id.0].id
            );
            return;
        }

        let entry = self.entry_state_mut(id);
        let was_placeholder = entry.placeholder;
        entry.layer_tree = Some(snapshot);
        entry.layer_uid = Some(uid);

        if layer_type == LayerType::MapImage && entry.entry_index.is_none() {
            entry.placeholder = true;
            let node = &self.nodes[id.0];
            let diagnostic = Diagnostic::StructuralBinding {
                entry: node.id.clone(),
                name: node.name.clone(),
            };
            self.report(diagnostic);
            self.bump(id);
            return;
        }

        entry.placeholder = false;
        self.bump(id);
        log::debug!("legend entry `{}` bound", self.nodes[id.0].id);

        if was_placeholder && self.is_visible(id) {
            if let Some(parent) = self.nodes[id.0].parent {
                self.reconcile_group(parent, id);
            }
        }
    }
}
