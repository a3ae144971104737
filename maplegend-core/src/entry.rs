use std::rc::Rc;

use crate::controls::Controls;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::layer::Symbology;
use crate::node::NodeId;
use crate::tree::LegendTree;

impl LegendTree {
    /// Show, hide or flip the layer behind an entry.
    pub(crate) fn toggle_entry(
        &mut self,
        id: NodeId,
        visible: Option<bool>,
        update_parent: bool,
    ) {
        if !self.has_control(id, Controls::VISIBILITY) {
            return;
        }
        let Some(handle) = self.entry_state(id).bound_layer().map(Rc::clone)
        else {
            return;
        };

        {
            let mut layer = handle.borrow_mut();
            let current = layer.visibility();
            let next = visible.unwrap_or(!current);
            if next == current {
                return;
            }
            layer.set_visibility(next);
            reconcile_symbology(layer.symbology_mut(), next);
        }

        self.bump(id);

        if update_parent {
            if let Some(parent) = self.nodes[id.0].parent {
                self.reconcile_group(parent, id);
            }
        }
    }

    /// Force an entry hidden without touching its parent.
    pub(crate) fn hide_entry(&mut self, id: NodeId) {
        let Some(handle) = self.entry_state(id).layer.as_ref().map(Rc::clone)
        else {
            return;
        };

        {
            let mut layer = handle.borrow_mut();
            if !layer.visibility() {
                return;
            }
            layer.set_visibility(false);
            reconcile_symbology(layer.symbology_mut(), false);
        }

        self.bump(id);
    }

    /// Show or hide one symbology item of an entry's layer.
    ///
    /// The choice is remembered and survives the entry being hidden and
    /// shown again. An unknown symbology id only produces a diagnostic.
    pub fn set_child_symbology_visibility(
        &mut self,
        id: NodeId,
        symbology_id: &str,
        visible: bool,
    ) -> Result<()> {
        self.expect_entry(id)?;
        let Some(handle) = self.entry_state(id).bound_layer().map(Rc::clone)
        else {
            return Ok(());
        };

        let found = {
            let mut layer = handle.borrow_mut();
            match layer
                .symbology_mut()
                .iter_mut()
                .find(|item| item.id == symbology_id)
            {
                Some(item) => {
                    item.visible = visible;
                    item.last_visible = visible;
                    true
                },
                None => false,
            }
        };

        if found {
            self.bump(id);
        } else {
            let entry = self.nodes[id.0].id.clone();
            self.report(Diagnostic::MissingSymbology {
                entry,
                symbology: symbology_id.to_owned(),
            });
        }
        Ok(())
    }

    /// Pass an opacity in `[0, 1]` through to the entry's layer.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> Result<()> {
        self.expect_entry(id)?;
        let Some(handle) = self.entry_state(id).bound_layer().map(Rc::clone)
        else {
            return Ok(());
        };

        handle.borrow_mut().set_opacity(opacity);
        self.bump(id);
        Ok(())
    }

    /// Expand or collapse the symbology stack shown under an entry.
    pub fn toggle_display_symbology(
        &mut self,
        id: NodeId,
        display: Option<bool>,
    ) -> Result<bool> {
        self.expect_entry(id)?;
        let entry = self.entry_state_mut(id);
        let next = display.unwrap_or(!entry.display_symbology);
        if next == entry.display_symbology {
            return Ok(next);
        }
        entry.display_symbology = next;
        self.bump(id);
        Ok(next)
    }
}

fn reconcile_symbology(items: &mut [Symbology], layer_visible: bool) {
    // Nothing deliberately excluded means everything is wanted.
    if !items.iter().any(|item| item.last_visible) {
        for item in items.iter_mut() {
            item.last_visible = true;
        }
    }

    for item in items.iter_mut() {
        item.visible = layer_visible && item.last_visible;
    }
}
