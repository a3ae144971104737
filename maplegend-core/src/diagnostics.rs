use thiserror::Error;

/// Non-fatal problem found while binding or updating legend entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("could not find child symbology `{symbology}` in layer entry `{entry}`")]
    MissingSymbology { entry: String, symbology: String },

    #[error("map image layer has no entryIndex defined - {entry} ({name})")]
    StructuralBinding { entry: String, name: String },

    #[error("layer for entry `{entry}` failed to load: {reason}")]
    LoadFailed { entry: String, reason: String },

    #[error("duplicate legend id `{id}`, lookups resolve to the first node")]
    DuplicateId { id: String },
}

impl Diagnostic {
    /// Identifier of the node the diagnostic is about.
    pub fn subject(&self) -> &str {
        match self {
            Diagnostic::MissingSymbology { entry, .. }
            | Diagnostic::StructuralBinding { entry, .. }
            | Diagnostic::LoadFailed { entry, .. } => entry,
            Diagnostic::DuplicateId { id } => id,
        }
    }

    pub(crate) fn log(&self) {
        match self {
            Diagnostic::StructuralBinding { .. } => log::error!("{self}"),
            _ => log::warn!("{self}"),
        }
    }
}
