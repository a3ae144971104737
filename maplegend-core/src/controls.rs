use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Operations a legend node exposes to the user.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Controls: u16 {
        const OPACITY = 1 << 0;
        const VISIBILITY = 1 << 1;
        const BOUNDING_BOX = 1 << 2;
        const BOUNDARY_ZOOM = 1 << 3;
        const QUERY = 1 << 4;
        const METADATA = 1 << 5;
        const REFRESH = 1 << 6;
        const RELOAD = 1 << 7;
        const REMOVE = 1 << 8;
        const SETTINGS = 1 << 9;
        const DATATABLE = 1 << 10;
        const SYMBOLOGY = 1 << 11;
    }
}

impl Default for Controls {
    /// Controls granted to a node whose config does not list any.
    fn default() -> Self {
        Self::VISIBILITY
            | Self::BOUNDARY_ZOOM
            | Self::METADATA
            | Self::REFRESH
            | Self::RELOAD
            | Self::REMOVE
            | Self::DATATABLE
            | Self::SETTINGS
            | Self::SYMBOLOGY
    }
}

/// Single control name as written in legend config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    Opacity,
    Visibility,
    BoundingBox,
    BoundaryZoom,
    Query,
    Metadata,
    Refresh,
    Reload,
    Remove,
    Settings,
    Datatable,
    Symbology,
}

impl From<Control> for Controls {
    fn from(value: Control) -> Self {
        match value {
            Control::Opacity => Controls::OPACITY,
            Control::Visibility => Controls::VISIBILITY,
            Control::BoundingBox => Controls::BOUNDING_BOX,
            Control::BoundaryZoom => Controls::BOUNDARY_ZOOM,
            Control::Query => Controls::QUERY,
            Control::Metadata => Controls::METADATA,
            Control::Refresh => Controls::REFRESH,
            Control::Reload => Controls::RELOAD,
            Control::Remove => Controls::REMOVE,
            Control::Settings => Controls::SETTINGS,
            Control::Datatable => Controls::DATATABLE,
            Control::Symbology => Controls::SYMBOLOGY,
        }
    }
}

impl FromIterator<Control> for Controls {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Controls::empty(), |set, control| set | control.into())
    }
}
