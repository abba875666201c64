// npy-mosaic/src/tiles/mod.rs

mod binding;
mod maximize;
mod presentation;
mod registry;
mod workspace;

pub use binding::{derive_binding, BindingKey, BindingTracker, HeatmapBinding};
pub use maximize::{MaximizeChange, MaximizeState};
pub use presentation::{
    clamp_info_panel_width, PresentationStore, TilePresentation, INFO_PANEL_DEFAULT_WIDTH,
    INFO_PANEL_MAX_WIDTH, INFO_PANEL_MIN_WIDTH, INFO_PANEL_UNITS_PER_COLUMN,
};
pub use registry::{ResourceRegistry, TileRegions, TileRegistry, TitleButton};
pub use workspace::{Workspace, MAXIMIZE_PERCENTAGE};
