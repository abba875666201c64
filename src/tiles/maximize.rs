// npy-mosaic/src/tiles/maximize.rs

use crate::mosaic::TileId;

/// At most one tile fills the mosaic at a time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MaximizeState {
    #[default]
    Normal,
    Maximized(TileId),
}

impl MaximizeState {
    pub fn maximized(&self) -> Option<&TileId> {
        match self {
            MaximizeState::Normal => None,
            MaximizeState::Maximized(id) => Some(id),
        }
    }

    pub fn is_maximized(&self, id: &TileId) -> bool {
        self.maximized() == Some(id)
    }
}

/// Result of a maximize toggle request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaximizeChange {
    Maximized,
    Restored,
    /// Another tile is already maximized
    Rejected(TileId),
    /// The tile is not part of the layout
    Missing,
}
