// npy-mosaic/src/mosaic/mod.rs

pub mod geometry;
mod id;
mod tree;

pub use geometry::{contains_cell, split_direction_for, MosaicGeometry, Splitter};
pub use id::{TileId, TileIdAllocator, MINTED_PREFIX};
pub use tree::{
    clamp_ratio, Branch, Direction, Mosaic, MosaicNode, MosaicPath, DEFAULT_RATIO, RATIO_MAX,
    RATIO_MIN,
};
