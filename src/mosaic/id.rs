// npy-mosaic/src/mosaic/id.rs

use std::fmt;

/// Identifier of a tile in the mosaic
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Prefix of minted ids, kept apart from seeded leaf names
pub const MINTED_PREFIX: &str = "new-";

/// Monotonic source of fresh tile ids (`new-1`, `new-2`, ...)
#[derive(Debug)]
pub struct TileIdAllocator {
    next: u64,
}

impl Default for TileIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TileIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id for which `taken` is false
    pub fn mint(&mut self, taken: impl Fn(&TileId) -> bool) -> TileId {
        loop {
            let id = TileId::new(format!("{}{}", MINTED_PREFIX, self.next));
            self.next += 1;
            if !taken(&id) {
                return id;
            }
        }
    }
}
