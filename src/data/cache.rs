//! Session cache of loaded arrays
//!
//! Grows monotonically: entries are never replaced or evicted, so a slow
//! response for a file cannot clobber the first successful load.

use std::collections::HashMap;

use log::debug;

use super::array::LoadedArray;

#[derive(Debug, Default)]
pub struct ArrayCache {
    entries: HashMap<String, LoadedArray>,
}

impl ArrayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn get(&self, filename: &str) -> Option<&LoadedArray> {
        self.entries.get(filename)
    }

    /// Insert `array` unless `filename` is already cached. Returns true on insert.
    pub fn put(&mut self, filename: &str, array: LoadedArray) -> bool {
        if self.entries.contains_key(filename) {
            debug!("Ignoring duplicate cache write for {}", filename);
            return false;
        }
        self.entries.insert(filename.to_string(), array);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
