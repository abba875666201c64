//! File catalog state machine
//!
//! Tracks the backend file listing, the selected file and the selected
//! leading index, and decides which fetches must be issued. The catalog
//! performs no I/O itself: it hands out tagged requests and later accepts
//! their results, discarding any result for a file that is no longer
//! selected. At most one load per filename is in flight.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use log::{debug, info, warn};

use super::array::{FileDescriptor, LoadedArray};
use super::cache::ArrayCache;
use super::errors::FetchError;

/// Lifecycle of the file listing
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CatalogStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// A pending `list-numpy-files` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub generation: u64,
}

/// A pending `load-numpy-file` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub filename: String,
}

/// What happened to a completed file load
#[derive(Debug)]
pub enum LoadOutcome {
    /// Inserted into the cache
    Committed,
    /// The selection moved on before the response arrived
    Superseded,
    /// Another response already filled the cache for this file
    AlreadyCached,
    /// The fetch failed; the cache is untouched
    Failed(FetchError),
}

#[derive(Debug, Default)]
pub struct FileCatalog {
    status: CatalogStatus,
    files: Vec<FileDescriptor>,
    selected: Option<String>,
    selected_index: usize,
    list_generation: u64,
    selection_generation: u64,
    /// filename -> generation of the outstanding load
    in_flight: HashMap<String, u64>,
    /// Files whose last load failed; cleared by selecting them again
    failed: HashSet<String>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn selected_filename(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn is_loading(&self) -> bool {
        self.status == CatalogStatus::Loading
    }

    /// Descriptor of the selected file, if it is part of the current listing
    pub fn selected_descriptor(&self) -> Option<&FileDescriptor> {
        let name = self.selected.as_deref()?;
        self.files.iter().find(|f| f.filename == name)
    }

    /// Valid leading indices for the selected file; empty when the file has no leading axis
    pub fn valid_index_range(&self) -> Range<usize> {
        match self.selected_descriptor() {
            Some(desc) if desc.leading_len() > 0 => 0..desc.leading_len(),
            _ => 0..0,
        }
    }

    /// Whether a file load for the current selection is outstanding
    pub fn is_fetching(&self) -> bool {
        self.selected
            .as_ref()
            .map_or(false, |name| self.in_flight.contains_key(name))
    }

    /// Start (or restart) fetching the file list. Older list responses become stale.
    pub fn begin_refresh(&mut self) -> ListRequest {
        self.list_generation += 1;
        self.status = CatalogStatus::Loading;
        info!("Requesting file list (generation {})", self.list_generation);
        ListRequest {
            generation: self.list_generation,
        }
    }

    /// Accept a file list result. Returns false when the response was stale and dropped.
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        result: Result<Vec<FileDescriptor>, FetchError>,
    ) -> bool {
        if generation != self.list_generation {
            debug!(
                "Dropping stale file list (generation {}, current {})",
                generation, self.list_generation
            );
            return false;
        }
        match result {
            Ok(files) => {
                info!("File list loaded with {} entries", files.len());
                self.files = files;
                self.status = CatalogStatus::Loaded;
            }
            Err(err) => {
                warn!("File list failed: {}", err);
                self.files.clear();
                self.status = CatalogStatus::Errored(err.to_string());
            }
        }
        self.reconcile_selection();
        true
    }

    fn reconcile_selection(&mut self) {
        let still_listed = self
            .selected
            .as_deref()
            .map_or(false, |name| self.files.iter().any(|f| f.filename == name));
        if self.files.is_empty() {
            if self.selected.take().is_some() {
                self.selection_generation += 1;
            }
        } else if !still_listed {
            let first = self.files[0].filename.clone();
            debug!("Auto-selecting {}", first);
            self.set_selection(first);
        }
        self.clamp_index();
    }

    /// Select a listed file. Reselecting the current file retries a failed load.
    pub fn select_file(&mut self, filename: &str) -> bool {
        if !self.files.iter().any(|f| f.filename == filename) {
            debug!("Ignoring selection of unlisted file {}", filename);
            return false;
        }
        if self.failed.remove(filename) {
            debug!("Retrying {}", filename);
            self.selection_generation += 1;
        }
        self.set_selection(filename.to_string());
        self.clamp_index();
        true
    }

    fn set_selection(&mut self, filename: String) {
        if self.selected.as_deref() != Some(filename.as_str()) {
            self.selected = Some(filename);
            self.selection_generation += 1;
        }
    }

    /// Step the selection through the listing, wrapping around
    pub fn select_relative(&mut self, forward: bool) -> bool {
        if self.files.is_empty() {
            return false;
        }
        let n = self.files.len();
        let current = self
            .selected
            .as_deref()
            .and_then(|name| self.files.iter().position(|f| f.filename == name));
        let next = match current {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None => 0,
        };
        let filename = self.files[next].filename.clone();
        self.select_file(&filename)
    }

    /// Request a leading index; anything outside the valid range resets to 0
    pub fn select_index(&mut self, index: usize) {
        self.selected_index = index;
        self.clamp_index();
    }

    /// Step the leading index, clamping at the ends of the range
    pub fn step_index(&mut self, forward: bool) {
        let range = self.valid_index_range();
        if range.is_empty() {
            self.selected_index = 0;
            return;
        }
        let index = if forward {
            (self.selected_index + 1).min(range.end - 1)
        } else {
            self.selected_index.saturating_sub(1)
        };
        self.select_index(index);
    }

    fn clamp_index(&mut self) {
        if !self.valid_index_range().contains(&self.selected_index) {
            self.selected_index = 0;
        }
    }

    /// The load that should be issued for the current selection, if any.
    ///
    /// Returns nothing when the file is cached, already in flight, or failed
    /// and not selected again since.
    pub fn poll_load(&mut self, cache: &ArrayCache) -> Option<LoadRequest> {
        let filename = self.selected.clone()?;
        if cache.has(&filename) {
            return None;
        }
        if self.in_flight.contains_key(&filename) || self.failed.contains(&filename) {
            return None;
        }
        let request = LoadRequest {
            generation: self.selection_generation,
            filename,
        };
        debug!(
            "Requesting {} (generation {})",
            request.filename, request.generation
        );
        self.in_flight
            .insert(request.filename.clone(), request.generation);
        Some(request)
    }

    /// Accept a file load result, committing it to `cache` only if still current
    pub fn complete_load(
        &mut self,
        cache: &mut ArrayCache,
        generation: u64,
        filename: &str,
        result: Result<LoadedArray, FetchError>,
    ) -> LoadOutcome {
        if self.in_flight.get(filename) == Some(&generation) {
            self.in_flight.remove(filename);
        }
        // the cache is keyed by filename, so any response for the selected file is usable
        if self.selected.as_deref() != Some(filename) {
            debug!("Dropping superseded load of {} (generation {})", filename, generation);
            return LoadOutcome::Superseded;
        }
        match result {
            Ok(array) => {
                if cache.put(filename, array) {
                    info!("Cached {}", filename);
                    LoadOutcome::Committed
                } else {
                    LoadOutcome::AlreadyCached
                }
            }
            Err(err) => {
                warn!("Loading {} failed: {}", filename, err);
                self.failed.insert(filename.to_string());
                LoadOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn desc(name: &str, shape: &[usize]) -> FileDescriptor {
        FileDescriptor {
            filename: name.to_string(),
            shape: shape.to_vec(),
            size_mb: None,
        }
    }

    fn loaded(name: &str) -> LoadedArray {
        LoadedArray::from_nested(name, &json!([[[1, 2]], [[3, 4]]]), vec![2, 1, 2], 1.0, 4.0)
            .unwrap()
    }

    fn catalog_with(files: Vec<FileDescriptor>) -> FileCatalog {
        crate::_setup_pretty_env_logger_default();
        let mut catalog = FileCatalog::new();
        let req = catalog.begin_refresh();
        assert!(catalog.complete_refresh(req.generation, Ok(files)));
        catalog
    }

    #[test]
    fn test_status_transitions() {
        let mut catalog = FileCatalog::new();
        assert_eq!(catalog.status(), &CatalogStatus::Idle);
        let req = catalog.begin_refresh();
        assert!(catalog.is_loading());
        catalog.complete_refresh(
            req.generation,
            Err(FetchError::ServerReported("Error listing files".into())),
        );
        assert_eq!(
            catalog.status(),
            &CatalogStatus::Errored("Error listing files".into())
        );
        assert!(catalog.selected_filename().is_none());
    }

    #[test]
    fn test_auto_selects_first_and_clears_on_empty() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[3, 4, 4]), desc("b.npy", &[2, 2, 2])]);
        assert_eq!(catalog.selected_filename(), Some("a.npy"));
        assert!(catalog.select_file("b.npy"));

        let req = catalog.begin_refresh();
        catalog.complete_refresh(req.generation, Ok(vec![]));
        assert!(catalog.selected_filename().is_none());
        assert_eq!(catalog.valid_index_range(), 0..0);
    }

    #[test]
    fn test_keeps_selection_across_refresh() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[3, 4, 4]), desc("b.npy", &[2, 2, 2])]);
        catalog.select_file("b.npy");
        let req = catalog.begin_refresh();
        catalog.complete_refresh(req.generation, Ok(vec![desc("a.npy", &[3, 4, 4]), desc("b.npy", &[2, 2, 2])]));
        assert_eq!(catalog.selected_filename(), Some("b.npy"));
    }

    #[test]
    fn test_stale_list_is_dropped() {
        let mut catalog = FileCatalog::new();
        let old = catalog.begin_refresh();
        let new = catalog.begin_refresh();
        assert!(!catalog.complete_refresh(old.generation, Ok(vec![desc("old.npy", &[1, 1, 1])])));
        assert!(catalog.is_loading());
        assert!(catalog.complete_refresh(new.generation, Ok(vec![desc("new.npy", &[1, 1, 1])])));
        assert_eq!(catalog.selected_filename(), Some("new.npy"));
    }

    #[test]
    fn test_index_always_clamped() {
        let mut catalog = catalog_with(vec![
            desc("a.npy", &[3, 4, 4]),
            desc("scalar.npy", &[]),
            desc("empty.npy", &[0, 4, 4]),
        ]);
        catalog.select_index(2);
        assert_eq!(catalog.selected_index(), 2);
        catalog.select_index(3);
        assert_eq!(catalog.selected_index(), 0);
        catalog.select_index(2);
        catalog.step_index(true);
        assert_eq!(catalog.selected_index(), 2);

        catalog.select_file("scalar.npy");
        assert_eq!(catalog.valid_index_range(), 0..0);
        assert_eq!(catalog.selected_index(), 0);
        catalog.select_index(5);
        assert_eq!(catalog.selected_index(), 0);

        catalog.select_file("empty.npy");
        catalog.step_index(true);
        assert_eq!(catalog.selected_index(), 0);
    }

    #[test]
    fn test_cache_first_and_single_flight() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[2, 1, 2])]);
        let mut cache = ArrayCache::new();

        let req = catalog.poll_load(&cache).unwrap();
        assert_eq!(req.filename, "a.npy");
        assert!(catalog.poll_load(&cache).is_none());
        assert!(catalog.is_fetching());

        let outcome = catalog.complete_load(&mut cache, req.generation, "a.npy", Ok(loaded("a.npy")));
        assert!(matches!(outcome, LoadOutcome::Committed));
        assert!(catalog.poll_load(&cache).is_none());

        // reselecting a cached file never fetches
        catalog.select_file("a.npy");
        assert!(catalog.poll_load(&cache).is_none());
    }

    #[test]
    fn test_superseded_response_is_discarded() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[2, 1, 2]), desc("b.npy", &[2, 1, 2])]);
        let mut cache = ArrayCache::new();
        let first = catalog.poll_load(&cache).unwrap();
        catalog.select_file("b.npy");
        let second = catalog.poll_load(&cache).unwrap();
        assert_eq!(second.filename, "b.npy");

        let outcome = catalog.complete_load(&mut cache, first.generation, "a.npy", Ok(loaded("a.npy")));
        assert!(matches!(outcome, LoadOutcome::Superseded));
        assert!(!cache.has("a.npy"));

        let outcome = catalog.complete_load(&mut cache, second.generation, "b.npy", Ok(loaded("b.npy")));
        assert!(matches!(outcome, LoadOutcome::Committed));
    }

    #[test]
    fn test_reselecting_loading_file_keeps_single_fetch() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[2, 1, 2]), desc("b.npy", &[2, 1, 2])]);
        let mut cache = ArrayCache::new();
        let req = catalog.poll_load(&cache).unwrap();

        catalog.select_file("a.npy");
        assert!(catalog.poll_load(&cache).is_none());
        assert!(catalog.is_fetching());

        let outcome = catalog.complete_load(&mut cache, req.generation, "a.npy", Ok(loaded("a.npy")));
        assert!(matches!(outcome, LoadOutcome::Committed));
        assert!(cache.has("a.npy"));
    }

    #[test]
    fn test_switching_back_to_loading_file_reuses_fetch() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[2, 1, 2]), desc("b.npy", &[2, 1, 2])]);
        let mut cache = ArrayCache::new();
        let a = catalog.poll_load(&cache).unwrap();

        catalog.select_file("b.npy");
        let b = catalog.poll_load(&cache).unwrap();
        assert_eq!(b.filename, "b.npy");
        catalog.select_file("a.npy");
        assert!(catalog.poll_load(&cache).is_none());

        let outcome = catalog.complete_load(&mut cache, a.generation, "a.npy", Ok(loaded("a.npy")));
        assert!(matches!(outcome, LoadOutcome::Committed));
        let outcome = catalog.complete_load(&mut cache, b.generation, "b.npy", Ok(loaded("b.npy")));
        assert!(matches!(outcome, LoadOutcome::Superseded));
        assert!(!catalog.is_fetching());

        // b's fetch is settled, so coming back to it fetches again
        catalog.select_file("b.npy");
        assert_eq!(catalog.poll_load(&cache).map(|r| r.filename), Some("b.npy".to_string()));
    }

    #[test]
    fn test_failed_load_waits_for_reselect() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[2, 1, 2])]);
        let mut cache = ArrayCache::new();
        let req = catalog.poll_load(&cache).unwrap();
        let outcome = catalog.complete_load(
            &mut cache,
            req.generation,
            "a.npy",
            Err(FetchError::Protocol("bad".into())),
        );
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(!cache.has("a.npy"));
        assert!(catalog.poll_load(&cache).is_none());

        catalog.select_file("a.npy");
        assert!(catalog.poll_load(&cache).is_some());
    }

    #[test]
    fn test_select_relative_wraps() {
        let mut catalog = catalog_with(vec![desc("a.npy", &[1, 1, 1]), desc("b.npy", &[1, 1, 1])]);
        assert!(catalog.select_relative(true));
        assert_eq!(catalog.selected_filename(), Some("b.npy"));
        assert!(catalog.select_relative(true));
        assert_eq!(catalog.selected_filename(), Some("a.npy"));
        assert!(catalog.select_relative(false));
        assert_eq!(catalog.selected_filename(), Some("b.npy"));
        assert!(!catalog.select_file("zzz.npy"));
    }
}
