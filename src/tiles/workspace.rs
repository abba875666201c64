//! Layout tree plus everything kept per tile
//!
//! Every structural change goes through [`Workspace`], which keeps the
//! per-tile maps, the maximize flag and the active selection consistent
//! with the tree in the same call.

use log::{debug, info};

use super::binding::{derive_binding, BindingKey, BindingTracker};
use super::maximize::{MaximizeChange, MaximizeState};
use super::presentation::PresentationStore;
use crate::data::{ArrayCache, FileCatalog};
use crate::mosaic::{Branch, Direction, Mosaic, MosaicNode, TileId, TileIdAllocator};

/// Fill percentage used when maximizing a tile
pub const MAXIMIZE_PERCENTAGE: f64 = 100.0;

#[derive(Debug)]
pub struct Workspace {
    mosaic: Mosaic,
    presentation: PresentationStore,
    maximize: MaximizeState,
    active: Option<TileId>,
    ids: TileIdAllocator,
    tracker: BindingTracker,
}

impl Workspace {
    pub fn new(seeds: &[TileId]) -> Self {
        Self {
            mosaic: Mosaic::balanced(seeds),
            presentation: PresentationStore::new(),
            maximize: MaximizeState::Normal,
            active: None,
            ids: TileIdAllocator::new(),
            tracker: BindingTracker::default(),
        }
    }

    pub fn mosaic(&self) -> &Mosaic {
        &self.mosaic
    }

    pub fn presentation(&self) -> &PresentationStore {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut PresentationStore {
        &mut self.presentation
    }

    pub fn maximize_state(&self) -> &MaximizeState {
        &self.maximize
    }

    pub fn active(&self) -> Option<&TileId> {
        self.active.as_ref()
    }

    /// Make `id` active. Unknown ids are accepted but have no heatmap target.
    pub fn select(&mut self, id: TileId) {
        if !self.mosaic.contains(&id) {
            debug!("Selected tile {} is not in the layout", id);
        }
        self.active = Some(id);
    }

    /// The active tile, if it still exists in the layout
    pub fn effective_target(&self) -> Option<&TileId> {
        self.active.as_ref().filter(|id| self.mosaic.contains(id))
    }

    /// Move the selection through the leaves in layout order, wrapping around
    pub fn cycle_active(&mut self, forward: bool) -> Option<&TileId> {
        let leaves = self.mosaic.leaves();
        if leaves.is_empty() {
            return None;
        }
        let n = leaves.len();
        let current = self
            .effective_target()
            .and_then(|id| leaves.iter().position(|leaf| leaf == id));
        let next = match current {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None if forward => 0,
            None => n - 1,
        };
        self.active = Some(leaves[next].clone());
        self.active.as_ref()
    }

    /// Split `target`, returning the new tile's id.
    ///
    /// A maximized layout is restored first so the new tile gets real space.
    pub fn split(&mut self, target: &TileId, direction: Direction) -> Option<TileId> {
        if self.maximize != MaximizeState::Normal {
            self.leave_maximize();
        }
        if !self.mosaic.contains(target) {
            debug!("Cannot split {}: not in layout", target);
            return None;
        }
        let mosaic = &self.mosaic;
        let new_id = self.ids.mint(|id| mosaic.contains(id));
        self.mosaic = self.mosaic.split(target, new_id.clone(), direction);
        info!("Split {} ({:?}) into {}", target, direction, new_id);
        Some(new_id)
    }

    /// Seed an empty layout with one fresh tile and select it
    pub fn create_tile(&mut self) -> Option<TileId> {
        if !self.mosaic.is_empty() {
            debug!("Layout is not empty; split a tile instead");
            return None;
        }
        let id = self.ids.mint(|_| false);
        self.mosaic = self.mosaic.replace_subtree_at(&[], MosaicNode::Leaf(id.clone()));
        self.maximize = MaximizeState::Normal;
        self.active = Some(id.clone());
        info!("Created tile {}", id);
        Some(id)
    }

    /// Remove `target` and reclaim everything kept for it
    pub fn remove(&mut self, target: &TileId) -> bool {
        if !self.mosaic.contains(target) {
            debug!("Cannot remove {}: not in layout", target);
            return false;
        }
        if self.maximize.is_maximized(target) {
            // drop the maximized layout and fall back to the remembered one
            if let Some(snapshot) = self.presentation.restore_layout(target) {
                self.mosaic = snapshot;
            }
            self.maximize = MaximizeState::Normal;
        }
        self.mosaic = self.mosaic.remove(target);
        self.presentation.prune_snapshots(target);
        self.presentation.reclaim(target);
        if self.active.as_ref() == Some(target) {
            self.active = None;
        }
        self.tracker.reset();
        info!("Removed tile {}", target);
        true
    }

    /// Maximize `id`, or restore the layout if `id` is the maximized tile
    pub fn toggle_maximize(&mut self, id: &TileId) -> MaximizeChange {
        match self.maximize.maximized() {
            Some(current) if current == id => {
                self.leave_maximize();
                MaximizeChange::Restored
            }
            Some(current) => {
                debug!("Maximize of {} rejected: {} is maximized", id, current);
                MaximizeChange::Rejected(current.clone())
            }
            None => {
                let Some(path) = self.mosaic.find_path(id) else {
                    return MaximizeChange::Missing;
                };
                self.presentation.remember_layout(id, &self.mosaic);
                self.mosaic = self.mosaic.expand(&path, MAXIMIZE_PERCENTAGE);
                self.maximize = MaximizeState::Maximized(id.clone());
                info!("Maximized {}", id);
                MaximizeChange::Maximized
            }
        }
    }

    fn leave_maximize(&mut self) {
        if let MaximizeState::Maximized(id) = std::mem::take(&mut self.maximize) {
            match self.presentation.restore_layout(&id) {
                Some(snapshot) => self.mosaic = snapshot,
                None => debug!("No remembered layout for {}", id),
            }
            info!("Restored layout of {}", id);
        }
    }

    /// Set the ratio of the split at `path`
    pub fn set_ratio(&mut self, path: &[Branch], ratio: f64) {
        self.mosaic = self.mosaic.set_ratio(path, ratio);
    }

    /// Grow (positive `delta`) or shrink the active tile within its parent split
    pub fn nudge_active_ratio(&mut self, delta: f64) -> bool {
        let Some(path) = self.effective_target().and_then(|id| self.mosaic.find_path(id)) else {
            return false;
        };
        let Some((last, parent)) = path.split_last() else {
            return false;
        };
        let Some(ratio) = self.mosaic.ratio_at(parent) else {
            return false;
        };
        let ratio = match last {
            Branch::First => ratio + delta,
            Branch::Second => ratio - delta,
        };
        self.set_ratio(parent, ratio);
        true
    }

    /// Exchange the places of two tiles, as a title bar drag and drop does
    pub fn swap_tiles(&mut self, a: &TileId, b: &TileId) -> bool {
        let swapped = self.mosaic.swap_leaves(a, b);
        if swapped == self.mosaic {
            return false;
        }
        self.replace_layout(swapped);
        info!("Swapped tiles {} and {}", a, b);
        true
    }

    /// Adopt an externally assembled layout; tiles it no longer holds are reclaimed
    pub fn replace_layout(&mut self, layout: Mosaic) {
        let before = self.mosaic.leaves();
        self.mosaic = self.mosaic.replace_with(layout);
        for id in before.iter().filter(|id| !self.mosaic.contains(id)) {
            self.presentation.prune_snapshots(id);
            self.presentation.reclaim(id);
        }
        // the new layout supersedes whatever a maximize remembered
        if let Some(id) = self.maximize.maximized().cloned() {
            self.presentation.restore_layout(&id);
        }
        self.maximize = MaximizeState::Normal;
    }

    /// Bind the selected slice to the active tile when any input changed.
    ///
    /// Returns true when a new binding was assigned.
    pub fn refresh_binding(&mut self, catalog: &FileCatalog, cache: &ArrayCache) -> bool {
        let Some(tile) = self.effective_target().cloned() else {
            return false;
        };
        let Some(filename) = catalog.selected_filename() else {
            return false;
        };
        let Some(array) = cache.get(filename) else {
            return false;
        };
        let key = BindingKey {
            tile: tile.clone(),
            filename: filename.to_string(),
            leading_index: catalog.selected_index(),
            cached: cache.len(),
        };
        if !self.tracker.changed(key) {
            return false;
        }
        match derive_binding(array, catalog.selected_index()) {
            Some(binding) => {
                debug!("Binding {} to tile {}", binding.title(), tile);
                self.presentation.assign_heatmap(&tile, binding);
                true
            }
            None => {
                debug!("{} has no 2-D slice to show", filename);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FileDescriptor, LoadedArray};
    use serde_json::json;

    fn seeds() -> Vec<TileId> {
        ["a", "b", "c", "d"].iter().map(|s| TileId::from(*s)).collect()
    }

    #[test]
    fn test_maximize_then_restore_is_identity() {
        let mut ws = Workspace::new(&seeds());
        ws.set_ratio(&[], 35.0);
        let before = ws.mosaic().clone();
        let b = TileId::from("b");
        assert_eq!(ws.toggle_maximize(&b), MaximizeChange::Maximized);
        assert_ne!(ws.mosaic(), &before);
        assert!(ws.maximize_state().is_maximized(&b));
        assert_eq!(ws.toggle_maximize(&b), MaximizeChange::Restored);
        assert_eq!(ws.mosaic(), &before);
        assert!(!ws.presentation().has_snapshot(&b));
    }

    #[test]
    fn test_second_maximize_rejected() {
        let mut ws = Workspace::new(&seeds());
        ws.toggle_maximize(&"a".into());
        let expanded = ws.mosaic().clone();
        assert_eq!(
            ws.toggle_maximize(&"c".into()),
            MaximizeChange::Rejected("a".into())
        );
        assert_eq!(ws.mosaic(), &expanded);
        assert_eq!(ws.toggle_maximize(&"zz".into()), MaximizeChange::Rejected("a".into()));
    }

    #[test]
    fn test_split_while_maximized_restores_first() {
        let mut ws = Workspace::new(&seeds());
        let before = ws.mosaic().clone();
        ws.toggle_maximize(&"b".into());
        let new_id = ws.split(&"b".into(), Direction::Column).unwrap();
        assert_eq!(new_id.as_str(), "new-1");
        assert_eq!(ws.maximize_state(), &MaximizeState::Normal);
        assert_eq!(ws.mosaic().remove(&new_id), before);
    }

    #[test]
    fn test_remove_reclaims_everything() {
        let mut ws = Workspace::new(&seeds());
        let c = TileId::from("c");
        ws.select(c.clone());
        ws.presentation_mut().set_text(&c, "hello");
        let layout = ws.mosaic().clone();
        ws.presentation_mut().remember_layout(&"a".into(), &layout);
        assert!(ws.remove(&c));
        assert!(ws.active().is_none());
        assert!(!ws.mosaic().contains(&c));
        assert!(ws.presentation().is_empty());
        let snapshot = ws.presentation_mut().restore_layout(&"a".into()).unwrap();
        assert!(!snapshot.contains(&c));
        assert!(!ws.remove(&c));
    }

    #[test]
    fn test_remove_maximized_tile_returns_to_normal() {
        let mut ws = Workspace::new(&seeds());
        let before = ws.mosaic().clone();
        ws.toggle_maximize(&"d".into());
        ws.remove(&"d".into());
        assert_eq!(ws.maximize_state(), &MaximizeState::Normal);
        assert_eq!(ws.mosaic(), &before.remove(&"d".into()));
    }

    #[test]
    fn test_create_tile_only_when_empty() {
        let mut ws = Workspace::new(&["a".into()]);
        assert!(ws.create_tile().is_none());
        ws.remove(&"a".into());
        assert!(ws.mosaic().is_empty());
        let id = ws.create_tile().unwrap();
        assert_eq!(ws.mosaic().leaves(), vec![id.clone()]);
        assert_eq!(ws.effective_target(), Some(&id));
    }

    #[test]
    fn test_stale_selection_has_no_target() {
        let mut ws = Workspace::new(&seeds());
        ws.select("ghost".into());
        assert_eq!(ws.active(), Some(&TileId::from("ghost")));
        assert!(ws.effective_target().is_none());
        assert_eq!(ws.cycle_active(true), Some(&TileId::from("a")));
        assert_eq!(ws.cycle_active(false), Some(&TileId::from("d")));
    }

    #[test]
    fn test_nudge_grows_active_tile() {
        let mut ws = Workspace::new(&seeds());
        ws.select("b".into());
        assert!(ws.nudge_active_ratio(10.0));
        assert_eq!(ws.mosaic().ratio_at(&[Branch::First]), Some(40.0));
        ws.select("a".into());
        ws.nudge_active_ratio(-5.0);
        assert_eq!(ws.mosaic().ratio_at(&[Branch::First]), Some(35.0));
    }

    #[test]
    fn test_swap_keeps_presentation_with_tile() {
        let mut ws = Workspace::new(&seeds());
        ws.presentation_mut().set_text(&"a".into(), "left");
        assert!(ws.swap_tiles(&"a".into(), &"d".into()));
        assert_eq!(ws.mosaic().find_path(&"a".into()), Some(vec![Branch::Second, Branch::Second]));
        assert_eq!(ws.presentation().get(&"a".into()).text_fallback, "left");
        assert!(!ws.swap_tiles(&"a".into(), &"a".into()));
    }

    #[test]
    fn test_replace_layout_reclaims_dropped_tiles() {
        let mut ws = Workspace::new(&seeds());
        ws.presentation_mut().set_text(&"d".into(), "gone");
        let dropped = Mosaic::balanced(&["c".into(), "a".into(), "b".into()]);
        ws.replace_layout(dropped.clone());
        assert_eq!(ws.mosaic(), &dropped);
        assert!(ws.presentation().is_empty());
    }

    #[test]
    fn test_selected_slice_binds_to_active_tile() {
        let mut catalog = FileCatalog::new();
        let mut cache = ArrayCache::new();
        let req = catalog.begin_refresh();
        catalog.complete_refresh(
            req.generation,
            Ok(vec![FileDescriptor {
                filename: "a.npy".into(),
                shape: vec![3, 4, 4],
                size_mb: None,
            }]),
        );
        let load = catalog.poll_load(&cache).unwrap();
        let data = (0..3)
            .map(|k| {
                (0..4)
                    .map(|i| (0..4).map(|j| json!(k * 16 + i * 4 + j)).collect::<Vec<_>>())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let array = LoadedArray::from_nested("a.npy", &json!(data), vec![3, 4, 4], 0.0, 47.0).unwrap();
        catalog.complete_load(&mut cache, load.generation, "a.npy", Ok(array.clone()));
        catalog.select_index(1);

        let mut ws = Workspace::new(&["x".into(), "y".into()]);
        assert!(!ws.refresh_binding(&catalog, &cache));
        ws.select("x".into());
        assert!(ws.refresh_binding(&catalog, &cache));
        assert!(!ws.refresh_binding(&catalog, &cache));

        let binding = ws.presentation().heatmap(&"x".into()).unwrap();
        assert_eq!(binding.leading_index, 1);
        assert_eq!(binding.z, array.slice2d(1).unwrap());
        assert_eq!(binding.z[[0, 0]], 16.0);
        assert!(ws.presentation().heatmap(&"y".into()).is_none());
    }
}
