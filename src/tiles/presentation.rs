// npy-mosaic/src/tiles/presentation.rs

use std::collections::HashMap;

use log::debug;

use super::binding::HeatmapBinding;
use crate::mosaic::{Mosaic, TileId};

pub const INFO_PANEL_MIN_WIDTH: u16 = 100;
pub const INFO_PANEL_MAX_WIDTH: u16 = 400;
pub const INFO_PANEL_DEFAULT_WIDTH: u16 = 200;
/// Width units per terminal column
pub const INFO_PANEL_UNITS_PER_COLUMN: u16 = 10;

/// What a tile shows besides its layout position
#[derive(Clone, Debug, PartialEq)]
pub struct TilePresentation {
    pub text_fallback: String,
    /// `None` until first toggled; treated as visible
    pub info_panel_visible: Option<bool>,
    pub info_panel_width: u16,
    pub heatmap: Option<HeatmapBinding>,
}

impl Default for TilePresentation {
    fn default() -> Self {
        Self {
            text_fallback: String::new(),
            info_panel_visible: None,
            info_panel_width: INFO_PANEL_DEFAULT_WIDTH,
            heatmap: None,
        }
    }
}

impl TilePresentation {
    pub fn info_panel_shown(&self) -> bool {
        self.info_panel_visible.unwrap_or(true)
    }

    /// Info panel width in terminal columns
    pub fn info_panel_columns(&self) -> u16 {
        self.info_panel_width / INFO_PANEL_UNITS_PER_COLUMN
    }

    /// Text shown when no heatmap is bound
    pub fn display_text(&self, id: &TileId) -> String {
        if self.text_fallback.trim().is_empty() {
            format!("Content for tile {}", id)
        } else {
            self.text_fallback.clone()
        }
    }
}

pub fn clamp_info_panel_width(width: i32) -> u16 {
    width.clamp(
        i32::from(INFO_PANEL_MIN_WIDTH),
        i32::from(INFO_PANEL_MAX_WIDTH),
    ) as u16
}

/// Per-tile presentation plus the one-slot pre-maximize layout memory
#[derive(Debug, Default)]
pub struct PresentationStore {
    tiles: HashMap<TileId, TilePresentation>,
    snapshots: HashMap<TileId, Mosaic>,
}

impl PresentationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation of `id`, or the defaults when nothing was set yet
    pub fn get(&self, id: &TileId) -> TilePresentation {
        self.tiles.get(id).cloned().unwrap_or_default()
    }

    /// Borrow the stored presentation of `id` without cloning its heatmap
    pub fn lookup(&self, id: &TileId) -> Option<&TilePresentation> {
        self.tiles.get(id)
    }

    pub fn heatmap(&self, id: &TileId) -> Option<&HeatmapBinding> {
        self.tiles.get(id).and_then(|t| t.heatmap.as_ref())
    }

    fn entry(&mut self, id: &TileId) -> &mut TilePresentation {
        self.tiles.entry(id.clone()).or_default()
    }

    /// Bind a heatmap, replacing any previous binding and clearing the text
    pub fn assign_heatmap(&mut self, id: &TileId, binding: HeatmapBinding) {
        let tile = self.entry(id);
        tile.heatmap = Some(binding);
        tile.text_fallback.clear();
    }

    /// Show text instead of a heatmap
    pub fn set_text(&mut self, id: &TileId, text: impl Into<String>) {
        let tile = self.entry(id);
        tile.text_fallback = text.into();
        tile.heatmap = None;
    }

    /// Flip info panel visibility. Returns the new visibility.
    pub fn toggle_info_panel(&mut self, id: &TileId) -> bool {
        let tile = self.entry(id);
        let visible = !tile.info_panel_shown();
        tile.info_panel_visible = Some(visible);
        visible
    }

    /// Set the info panel width, clamped into the allowed range. Returns the stored width.
    pub fn set_info_panel_width(&mut self, id: &TileId, width: i32) -> u16 {
        let width = clamp_info_panel_width(width);
        self.entry(id).info_panel_width = width;
        width
    }

    /// Keep a copy of `layout` for `id`, replacing any earlier one
    pub fn remember_layout(&mut self, id: &TileId, layout: &Mosaic) {
        self.snapshots.insert(id.clone(), layout.clone());
    }

    /// Take the remembered layout of `id`
    pub fn restore_layout(&mut self, id: &TileId) -> Option<Mosaic> {
        self.snapshots.remove(id)
    }

    pub fn has_snapshot(&self, id: &TileId) -> bool {
        self.snapshots.contains_key(id)
    }

    /// Drop `removed` from every remembered layout so restoring cannot revive it
    pub fn prune_snapshots(&mut self, removed: &TileId) {
        for snapshot in self.snapshots.values_mut() {
            if snapshot.contains(removed) {
                *snapshot = snapshot.remove(removed);
            }
        }
    }

    /// Forget everything kept for a removed tile
    pub fn reclaim(&mut self, id: &TileId) {
        let had_tile = self.tiles.remove(id).is_some();
        let had_snapshot = self.snapshots.remove(id).is_some();
        if had_tile || had_snapshot {
            debug!("Reclaimed state of tile {}", id);
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
