//! Main application state machine
//!
//! Owns the workspace, the file catalog and the array cache, applies
//! controller actions to them and queues the backend requests the main
//! loop has to issue.

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{info, warn};
use std::time::{Duration, Instant};

use super::controller::{
    resolve_click, resolve_drag, resolve_drop, resolve_key, Action, DragTarget, FileChange, Focus,
    IndexChange, KeyContext, ScreenRegions, SplitResize,
};
use super::fetch::FetchRequest;

use crate::config::{clamp_sidebar_width, AppConfig, SIDEBAR_UNITS_PER_COLUMN};
use crate::data::{ArrayCache, FetchError, FileCatalog, FileDescriptor, LoadOutcome, LoadedArray};
use crate::export::export_heatmap;
use crate::mosaic::{contains_cell, split_direction_for, Direction, TileId};
use crate::palette::{is_known, Palette};
use crate::tiles::{MaximizeChange, Workspace};

/// Main application state
pub struct App {
    pub config: AppConfig,

    /// Layout tree and per-tile state
    pub workspace: Workspace,

    /// Backend listing and selection
    pub catalog: FileCatalog,

    /// Loaded arrays, filled by completed fetches
    pub cache: ArrayCache,

    /// Palette used by every heatmap
    pub palette: Palette,

    /// Whether the palette popover is open
    pub palette_open: bool,

    /// Whether heatmaps draw a color bar
    pub show_colorscale: bool,

    /// Sidebar width in abstract units
    pub sidebar_width: u16,

    /// Which list receives navigation keys
    pub focus: Focus,

    /// Whether to show help overlay
    pub show_help: bool,

    /// Animation frame counter (for spinners)
    pub frame: usize,

    /// Status message (bottom bar)
    pub status_message: Option<StatusMessage>,

    /// Regions laid out by the last draw, for mouse hit detection
    pub regions: ScreenRegions,

    /// Mouse drag in progress
    drag: Option<DragTarget>,

    /// Requests waiting to be spawned by the main loop
    pending: Vec<FetchRequest>,

    /// Whether the app should quit
    pub should_quit: bool,
}

/// Status message displayed at the bottom
#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub expires: Instant,
}

/// Status message severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut app = Self {
            workspace: Workspace::new(&config.tiles),
            catalog: FileCatalog::new(),
            cache: ArrayCache::new(),
            palette: Palette::named(&config.palette),
            palette_open: false,
            show_colorscale: config.show_colorscale,
            sidebar_width: config.sidebar_width,
            focus: Focus::default(),
            show_help: false,
            frame: 0,
            status_message: None,
            regions: ScreenRegions::default(),
            drag: None,
            pending: Vec::new(),
            should_quit: false,
            config,
        };
        if !is_known(&app.palette.name) {
            let text = format!("Unknown palette {}; using a neutral gradient", app.palette.name);
            app.set_status(text, StatusLevel::Warning);
        }
        app
    }

    /// Kick off the initial file listing
    pub fn start(&mut self) {
        self.refresh_files();
    }

    /// Requests queued since the last call
    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Sidebar width in terminal columns
    pub fn sidebar_columns(&self) -> u16 {
        self.sidebar_width / SIDEBAR_UNITS_PER_COLUMN
    }

    /// Handle tick events (animation, message expiry)
    pub fn on_tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);

        // Clear expired status messages
        if let Some(ref msg) = self.status_message {
            if Instant::now() > msg.expires {
                self.status_message = None;
            }
        }
        self.sync();
    }

    /// Handle key events
    pub fn on_key(&mut self, key: KeyEvent) {
        let ctx = KeyContext {
            focus: self.focus,
            active: self.workspace.effective_target(),
            palette_open: self.palette_open,
            help_open: self.show_help,
            mosaic_empty: self.workspace.mosaic().is_empty(),
            palette: &self.palette.name,
        };
        if let Some(action) = resolve_key(ctx, key) {
            self.apply(action);
        }
    }

    /// Handle mouse events
    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        let x = mouse.column;
        let y = mouse.row;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.palette_open {
                    if let Some(target) = self.regions.drag_target_at(x, y) {
                        self.drag = Some(target);
                        return;
                    }
                    if let Some(id) = self.regions.title_grab_at(x, y) {
                        self.drag = Some(DragTarget::Tile(id));
                    }
                }
                if let Some(action) = resolve_click(&self.regions, self.palette_open, x, y) {
                    self.apply(action);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let action = self
                    .drag
                    .as_ref()
                    .and_then(|target| resolve_drag(&self.regions, target, x, y));
                if let Some(action) = action {
                    self.apply(action);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(target) = self.drag.take() {
                    if let Some(action) = resolve_drop(&self.regions, &target, x, y) {
                        self.apply(action);
                    }
                }
            }
            MouseEventKind::ScrollUp if contains_cell(self.regions.sidebar, x, y) => {
                self.apply(Action::ChangeActiveIndex(IndexChange::Previous));
            }
            MouseEventKind::ScrollDown if contains_cell(self.regions.sidebar, x, y) => {
                self.apply(Action::ChangeActiveIndex(IndexChange::Next));
            }
            _ => {}
        }
    }

    /// Apply one resolved action, then bring fetches and bindings up to date
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SelectTile(id) => {
                self.workspace.select(id);
                self.focus = Focus::Mosaic;
            }
            Action::CycleTile { forward } => {
                self.workspace.cycle_active(forward);
            }
            Action::SplitTile(id) => {
                let direction = self.split_direction(&id);
                if let Some(new_id) = self.workspace.split(&id, direction) {
                    self.set_status(format!("Split tile {} into {}", id, new_id), StatusLevel::Info);
                }
            }
            Action::CreateTile => {
                if let Some(id) = self.workspace.create_tile() {
                    self.set_status(format!("Created tile {}", id), StatusLevel::Info);
                }
            }
            Action::RemoveTile(id) => {
                if self.workspace.remove(&id) {
                    self.set_status(format!("Removed tile {}", id), StatusLevel::Info);
                }
            }
            Action::ToggleMaximize(id) => match self.workspace.toggle_maximize(&id) {
                MaximizeChange::Rejected(other) => self.set_status(
                    format!("Tile {} is maximized; restore it first", other),
                    StatusLevel::Warning,
                ),
                MaximizeChange::Maximized | MaximizeChange::Restored | MaximizeChange::Missing => {}
            },
            Action::ToggleInfoPanel(id) => {
                self.workspace.presentation_mut().toggle_info_panel(&id);
            }
            Action::ChangeActiveFile(change) => {
                match change {
                    FileChange::Next => self.catalog.select_relative(true),
                    FileChange::Previous => self.catalog.select_relative(false),
                    FileChange::Named(name) => self.catalog.select_file(&name),
                };
            }
            Action::ChangeActiveIndex(change) => match change {
                IndexChange::Next => self.catalog.step_index(true),
                IndexChange::Previous => self.catalog.step_index(false),
                IndexChange::Set(index) => self.catalog.select_index(index),
            },
            Action::ChangePalette { name, close_menu } => {
                info!("Palette set to {}", name);
                self.palette = Palette::named(&name);
                if close_menu {
                    self.palette_open = false;
                }
            }
            Action::TogglePaletteMenu => {
                self.palette_open = !self.palette_open;
            }
            Action::DismissPaletteMenu => {
                self.palette_open = false;
            }
            Action::ToggleColorScale => {
                self.show_colorscale = !self.show_colorscale;
            }
            Action::ResizeSplit(SplitResize::To { path, ratio }) => {
                self.workspace.set_ratio(&path, ratio);
            }
            Action::ResizeSplit(SplitResize::Nudge(delta)) => {
                self.workspace.nudge_active_ratio(delta);
            }
            Action::ResizeSidebar(width) => {
                self.sidebar_width = clamp_sidebar_width(width);
            }
            Action::ResizeInfoPanel { tile, delta } => {
                let presentation = self.workspace.presentation_mut();
                let width = i32::from(presentation.get(&tile).info_panel_width);
                presentation.set_info_panel_width(&tile, width + delta);
            }
            Action::SwapTiles(a, b) => {
                if self.workspace.swap_tiles(&a, &b) {
                    self.set_status(format!("Swapped tiles {} and {}", a, b), StatusLevel::Info);
                }
            }
            Action::CycleFocus => {
                self.focus = self.focus.next();
            }
            Action::RefreshFiles => self.refresh_files(),
            Action::ExportHeatmap(id) => self.export(&id),
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
            }
            Action::Quit => {
                self.should_quit = true;
            }
        }
        // regions of tiles that left the layout must not catch clicks before the next draw
        let mosaic = self.workspace.mosaic();
        self.regions.tiles.retain(|id| mosaic.contains(id));
        self.sync();
    }

    /// A `list-numpy-files` request finished
    pub fn on_files_listed(&mut self, generation: u64, result: Result<Vec<FileDescriptor>, FetchError>) {
        if self.catalog.complete_refresh(generation, result) {
            let count = self.catalog.files().len();
            self.set_status(format!("Listed {} array files", count), StatusLevel::Success);
        }
        self.sync();
    }

    /// A `load-numpy-file` request finished
    pub fn on_array_loaded(
        &mut self,
        generation: u64,
        filename: &str,
        result: Result<LoadedArray, FetchError>,
    ) {
        match self
            .catalog
            .complete_load(&mut self.cache, generation, filename, result)
        {
            LoadOutcome::Failed(err) => {
                self.set_status(format!("Could not load {}: {}", filename, err), StatusLevel::Warning);
            }
            LoadOutcome::Committed | LoadOutcome::AlreadyCached | LoadOutcome::Superseded => {}
        }
        self.sync();
    }

    fn refresh_files(&mut self) {
        let request = self.catalog.begin_refresh();
        self.pending.push(FetchRequest::List(request));
    }

    /// Queue the load the selection needs and rebind the active tile
    fn sync(&mut self) {
        if let Some(request) = self.catalog.poll_load(&self.cache) {
            self.pending.push(FetchRequest::Load(request));
        }
        self.workspace.refresh_binding(&self.catalog, &self.cache);
    }

    /// Direction a split of `id` takes, from its on-screen shape
    fn split_direction(&self, id: &TileId) -> Direction {
        let area = self
            .regions
            .tiles
            .lookup(id)
            .map(|regions| regions.frame)
            .or_else(|| self.regions.geometry.rect_of(id))
            .unwrap_or(self.regions.mosaic);
        split_direction_for(area)
    }

    fn export(&mut self, id: &TileId) {
        let Some(binding) = self.workspace.presentation().heatmap(id) else {
            self.set_status(format!("Tile {} has no heatmap to export", id), StatusLevel::Warning);
            return;
        };
        match export_heatmap(binding, &self.palette, self.show_colorscale, &self.config.export_dir) {
            Ok(path) => {
                self.set_status(format!("Exported {}", path.display()), StatusLevel::Success);
            }
            Err(err) => {
                warn!("Export of tile {} failed: {}", id, err);
                self.set_status(format!("Export failed: {}", err), StatusLevel::Error);
            }
        }
    }

    /// Set a status message
    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            level,
            expires: Instant::now() + Duration::from_secs(5),
        });
    }

    /// Get spinner character for current frame
    pub fn spinner(&self) -> char {
        const SPINNER: &[char] = &['|', '/', '-', '\\'];
        SPINNER[self.frame % SPINNER.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SIDEBAR_MAX_WIDTH, SIDEBAR_MIN_WIDTH};
    use crate::data::LoadRequest;
    use crate::mosaic::MosaicGeometry;
    use crate::tiles::{TileRegions, TileRegistry};
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::layout::Rect;
    use serde_json::json;

    fn listing() -> Vec<FileDescriptor> {
        vec![
            FileDescriptor {
                filename: "a.npy".into(),
                shape: vec![3, 2, 2],
                size_mb: None,
            },
            FileDescriptor {
                filename: "b.npy".into(),
                shape: vec![2, 2],
                size_mb: Some(0.1),
            },
        ]
    }

    fn cube() -> LoadedArray {
        let data = json!([[[0, 1], [2, 3]], [[4, 5], [6, 7]], [[8, 9], [10, 11]]]);
        LoadedArray::from_nested("a.npy", &data, vec![3, 2, 2], 0.0, 11.0).unwrap()
    }

    fn lay_out(app: &mut App, area: Rect) {
        let geometry = MosaicGeometry::compute(app.workspace.mosaic(), area);
        let mut tiles = TileRegistry::new();
        for (id, rect) in &geometry.leaves {
            tiles.register(id.clone(), TileRegions::for_frame(*rect));
        }
        app.regions.mosaic = area;
        app.regions.geometry = geometry;
        app.regions.tiles = tiles;
    }

    /// Start the app and answer the listing, returning the queued load
    fn started() -> (App, LoadRequest) {
        let mut app = App::new(AppConfig::default());
        app.start();
        let fetches = app.take_fetches();
        let generation = match fetches.as_slice() {
            [FetchRequest::List(req)] => req.generation,
            other => panic!("unexpected fetches {:?}", other),
        };
        app.on_files_listed(generation, Ok(listing()));
        let load = match app.take_fetches().as_slice() {
            [FetchRequest::Load(req)] => req.clone(),
            other => panic!("unexpected fetches {:?}", other),
        };
        (app, load)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_loaded_slice_binds_to_selected_tile() {
        let (mut app, load) = started();
        assert_eq!(load.filename, "a.npy");
        app.on_array_loaded(load.generation, "a.npy", Ok(cube()));
        assert!(app.take_fetches().is_empty());

        app.apply(Action::SelectTile("c".into()));
        app.apply(Action::ChangeActiveIndex(IndexChange::Set(2)));
        let binding = app.workspace.presentation().heatmap(&"c".into()).unwrap();
        assert_eq!(binding.leading_index, 2);
        assert_eq!(binding.z[[1, 1]], 11.0);
        assert!(app.workspace.presentation().heatmap(&"a".into()).is_none());
    }

    #[test]
    fn test_failed_load_reports_and_keeps_cache_empty() {
        let (mut app, load) = started();
        app.on_array_loaded(
            load.generation,
            "a.npy",
            Err(FetchError::ServerReported("File a.npy not found".into())),
        );
        assert!(app.cache.is_empty());
        assert_eq!(app.status_message.as_ref().map(|m| m.level), Some(StatusLevel::Warning));
        // no automatic retry until the file is selected again
        app.on_tick();
        assert!(app.take_fetches().is_empty());
        app.apply(Action::ChangeActiveFile(FileChange::Named("a.npy".into())));
        assert_eq!(app.take_fetches().len(), 1);
    }

    #[test]
    fn test_superseded_load_is_dropped() {
        let (mut app, load) = started();
        app.apply(Action::ChangeActiveFile(FileChange::Next));
        assert_eq!(app.catalog.selected_filename(), Some("b.npy"));
        app.on_array_loaded(load.generation, "a.npy", Ok(cube()));
        assert!(!app.cache.has("a.npy"));
        assert_eq!(app.take_fetches().len(), 1);
    }

    #[test]
    fn test_split_direction_follows_tile_shape() {
        let mut app = App::new(AppConfig::default());
        lay_out(&mut app, Rect::new(0, 0, 120, 30));
        // 60x15 quadrants are wide
        app.apply(Action::SplitTile("a".into()));
        let path = app.workspace.mosaic().find_path(&"new-1".into()).unwrap();
        assert_eq!(path, vec![crate::mosaic::Branch::First, crate::mosaic::Branch::First, crate::mosaic::Branch::Second]);

        lay_out(&mut app, Rect::new(0, 0, 40, 60));
        app.apply(Action::SplitTile("d".into()));
        let parent = app.workspace.mosaic().find_path(&"d".into()).unwrap();
        let node = app.workspace.mosaic().node_at(&parent[..parent.len() - 1]).unwrap();
        assert!(matches!(
            node,
            crate::mosaic::MosaicNode::Split {
                direction: Direction::Column,
                ..
            }
        ));
    }

    #[test]
    fn test_keyboard_flow() {
        let mut app = App::new(AppConfig::default());
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.workspace.mosaic().leaf_count(), 4);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.workspace.active(), Some(&TileId::from("a")));
        press(&mut app, KeyCode::Char('i'));
        assert!(!app.workspace.presentation().get(&"a".into()).info_panel_shown());
        press(&mut app, KeyCode::Char('m'));
        assert!(app.workspace.maximize_state().is_maximized(&"a".into()));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.workspace.mosaic().leaf_count(), 3);
        assert!(app.workspace.active().is_none());
        press(&mut app, KeyCode::Char('p'));
        assert!(app.palette_open);
        press(&mut app, KeyCode::Esc);
        assert!(!app.palette_open);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_mouse_drag_resizes_sidebar_and_split() {
        let mut app = App::new(AppConfig::default());
        app.regions.sidebar = Rect::new(0, 0, 32, 40);
        app.regions.sidebar_handle = Rect::new(31, 0, 1, 40);
        lay_out(&mut app, Rect::new(32, 0, 100, 40));

        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 31, 5));
        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 2, 5));
        assert_eq!(app.sidebar_width, SIDEBAR_MIN_WIDTH);
        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 200, 5));
        assert_eq!(app.sidebar_width, SIDEBAR_MAX_WIDTH);
        app.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 200, 5));

        // root splitter sits on the last column of the left half
        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 81, 5));
        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 56, 5));
        assert_eq!(app.workspace.mosaic().ratio_at(&[]), Some(25.0));
        app.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 56, 5));
        assert!(app.drag.is_none());
    }

    #[test]
    fn test_title_drag_swaps_tiles() {
        let mut app = App::new(AppConfig::default());
        lay_out(&mut app, Rect::new(0, 0, 80, 40));
        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 0));
        assert_eq!(app.workspace.active(), Some(&TileId::from("a")));
        app.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 30));
        assert_eq!(
            app.workspace.mosaic().leaves(),
            ["d", "b", "c", "a"].map(TileId::from).to_vec()
        );
    }

    #[test]
    fn test_removed_tile_stops_catching_clicks() {
        let mut app = App::new(AppConfig::default());
        lay_out(&mut app, Rect::new(0, 0, 80, 40));
        app.apply(Action::RemoveTile("a".into()));
        assert!(app.regions.tiles.lookup(&"a".into()).is_none());
        assert_eq!(app.regions.tiles.len(), 3);
        assert!(app.regions.title_grab_at(5, 0).is_none());
    }

    #[test]
    fn test_unknown_palette_warns() {
        let app = App::new(AppConfig {
            palette: "NotAPalette".into(),
            ..AppConfig::default()
        });
        let status = app.status_message.unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.text.contains("NotAPalette"));
        assert!(App::new(AppConfig::default()).status_message.is_none());
    }

    #[test]
    fn test_maximize_guard_sets_warning() {
        let mut app = App::new(AppConfig::default());
        app.apply(Action::ToggleMaximize("a".into()));
        app.apply(Action::ToggleMaximize("b".into()));
        assert!(app.workspace.maximize_state().is_maximized(&"a".into()));
        assert_eq!(app.status_message.as_ref().map(|m| m.level), Some(StatusLevel::Warning));
    }

    #[test]
    fn test_export_without_heatmap_warns() {
        let mut app = App::new(AppConfig::default());
        app.apply(Action::ExportHeatmap("a".into()));
        let status = app.status_message.unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.text.contains("no heatmap"));
    }
}
