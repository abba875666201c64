//! Interaction resolution
//!
//! Turns raw key and pointer events into a single [`Action`]. Pointer hits
//! are resolved against the regions the renderer registered for each tile,
//! so every tile action carries the id of the tile that was hit.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::config::SIDEBAR_UNITS_PER_COLUMN;
use crate::mosaic::{contains_cell, MosaicGeometry, MosaicPath, Splitter, TileId};
use crate::tiles::{TileRegistry, TitleButton};

/// Info panel width change per `[` / `]` press, in width units
pub const INFO_PANEL_STEP: i32 = 20;
/// Split ratio change per `+` / `-` press, in percent
pub const SPLIT_STEP: f64 = 5.0;

/// Which sidebar list (or the mosaic) receives list navigation keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Mosaic,
    Files,
    Indices,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Mosaic => Focus::Files,
            Focus::Files => Focus::Indices,
            Focus::Indices => Focus::Mosaic,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FileChange {
    Next,
    Previous,
    Named(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexChange {
    Next,
    Previous,
    Set(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SplitResize {
    /// Drag a splitter to an absolute ratio
    To { path: MosaicPath, ratio: f64 },
    /// Grow the active tile by this many percent
    Nudge(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SelectTile(TileId),
    CycleTile { forward: bool },
    SplitTile(TileId),
    /// Add a first tile to an empty mosaic
    CreateTile,
    RemoveTile(TileId),
    ToggleMaximize(TileId),
    ToggleInfoPanel(TileId),
    ChangeActiveFile(FileChange),
    ChangeActiveIndex(IndexChange),
    ChangePalette { name: String, close_menu: bool },
    TogglePaletteMenu,
    DismissPaletteMenu,
    ToggleColorScale,
    ResizeSplit(SplitResize),
    ResizeSidebar(i32),
    ResizeInfoPanel { tile: TileId, delta: i32 },
    /// Drop one tile's title bar onto another tile
    SwapTiles(TileId, TileId),
    CycleFocus,
    RefreshFiles,
    ExportHeatmap(TileId),
    ToggleHelp,
    Quit,
}

/// Something being dragged with the mouse
#[derive(Clone, Debug, PartialEq)]
pub enum DragTarget {
    Splitter(Splitter),
    Sidebar,
    /// A tile picked up by its title bar
    Tile(TileId),
}

/// Everything the renderer laid out during the last frame
#[derive(Debug, Default)]
pub struct ScreenRegions {
    pub mosaic: Rect,
    pub geometry: MosaicGeometry,
    pub tiles: TileRegistry,
    pub palette_button: Rect,
    pub colorscale_button: Rect,
    pub palette_menu: Option<Rect>,
    pub palette_items: Vec<(String, Rect)>,
    pub sidebar: Rect,
    /// Right border of the sidebar
    pub sidebar_handle: Rect,
    pub file_items: Vec<(String, Rect)>,
    pub index_items: Vec<(usize, Rect)>,
}

impl ScreenRegions {
    /// Splitter or sidebar border under the pointer
    pub fn drag_target_at(&self, column: u16, row: u16) -> Option<DragTarget> {
        if contains_cell(self.sidebar_handle, column, row) {
            return Some(DragTarget::Sidebar);
        }
        self.geometry
            .splitter_at(column, row)
            .cloned()
            .map(DragTarget::Splitter)
    }

    /// Tile whose title bar (outside its buttons) is under the pointer
    pub fn title_grab_at(&self, column: u16, row: u16) -> Option<TileId> {
        self.tiles
            .iter()
            .find(|(_, regions)| {
                contains_cell(regions.title, column, row)
                    && !regions
                        .buttons
                        .iter()
                        .any(|(_, rect)| contains_cell(*rect, column, row))
            })
            .map(|(id, _)| id.clone())
    }

    /// Tile whose title bar or body contains the pointer
    fn tile_hit(&self, column: u16, row: u16) -> Option<Action> {
        for (id, regions) in self.tiles.iter() {
            if contains_cell(regions.title, column, row) {
                let button = regions
                    .buttons
                    .iter()
                    .find(|(_, rect)| contains_cell(*rect, column, row))
                    .map(|(button, _)| *button);
                return Some(match button {
                    Some(TitleButton::Remove) => Action::RemoveTile(id.clone()),
                    Some(TitleButton::Split) => Action::SplitTile(id.clone()),
                    Some(TitleButton::Maximize) => Action::ToggleMaximize(id.clone()),
                    Some(TitleButton::Info) => Action::ToggleInfoPanel(id.clone()),
                    None => Action::SelectTile(id.clone()),
                });
            }
            if contains_cell(regions.frame, column, row) {
                return Some(Action::SelectTile(id.clone()));
            }
        }
        None
    }
}

/// Resolve a left-button press that did not start a drag
pub fn resolve_click(
    regions: &ScreenRegions,
    palette_open: bool,
    column: u16,
    row: u16,
) -> Option<Action> {
    if palette_open {
        if let Some((name, _)) = regions
            .palette_items
            .iter()
            .find(|(_, rect)| contains_cell(*rect, column, row))
        {
            return Some(Action::ChangePalette {
                name: name.clone(),
                close_menu: true,
            });
        }
        if regions
            .palette_menu
            .map_or(false, |menu| contains_cell(menu, column, row))
        {
            return None;
        }
        if contains_cell(regions.palette_button, column, row) {
            return Some(Action::TogglePaletteMenu);
        }
        return Some(Action::DismissPaletteMenu);
    }
    if contains_cell(regions.palette_button, column, row) {
        return Some(Action::TogglePaletteMenu);
    }
    if contains_cell(regions.colorscale_button, column, row) {
        return Some(Action::ToggleColorScale);
    }
    if let Some((name, _)) = regions
        .file_items
        .iter()
        .find(|(_, rect)| contains_cell(*rect, column, row))
    {
        return Some(Action::ChangeActiveFile(FileChange::Named(name.clone())));
    }
    if let Some((index, _)) = regions
        .index_items
        .iter()
        .find(|(_, rect)| contains_cell(*rect, column, row))
    {
        return Some(Action::ChangeActiveIndex(IndexChange::Set(*index)));
    }
    if let Some(action) = regions.tile_hit(column, row) {
        return Some(action);
    }
    if regions.tiles.is_empty() && contains_cell(regions.mosaic, column, row) {
        return Some(Action::CreateTile);
    }
    None
}

/// Resolve pointer movement while `target` is held
pub fn resolve_drag(regions: &ScreenRegions, target: &DragTarget, column: u16, row: u16) -> Option<Action> {
    match target {
        DragTarget::Splitter(splitter) => {
            let ratio = splitter.ratio_at(column, row)?;
            Some(Action::ResizeSplit(SplitResize::To {
                path: splitter.path.clone(),
                ratio,
            }))
        }
        DragTarget::Tile(_) => None,
        DragTarget::Sidebar => {
            let columns = i32::from(column) - i32::from(regions.sidebar.x) + 1;
            Some(Action::ResizeSidebar(columns * i32::from(SIDEBAR_UNITS_PER_COLUMN)))
        }
    }
}

/// Resolve the button release that ends a drag
pub fn resolve_drop(regions: &ScreenRegions, target: &DragTarget, column: u16, row: u16) -> Option<Action> {
    match target {
        DragTarget::Tile(source) => {
            let dest = regions.geometry.leaf_at(column, row)?;
            if dest == source {
                return None;
            }
            Some(Action::SwapTiles(source.clone(), dest.clone()))
        }
        DragTarget::Splitter(_) | DragTarget::Sidebar => None,
    }
}

/// Key state the resolution depends on
#[derive(Clone, Copy, Debug)]
pub struct KeyContext<'a> {
    pub focus: Focus,
    pub active: Option<&'a TileId>,
    pub palette_open: bool,
    pub help_open: bool,
    pub mosaic_empty: bool,
    pub palette: &'a str,
}

/// Resolve a key press
pub fn resolve_key(ctx: KeyContext<'_>, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if ctx.palette_open {
        return resolve_palette_key(ctx.palette, key);
    }
    if ctx.help_open && key.code == KeyCode::Esc {
        return Some(Action::ToggleHelp);
    }
    let tile = |make: fn(TileId) -> Action| ctx.active.cloned().map(make);
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::ToggleHelp),
        KeyCode::Tab => Some(Action::CycleFocus),
        KeyCode::Char('r') => Some(Action::RefreshFiles),
        KeyCode::Char('p') => Some(Action::TogglePaletteMenu),
        KeyCode::Char('c') => Some(Action::ToggleColorScale),
        KeyCode::Char('n') => Some(Action::ChangeActiveFile(FileChange::Next)),
        KeyCode::Char('N') => Some(Action::ChangeActiveFile(FileChange::Previous)),
        KeyCode::Char('s') if ctx.mosaic_empty => Some(Action::CreateTile),
        KeyCode::Char('s') => tile(Action::SplitTile),
        KeyCode::Char('x') => tile(Action::RemoveTile),
        KeyCode::Char('m') => tile(Action::ToggleMaximize),
        KeyCode::Char('i') => tile(Action::ToggleInfoPanel),
        KeyCode::Char('e') => tile(Action::ExportHeatmap),
        KeyCode::Char('[') => ctx.active.map(|id| Action::ResizeInfoPanel {
            tile: id.clone(),
            delta: -INFO_PANEL_STEP,
        }),
        KeyCode::Char(']') => ctx.active.map(|id| Action::ResizeInfoPanel {
            tile: id.clone(),
            delta: INFO_PANEL_STEP,
        }),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(Action::ResizeSplit(SplitResize::Nudge(SPLIT_STEP)))
        }
        KeyCode::Char('-') => Some(Action::ResizeSplit(SplitResize::Nudge(-SPLIT_STEP))),
        code => resolve_navigation(ctx.focus, code),
    }
}

fn resolve_navigation(focus: Focus, code: KeyCode) -> Option<Action> {
    let forward = match code {
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => true,
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('h') => false,
        _ => return None,
    };
    Some(match focus {
        Focus::Mosaic => Action::CycleTile { forward },
        Focus::Files if forward => Action::ChangeActiveFile(FileChange::Next),
        Focus::Files => Action::ChangeActiveFile(FileChange::Previous),
        Focus::Indices if forward => Action::ChangeActiveIndex(IndexChange::Next),
        Focus::Indices => Action::ChangeActiveIndex(IndexChange::Previous),
    })
}

/// While the palette menu is open, arrows preview neighbouring palettes
fn resolve_palette_key(current: &str, key: KeyEvent) -> Option<Action> {
    let names = crate::palette::all_names();
    let position = names.iter().position(|n| *n == current);
    let step = |forward: bool| -> Option<Action> {
        let next = match position {
            Some(i) if forward => (i + 1) % names.len(),
            Some(i) => (i + names.len() - 1) % names.len(),
            None => 0,
        };
        Some(Action::ChangePalette {
            name: names[next].to_string(),
            close_menu: false,
        })
    };
    match key.code {
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('q') => Some(Action::DismissPaletteMenu),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::TogglePaletteMenu),
        KeyCode::Down | KeyCode::Char('j') => step(true),
        KeyCode::Up | KeyCode::Char('k') => step(false),
        _ => None,
    }
}
