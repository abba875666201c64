// npy-mosaic/src/tiles/registry.rs

use std::collections::HashMap;

use ratatui::layout::Rect;

use crate::mosaic::TileId;

/// Per-tile handles owned by the renderer and looked up by the controller
#[derive(Debug)]
pub struct ResourceRegistry<H> {
    handles: HashMap<TileId, H>,
}

impl<H> Default for ResourceRegistry<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<H> ResourceRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` for `id`, returning the one it replaces
    pub fn register(&mut self, id: TileId, handle: H) -> Option<H> {
        self.handles.insert(id, handle)
    }

    pub fn lookup(&self, id: &TileId) -> Option<&H> {
        self.handles.get(id)
    }

    /// Drop every handle whose tile fails `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&TileId) -> bool) {
        self.handles.retain(|id, _| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TileId, &H)> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Buttons drawn in a tile's title bar, right to left
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitleButton {
    Remove,
    Split,
    Maximize,
    Info,
}

impl TitleButton {
    pub const ALL: [TitleButton; 4] = [
        TitleButton::Remove,
        TitleButton::Split,
        TitleButton::Maximize,
        TitleButton::Info,
    ];

    /// Glyph shown in the title bar; `maximized` swaps the maximize glyph for restore
    pub fn label(self, maximized: bool) -> &'static str {
        match self {
            TitleButton::Remove => "[x]",
            TitleButton::Split => "[s]",
            TitleButton::Maximize if maximized => "[-]",
            TitleButton::Maximize => "[+]",
            TitleButton::Info => "[i]",
        }
    }
}

/// Screen regions of one rendered tile
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileRegions {
    /// Whole tile including its border
    pub frame: Rect,
    /// Top border row carrying the title and buttons
    pub title: Rect,
    pub buttons: Vec<(TitleButton, Rect)>,
    /// Inside of the border
    pub content: Rect,
}

impl TileRegions {
    /// Lay out the title bar and buttons of a tile drawn in `frame`
    pub fn for_frame(frame: Rect) -> Self {
        let title = Rect::new(frame.x, frame.y, frame.width, frame.height.min(1));
        let content = Rect::new(
            frame.x.saturating_add(1),
            frame.y.saturating_add(1),
            frame.width.saturating_sub(2),
            frame.height.saturating_sub(2),
        );
        let mut buttons = Vec::new();
        // leave the corner cell to the border
        let mut right = frame.x.saturating_add(frame.width.saturating_sub(1));
        for button in TitleButton::ALL {
            let width = button.label(false).len() as u16;
            if right < frame.x.saturating_add(width).saturating_add(1) {
                break;
            }
            right -= width;
            buttons.push((button, Rect::new(right, frame.y, width, 1)));
        }
        Self {
            frame,
            title,
            buttons,
            content,
        }
    }
}

/// Rendered regions of every visible tile
pub type TileRegistry = ResourceRegistry<TileRegions>;
