// npy-mosaic/src/mosaic/geometry.rs

use ratatui::layout::Rect;

use super::id::TileId;
use super::tree::{Branch, Direction, Mosaic, MosaicNode, MosaicPath};

/// Draggable boundary between the two children of a split
#[derive(Clone, Debug, PartialEq)]
pub struct Splitter {
    pub path: MosaicPath,
    pub direction: Direction,
    /// Area shared by both children
    pub area: Rect,
    /// One cell thick strip at the end of the first child
    pub handle: Rect,
}

impl Splitter {
    /// Ratio that puts the boundary under the given cell
    pub fn ratio_at(&self, column: u16, row: u16) -> Option<f64> {
        let (offset, extent) = match self.direction {
            Direction::Row => (column.checked_sub(self.area.x)?, self.area.width),
            Direction::Column => (row.checked_sub(self.area.y)?, self.area.height),
        };
        if extent == 0 {
            return None;
        }
        Some(f64::from(offset.saturating_add(1)) / f64::from(extent) * 100.0)
    }
}

/// Screen placement of a mosaic
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MosaicGeometry {
    pub leaves: Vec<(TileId, Rect)>,
    pub splitters: Vec<Splitter>,
}

impl MosaicGeometry {
    pub fn compute(mosaic: &Mosaic, area: Rect) -> Self {
        let mut geometry = Self::default();
        if let Some(root) = mosaic.root() {
            let mut path = Vec::new();
            geometry.place(root, area, &mut path);
        }
        geometry
    }

    fn place(&mut self, node: &MosaicNode, area: Rect, path: &mut MosaicPath) {
        match node {
            MosaicNode::Leaf(id) => self.leaves.push((id.clone(), area)),
            MosaicNode::Split {
                direction,
                first,
                second,
                split_ratio,
            } => {
                let (a, b) = split_rect(area, *direction, *split_ratio);
                if !is_empty(a) && !is_empty(b) {
                    let handle = match direction {
                        Direction::Row => Rect::new(a.x + a.width - 1, a.y, 1, a.height),
                        Direction::Column => Rect::new(a.x, a.y + a.height - 1, a.width, 1),
                    };
                    self.splitters.push(Splitter {
                        path: path.clone(),
                        direction: *direction,
                        area,
                        handle,
                    });
                }
                path.push(Branch::First);
                self.place(first, a, path);
                path.pop();
                path.push(Branch::Second);
                self.place(second, b, path);
                path.pop();
            }
        }
    }

    pub fn rect_of(&self, id: &TileId) -> Option<Rect> {
        self.leaves
            .iter()
            .find(|(leaf, _)| leaf == id)
            .map(|(_, rect)| *rect)
    }

    pub fn leaf_at(&self, column: u16, row: u16) -> Option<&TileId> {
        self.leaves
            .iter()
            .find(|(_, rect)| contains_cell(*rect, column, row))
            .map(|(id, _)| id)
    }

    /// Deepest splitter whose handle covers the cell
    pub fn splitter_at(&self, column: u16, row: u16) -> Option<&Splitter> {
        self.splitters
            .iter()
            .rev()
            .find(|s| contains_cell(s.handle, column, row))
    }

    /// The split that directly contains `id`, which `+`/`-` resize
    pub fn parent_splitter(&self, mosaic: &Mosaic, id: &TileId) -> Option<&Splitter> {
        let path = mosaic.find_path(id)?;
        let parent = path.split_last()?.1;
        self.splitters.iter().find(|s| s.path == parent)
    }
}

/// Divide `area` between two children, `ratio` percent to the first
pub fn split_rect(area: Rect, direction: Direction, ratio: f64) -> (Rect, Rect) {
    let share = |extent: u16| -> u16 {
        let cells = (f64::from(extent) * ratio / 100.0).round();
        cells.clamp(0.0, f64::from(extent)) as u16
    };
    match direction {
        Direction::Row => {
            let w = share(area.width);
            (
                Rect::new(area.x, area.y, w, area.height),
                Rect::new(area.x + w, area.y, area.width - w, area.height),
            )
        }
        Direction::Column => {
            let h = share(area.height);
            (
                Rect::new(area.x, area.y, area.width, h),
                Rect::new(area.x, area.y + h, area.width, area.height - h),
            )
        }
    }
}

/// Taller than wide splits stack, anything else goes side by side.
///
/// A terminal cell is about twice as tall as it is wide.
pub fn split_direction_for(area: Rect) -> Direction {
    if u32::from(area.height) * 2 > u32::from(area.width) {
        Direction::Column
    } else {
        Direction::Row
    }
}

pub fn contains_cell(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && row >= rect.y
        && u32::from(column) < u32::from(rect.x) + u32::from(rect.width)
        && u32::from(row) < u32::from(rect.y) + u32::from(rect.height)
}

fn is_empty(rect: Rect) -> bool {
    rect.width == 0 || rect.height == 0
}
