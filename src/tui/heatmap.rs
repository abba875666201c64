//! Half-block heatmap rendering
//!
//! Each terminal cell shows two grid samples: the upper one as the
//! foreground of `▀`, the lower one as the background. Row 0 of the grid is
//! drawn at the bottom, matching the exported plotly figure.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

use super::colors::palette_color;
use crate::palette::Palette;
use crate::tiles::HeatmapBinding;

const UPPER_HALF: &str = "▀";
/// Columns taken by the color bar: gap, bar, gap, labels
const COLORBAR_BAR: u16 = 2;
const COLORBAR_LABELS: u16 = 9;
const COLORBAR_WIDTH: u16 = 1 + COLORBAR_BAR + 1 + COLORBAR_LABELS;

pub struct HeatmapView<'a> {
    binding: &'a HeatmapBinding,
    palette: &'a Palette,
    show_scale: bool,
}

impl<'a> HeatmapView<'a> {
    pub fn new(binding: &'a HeatmapBinding, palette: &'a Palette) -> Self {
        Self {
            binding,
            palette,
            show_scale: true,
        }
    }

    pub fn show_scale(mut self, show_scale: bool) -> Self {
        self.show_scale = show_scale;
        self
    }

    /// Color bounds: the file's own, else the slice extent
    fn bounds(&self) -> Option<(f64, f64)> {
        self.binding.bounds().or_else(|| self.binding.slice_range())
    }

    fn normalize(value: f64, bounds: Option<(f64, f64)>) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let (lo, hi) = bounds?;
        if hi > lo {
            Some((value - lo) / (hi - lo))
        } else {
            Some(0.5)
        }
    }

    fn render_grid(&self, area: Rect, buf: &mut Buffer) {
        let (rows, cols) = self.binding.dims();
        if rows == 0 || cols == 0 || area.width == 0 || area.height == 0 {
            return;
        }
        let bounds = self.bounds();
        let sub_rows = usize::from(area.height) * 2;
        let sample = |sub_y: usize, x: usize| -> Color {
            // flip so grid row 0 lands on the bottom half-row
            let from_bottom = sub_rows - 1 - sub_y;
            let r = (from_bottom * rows / sub_rows).min(rows - 1);
            let c = (x * cols / usize::from(area.width)).min(cols - 1);
            match Self::normalize(self.binding.z[[r, c]], bounds) {
                Some(t) => palette_color(self.palette, t),
                None => Color::Reset,
            }
        };
        for y in 0..area.height {
            for x in 0..area.width {
                let upper = sample(usize::from(y) * 2, usize::from(x));
                let lower = sample(usize::from(y) * 2 + 1, usize::from(x));
                if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                    cell.set_symbol(UPPER_HALF).set_fg(upper).set_bg(lower);
                }
            }
        }
    }

    fn render_colorbar(&self, area: Rect, buf: &mut Buffer) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let bar_x = area.x + 1;
        let sub_rows = usize::from(area.height) * 2;
        let t_at = |sub_y: usize| -> f64 {
            if sub_rows <= 1 {
                0.5
            } else {
                1.0 - sub_y as f64 / (sub_rows - 1) as f64
            }
        };
        for y in 0..area.height {
            let upper = palette_color(self.palette, t_at(usize::from(y) * 2));
            let lower = palette_color(self.palette, t_at(usize::from(y) * 2 + 1));
            for dx in 0..COLORBAR_BAR {
                if let Some(cell) = buf.cell_mut((bar_x + dx, area.y + y)) {
                    cell.set_symbol(UPPER_HALF).set_fg(upper).set_bg(lower);
                }
            }
        }
        let label_x = bar_x + COLORBAR_BAR + 1;
        let style = Style::default().fg(Color::Gray);
        buf.set_stringn(label_x, area.y, format_bound(hi), usize::from(COLORBAR_LABELS), style);
        if area.height > 1 {
            buf.set_stringn(
                label_x,
                area.y + area.height - 1,
                format_bound(lo),
                usize::from(COLORBAR_LABELS),
                style,
            );
        }
    }
}

impl Widget for HeatmapView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.show_scale && area.width > COLORBAR_WIDTH * 2 {
            let grid = Rect::new(area.x, area.y, area.width - COLORBAR_WIDTH, area.height);
            let bar = Rect::new(
                area.x + area.width - COLORBAR_WIDTH,
                area.y,
                COLORBAR_WIDTH,
                area.height,
            );
            self.render_grid(grid, buf);
            self.render_colorbar(bar, buf);
        } else {
            self.render_grid(area, buf);
        }
    }
}

/// Short label for a color bar bound
pub fn format_bound(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude >= 1e5 || magnitude < 1e-3) {
        format!("{:.2e}", value)
    } else {
        format!("{:.3}", value)
    }
}
