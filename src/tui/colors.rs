//! Terminal colors for palettes
//!
//! Palettes are sampled in RGB; the terminal is assumed to support
//! truecolor, as the rest of the UI does.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::palette::{Palette, Rgb};

/// Frame border of the active tile and focused panels
pub const ACCENT: Color = Color::Cyan;
/// Frame border of everything else
pub const MUTED: Color = Color::DarkGray;

pub fn rgb_color((r, g, b): Rgb) -> Color {
    Color::Rgb(r, g, b)
}

/// Color at `t` in `[0, 1]` along `palette`
pub fn palette_color(palette: &Palette, t: f64) -> Color {
    rgb_color(palette.sample(t))
}

/// A horizontal gradient strip `width` cells wide
pub fn swatch(palette: &Palette, width: u16) -> Vec<Span<'static>> {
    let steps = width.max(1);
    (0..steps)
        .map(|i| {
            let t = if steps == 1 {
                0.0
            } else {
                f64::from(i) / f64::from(steps - 1)
            };
            Span::styled(" ", Style::default().bg(palette_color(palette, t)))
        })
        .collect()
}
