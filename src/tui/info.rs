//! Per-tile info panel contents

use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};

use super::heatmap::format_bound;
use crate::mosaic::TileId;
use crate::tiles::TilePresentation;

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<7}", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

/// Lines describing `id` and whatever it is bound to
pub fn info_lines(id: &TileId, presentation: &TilePresentation) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::raw("Info").bold()),
        field("tile", id.to_string()),
    ];
    match &presentation.heatmap {
        Some(binding) => {
            let (rows, cols) = binding.dims();
            lines.push(field("file", binding.filename.clone()));
            lines.push(field("index", binding.leading_index.to_string()));
            lines.push(field("grid", format!("{}x{}", rows, cols)));
            lines.push(field("min", format_bound(binding.min)));
            lines.push(field("max", format_bound(binding.max)));
        }
        None => lines.push(field("file", "-".to_string())),
    }
    lines.push(field(
        "width",
        presentation.info_panel_width.to_string(),
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::HeatmapBinding;
    use ndarray::Array2;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_unbound_tile_shows_placeholder() {
        let lines = info_lines(&"a".into(), &TilePresentation::default());
        assert_eq!(text(&lines[1]).trim_end(), "tile   a");
        assert_eq!(text(&lines[2]).trim_end(), "file   -");
        assert_eq!(text(&lines[3]), "width  200");
    }

    #[test]
    fn test_bound_tile_lists_slice() {
        let presentation = TilePresentation {
            heatmap: Some(HeatmapBinding {
                z: Array2::zeros((4, 5)),
                filename: "a.npy".into(),
                leading_index: 2,
                min: 0.0,
                max: 47.0,
            }),
            ..TilePresentation::default()
        };
        let lines: Vec<String> = info_lines(&"c".into(), &presentation)
            .iter()
            .map(text)
            .collect();
        assert!(lines.contains(&"file   a.npy".to_string()));
        assert!(lines.contains(&"index  2".to_string()));
        assert!(lines.contains(&"grid   4x5".to_string()));
    }
}
