// npy-mosaic/src/export.rs

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use plotly::common::{ColorScale, ColorScaleElement, Title};
use plotly::{HeatMap, Layout, Plot};
use serde_json::Value;
use thiserror::Error;

use crate::palette::Palette;
use crate::tiles::HeatmapBinding;

/// Build the plotly figure shown for a bound tile
pub fn make_heatmap_plot(
    binding: &HeatmapBinding,
    palette: &Palette,
    show_scale: bool,
) -> Result<Plot, ExportError> {
    let (rows, cols) = binding.dims();
    if rows == 0 || cols == 0 {
        return Err(ExportError::EmptyGrid(binding.title()));
    }
    // NaN cells serialize as null, which plotly leaves blank
    let z = binding
        .z
        .rows()
        .into_iter()
        .map(|row| Value::from(row.to_vec()))
        .collect::<Vec<Value>>();
    let scale = palette
        .positioned_stops()
        .into_iter()
        .map(|(at, color)| ColorScaleElement(at, color))
        .collect::<Vec<_>>();
    let mut trace = HeatMap::new_z(z)
        .color_scale(ColorScale::Vector(scale))
        .show_scale(show_scale);
    // every slice of a file shares the file's color range
    if let Some((min, max)) = binding.bounds() {
        trace = trace.zmin(Value::from(min)).zmax(Value::from(max));
    }
    let mut plot = Plot::new();
    plot.add_trace(trace);
    let title = match binding.bounds() {
        Some((min, max)) => format!("{} (min {:.4}, max {:.4})", binding.title(), min, max),
        None => binding.title(),
    };
    plot.set_layout(Layout::new().title(Title::new(&title)));
    Ok(plot)
}

/// File name an export of `binding` is written to
pub fn export_file_name(binding: &HeatmapBinding) -> String {
    let stem = Path::new(&binding.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("heatmap");
    let stem = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>();
    format!("{}_{}.html", stem, binding.leading_index)
}

/// Write the heatmap of `binding` as a standalone HTML page into `dir`
pub fn export_heatmap(
    binding: &HeatmapBinding,
    palette: &Palette,
    show_scale: bool,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    if !dir.is_dir() {
        return Err(ExportError::InvalidDirectory(dir.to_path_buf()));
    }
    let plot = make_heatmap_plot(binding, palette, show_scale)?;
    let path = dir.join(export_file_name(binding));
    fs::write(&path, plot.to_html())?;
    info!("Exported {} to {}", binding.title(), path.display());
    Ok(path)
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{0} has no cells to plot")]
    EmptyGrid(String),
    #[error("export directory {0:?} does not exist")]
    InvalidDirectory(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
