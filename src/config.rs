// npy-mosaic/src/config.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::data::DEFAULT_BACKEND_URL;
use crate::mosaic::{TileId, MINTED_PREFIX};
use crate::palette::DEFAULT_PALETTE;

pub const DEFAULT_TILES: [&str; 4] = ["a", "b", "c", "d"];
pub const SIDEBAR_MIN_WIDTH: u16 = 160;
pub const SIDEBAR_MAX_WIDTH: u16 = 600;
pub const SIDEBAR_DEFAULT_WIDTH: u16 = 260;
/// Sidebar width units per terminal column
pub const SIDEBAR_UNITS_PER_COLUMN: u16 = 8;
pub const DEFAULT_TICK_RATE_MS: u64 = 100;

pub fn clamp_sidebar_width(width: i32) -> u16 {
    width.clamp(i32::from(SIDEBAR_MIN_WIDTH), i32::from(SIDEBAR_MAX_WIDTH)) as u16
}

/// Everything the shell needs to start
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub backend_url: String,
    pub timeout: Option<Duration>,
    pub tiles: Vec<TileId>,
    pub palette: String,
    pub show_colorscale: bool,
    pub sidebar_width: u16,
    pub export_dir: PathBuf,
    pub tick_rate: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout: None,
            tiles: DEFAULT_TILES.iter().map(|t| TileId::from(*t)).collect(),
            palette: DEFAULT_PALETTE.to_string(),
            show_colorscale: true,
            sidebar_width: SIDEBAR_DEFAULT_WIDTH,
            export_dir: PathBuf::from("."),
            tick_rate: Duration::from_millis(DEFAULT_TICK_RATE_MS),
        }
    }
}

#[derive(Default)]
pub struct AppConfigBuilder<'a> {
    backend_url: Option<&'a str>,
    timeout_secs: Option<&'a u64>,
    tiles: Option<&'a [String]>,
    palette: Option<&'a str>,
    hide_colorscale: Option<&'a bool>,
    sidebar_width: Option<&'a u16>,
    export_dir: Option<&'a Path>,
    tick_rate_ms: Option<&'a u64>,
}

impl<'a> AppConfigBuilder<'a> {
    pub fn build(&self) -> Result<AppConfig, AppConfigBuilderError> {
        let mut config = AppConfig::default();
        if let Some(url) = self.backend_url {
            config.backend_url = url.to_string();
        }
        if let Some(secs) = self.timeout_secs {
            Self::validate_timeout_secs(secs)?;
            config.timeout = Some(Duration::from_secs(*secs));
        }
        if let Some(tiles) = self.tiles {
            Self::validate_tiles(tiles)?;
            config.tiles = tiles.iter().map(|t| TileId::new(t.trim())).collect();
        }
        if let Some(palette) = self.palette {
            config.palette = palette.to_string();
        }
        if let Some(hide) = self.hide_colorscale {
            config.show_colorscale = !*hide;
        }
        if let Some(width) = self.sidebar_width {
            config.sidebar_width = clamp_sidebar_width(i32::from(*width));
        }
        if let Some(dir) = self.export_dir {
            config.export_dir = dir.to_path_buf();
        }
        if let Some(ms) = self.tick_rate_ms {
            Self::validate_tick_rate(ms)?;
            config.tick_rate = Duration::from_millis(*ms);
        }
        Ok(config)
    }

    pub fn backend_url(&mut self, backend_url: &'a str) -> &mut Self {
        self.backend_url = Some(backend_url);
        self
    }

    pub fn timeout_secs(&mut self, timeout_secs: &'a u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn tiles(&mut self, tiles: &'a [String]) -> &mut Self {
        self.tiles = Some(tiles);
        self
    }

    pub fn palette(&mut self, palette: &'a str) -> &mut Self {
        self.palette = Some(palette);
        self
    }

    pub fn hide_colorscale(&mut self, hide_colorscale: &'a bool) -> &mut Self {
        self.hide_colorscale = Some(hide_colorscale);
        self
    }

    pub fn sidebar_width(&mut self, sidebar_width: &'a u16) -> &mut Self {
        self.sidebar_width = Some(sidebar_width);
        self
    }

    pub fn export_dir(&mut self, export_dir: &'a Path) -> &mut Self {
        self.export_dir = Some(export_dir);
        self
    }

    pub fn tick_rate_ms(&mut self, tick_rate_ms: &'a u64) -> &mut Self {
        self.tick_rate_ms = Some(tick_rate_ms);
        self
    }

    fn validate_timeout_secs(secs: &u64) -> Result<(), AppConfigBuilderError> {
        if *secs == 0 {
            return Err(AppConfigBuilderError::InvalidTimeout);
        }
        Ok(())
    }

    fn validate_tick_rate(ms: &u64) -> Result<(), AppConfigBuilderError> {
        if *ms == 0 {
            return Err(AppConfigBuilderError::InvalidTickRate);
        }
        Ok(())
    }

    fn validate_tiles(tiles: &[String]) -> Result<(), AppConfigBuilderError> {
        let mut seen = HashSet::new();
        for tile in tiles {
            let tile = tile.trim();
            if tile.is_empty() {
                return Err(AppConfigBuilderError::EmptyTileId);
            }
            if tile.starts_with(MINTED_PREFIX) {
                return Err(AppConfigBuilderError::ReservedTileId(tile.to_string()));
            }
            if !seen.insert(tile) {
                return Err(AppConfigBuilderError::DuplicateTileId(tile.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AppConfigBuilderError {
    #[error("timeout must be at least one second")]
    InvalidTimeout,
    #[error("tick rate must be larger than zero")]
    InvalidTickRate,
    #[error("tile ids must not be empty")]
    EmptyTileId,
    #[error("tile id {0:?} uses the prefix reserved for new tiles")]
    ReservedTileId(String),
    #[error("tile id {0:?} given more than once")]
    DuplicateTileId(String),
}
