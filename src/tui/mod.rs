//! TUI module for npy-mosaic
//!
//! Interactive terminal mosaic of heatmap tiles over backend array files.

mod app;
mod colors;
pub mod controller;
mod event;
mod fetch;
mod heatmap;
mod info;
pub mod ui;

pub use app::{App, StatusLevel, StatusMessage};
pub use controller::{Action, Focus};
pub use event::{Event, EventHandler};
pub use fetch::{spawn_fetch, FetchRequest};
pub use heatmap::HeatmapView;
