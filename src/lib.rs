use pretty_env_logger;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn _setup_pretty_env_logger_default() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}

/// Package version stamped with the git revision and build profile
pub fn app_version() -> &'static str {
    env!("NPY_MOSAIC_VERSION")
}

pub use config::{AppConfig, AppConfigBuilder, AppConfigBuilderError};
pub mod config;
pub mod data;
pub mod export;
pub mod mosaic;
pub mod palette;
pub mod tiles;
pub mod tui;
