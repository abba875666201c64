//! npy-mosaic - Interactive heatmap mosaic
//!
//! Terminal tiling viewer for array files served by a local backend.
//!
//! ## Usage
//!
//! ```bash
//! # Default backend at http://localhost:8000 with tiles a, b, c, d
//! npy-mosaic
//!
//! # Custom backend and seed tiles, logging to a file
//! npy-mosaic --backend-url http://127.0.0.1:9000 --tiles left,right --log-file mosaic.log
//! ```

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::prelude::*;
use std::fs::File;
use std::io::{stdout, Stdout};
use std::path::PathBuf;

use npy_mosaic::data::{BackendClient, BackendClientBuilder};
use npy_mosaic::tui::{spawn_fetch, App, Event, EventHandler};
use npy_mosaic::{AppConfig, AppConfigBuilder};

#[derive(Parser, Debug)]
#[command(
    name = "npy-mosaic",
    author,
    version = npy_mosaic::app_version(),
    about = "Tiling heatmap viewer for array files served over HTTP"
)]
struct Cli {
    /// Base URL of the array backend
    #[clap(long, default_value = npy_mosaic::data::DEFAULT_BACKEND_URL, value_name = "URL")]
    backend_url: String,

    /// Request timeout in seconds (none by default)
    #[clap(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Seed tile ids (comma-separated, e.g., "a,b,c,d")
    #[clap(long, value_delimiter = ',', value_name = "IDS")]
    tiles: Option<Vec<String>>,

    /// Initial color palette
    #[clap(long, value_name = "NAME")]
    palette: Option<String>,

    /// Start with heatmap color bars hidden
    #[clap(long)]
    hide_colorscale: bool,

    /// Sidebar width in pixels (8 per terminal column)
    #[clap(long, value_name = "N")]
    sidebar_width: Option<u16>,

    /// Directory for exported HTML heatmaps
    #[clap(long, default_value = ".", value_name = "DIR")]
    export_dir: PathBuf,

    /// Tick interval in milliseconds
    #[clap(long, value_name = "MS")]
    tick_rate: Option<u64>,

    /// Write logs to this file (the terminal is taken by the UI)
    #[clap(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
            pretty_env_logger::formatted_builder()
                .parse_filters(&filters)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .try_init()?;
        }
        // stderr would scribble over the alternate screen
        None if std::env::var_os("RUST_LOG").is_some() => pretty_env_logger::try_init()?,
        None => {}
    }
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut builder = AppConfigBuilder::default();
    builder
        .backend_url(&cli.backend_url)
        .hide_colorscale(&cli.hide_colorscale)
        .export_dir(&cli.export_dir);
    if let Some(secs) = &cli.timeout_secs {
        builder.timeout_secs(secs);
    }
    if let Some(tiles) = &cli.tiles {
        builder.tiles(tiles);
    }
    if let Some(palette) = &cli.palette {
        builder.palette(palette);
    }
    if let Some(width) = &cli.sidebar_width {
        builder.sidebar_width(width);
    }
    if let Some(ms) = &cli.tick_rate {
        builder.tick_rate_ms(ms);
    }
    Ok(builder.build()?)
}

fn build_client(config: &AppConfig) -> anyhow::Result<BackendClient> {
    let mut builder = BackendClientBuilder::default();
    builder.base_url(&config.backend_url);
    if let Some(timeout) = &config.timeout {
        builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    client: &BackendClient,
) -> anyhow::Result<()> {
    let mut event_handler = EventHandler::new(app.config.tick_rate);
    app.start();

    // Main loop
    while !app.should_quit {
        for request in app.take_fetches() {
            spawn_fetch(client, request, event_handler.sender());
        }

        // Draw the UI
        terminal.draw(|frame| {
            npy_mosaic::tui::ui::draw(frame, app);
        })?;

        // Handle events
        match event_handler.next().await? {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.on_key(key),
            Event::Mouse(mouse) => app.on_mouse(mouse),
            Event::Resize(_, _) => {
                // Terminal will redraw automatically
            }
            Event::FilesListed { generation, result } => app.on_files_listed(generation, result),
            Event::ArrayLoaded {
                generation,
                filename,
                result,
            } => app.on_array_loaded(generation, &filename, result),
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = build_config(&cli)?;
    let client = build_client(&config)?;
    info!("npy-mosaic {} using backend {}", npy_mosaic::app_version(), client.base_url());
    let mut app = App::new(config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &client).await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
