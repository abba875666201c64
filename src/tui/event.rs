//! Event handling for the TUI
//!
//! Terminal input is polled on a blocking thread; fetch tasks post their
//! results into the same channel, so the main loop sees one stream.

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind, KeyEvent, MouseEvent, MouseEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::data::{FetchError, FileDescriptor, LoadedArray};

/// Application events
#[derive(Debug)]
pub enum Event {
    /// Periodic tick for animations and updates
    Tick,
    /// Keyboard event
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// A file list request finished
    FilesListed {
        generation: u64,
        result: Result<Vec<FileDescriptor>, FetchError>,
    },
    /// A file load request finished
    ArrayLoaded {
        generation: u64,
        filename: String,
        result: Result<LoadedArray, FetchError>,
    },
}

/// Event handler that polls for terminal events
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

/// Minimum interval between drag events (16ms = ~60fps)
const DRAG_THROTTLE_MS: u64 = 16;

impl EventHandler {
    /// Create a new event handler ticking every `tick_rate`
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let poll_tx = tx.clone();

        tokio::task::spawn_blocking(move || {
            let mut last_drag_time = Instant::now();
            let drag_throttle = Duration::from_millis(DRAG_THROTTLE_MS);

            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                            Event::Key(key)
                        }
                        Ok(CrosstermEvent::Mouse(mouse)) => {
                            // Throttle drag events to prevent lag
                            if matches!(mouse.kind, MouseEventKind::Drag(_)) {
                                let now = Instant::now();
                                if now.duration_since(last_drag_time) < drag_throttle {
                                    continue;
                                }
                                last_drag_time = now;
                            }
                            Event::Mouse(mouse)
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                        Ok(_) => continue,
                        Err(_) => break,
                    };
                    if poll_tx.send(forwarded).is_err() {
                        break;
                    }
                } else if poll_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { tx, rx }
    }

    /// Sender for background tasks reporting back to the main loop
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> anyhow::Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
    }
}
