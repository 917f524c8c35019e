use super::stats::DisplayStats;
use super::view::compose;
use crate::controller::Screen;
use crate::error::{Result, ToadscanError};
use crate::events::{EventBus, EventFilter, ToadscanEvent};
use crate::storage::PhotoStore;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Draws the controller's screens to a terminal
pub struct TerminalDisplay {
    event_bus: Arc<EventBus>,
    store: Arc<PhotoStore>,
    writer: SharedWriter,
    stats: Arc<RwLock<DisplayStats>>,
    is_running: Arc<AtomicBool>,
    render_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TerminalDisplay {
    pub fn new(event_bus: Arc<EventBus>, store: Arc<PhotoStore>) -> Self {
        Self::with_writer(event_bus, store, io::stdout())
    }

    /// Draw into `writer` instead of stdout
    pub fn with_writer<W: Write + Send + 'static>(
        event_bus: Arc<EventBus>,
        store: Arc<PhotoStore>,
        writer: W,
    ) -> Self {
        Self {
            event_bus,
            store,
            writer: Arc::new(Mutex::new(Box::new(writer))),
            stats: Arc::new(RwLock::new(DisplayStats::default())),
            is_running: Arc::new(AtomicBool::new(false)),
            render_task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub async fn stats(&self) -> DisplayStats {
        self.stats.read().await.clone()
    }

    /// Draw `initial` and redraw on every view change
    pub async fn start(&self, initial: Screen) -> Result<()> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            info!("Terminal display is already running");
            return Ok(());
        }

        info!("Starting terminal display");

        // Subscribe before the first draw so no view change is missed
        let mut receiver = self.event_bus.subscribe_filtered(
            EventFilter::EventTypes(vec![
                "view_changed",
                "photo_saved",
                "capture_failed",
                "shutdown_requested",
            ]),
            "terminal_display",
        );

        let store = Arc::clone(&self.store);
        let writer = Arc::clone(&self.writer);
        let stats = Arc::clone(&self.stats);
        let is_running = Arc::clone(&self.is_running);

        let task = tokio::spawn(async move {
            let mut screen = initial;
            let mut status: Option<String> = None;

            redraw(&screen, status.as_deref(), &store, &writer, &stats).await;

            while is_running.load(Ordering::Relaxed) {
                match receiver.recv().await {
                    Ok(ToadscanEvent::ViewChanged { screen: next, .. }) => screen = next,
                    Ok(ToadscanEvent::PhotoSaved { path, .. }) => {
                        status = Some(format!("saved {}", path.display()));
                    }
                    Ok(ToadscanEvent::CaptureFailed { reason, .. }) => {
                        status = Some(format!("capture failed: {}", reason));
                    }
                    Ok(ToadscanEvent::ShutdownRequested { .. }) => {
                        debug!("Terminal display saw shutdown request");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Terminal display event stream ended: {}", e);
                        break;
                    }
                }

                redraw(&screen, status.as_deref(), &store, &writer, &stats).await;
            }

            is_running.store(false, Ordering::SeqCst);
            debug!("Terminal display task exited");
        });

        *self.render_task.lock().await = Some(task);
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping terminal display");
        self.is_running.store(false, Ordering::SeqCst);

        if let Some(task) = self.render_task.lock().await.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    return Err(ToadscanError::component(
                        "display".to_string(),
                        format!("render task failed: {}", e),
                    ));
                }
            }
        }

        Ok(())
    }
}

async fn redraw(
    screen: &Screen,
    status: Option<&str>,
    store: &PhotoStore,
    writer: &SharedWriter,
    stats: &RwLock<DisplayStats>,
) {
    let photos = if *screen == Screen::Gallery {
        stats.write().await.record_gallery_refresh();
        match store.list_photos().await {
            Ok(photos) => photos,
            Err(e) => {
                warn!("Failed to list photos for gallery: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let lines = compose(screen, &photos, status);
    match draw_lines(writer, &lines) {
        Ok(()) => stats.write().await.record_draw(),
        Err(e) => {
            error!("Failed to draw {} screen: {}", screen.name(), e);
            stats.write().await.record_draw_error();
        }
    }
}

fn draw_lines(writer: &SharedWriter, lines: &[String]) -> io::Result<()> {
    let mut out = writer
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    for line in lines {
        // Raw mode needs an explicit carriage return
        queue!(out, Print(line), Print("\r\n"))?;
    }
    out.flush()
}
