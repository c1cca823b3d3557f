//! Persisted placement of the launcher panel.
//!
//! Stored as two lines (left, top) or four lines (left, top, width, height).

use crate::error::Result;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_LEFT: u16 = 0;
pub const DEFAULT_TOP: u16 = 0;
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// Quiet period before a geometry change is written
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub left: u16,
    pub top: u16,
    /// `(width, height)`; `None` fills the available area
    pub size: Option<(u16, u16)>,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT,
            top: DEFAULT_TOP,
            size: None,
        }
    }
}

impl WindowGeometry {
    /// Get the geometry file path (~/.config/appseek/geometry)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("appseek").join("geometry"))
    }

    /// Parses the stored record. Each field that does not parse falls back to
    /// its default; fewer than four lines means no stored size.
    pub fn parse(contents: &str) -> Self {
        let fields: Vec<&str> = contents.lines().map(str::trim).collect();
        let field = |i: usize, default: u16| {
            fields
                .get(i)
                .and_then(|f| f.parse::<u16>().ok())
                .unwrap_or(default)
        };

        let size = (fields.len() >= 4).then(|| (field(2, DEFAULT_WIDTH), field(3, DEFAULT_HEIGHT)));

        Self {
            left: field(0, DEFAULT_LEFT),
            top: field(1, DEFAULT_TOP),
            size,
        }
    }

    pub fn to_record(&self) -> String {
        match self.size {
            Some((width, height)) => format!("{}\n{}\n{}\n{}\n", self.left, self.top, width, height),
            None => format!("{}\n{}\n", self.left, self.top),
        }
    }

    /// Reads the record at `path`; an unreadable file gives the defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                debug!("No stored geometry at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_record())?;
        Ok(())
    }

    /// Moves by the given offsets, saturating at the origin
    pub fn nudged(&self, dx: i32, dy: i32) -> Self {
        let shift = |v: u16, d: i32| (i32::from(v) + d).clamp(0, i32::from(u16::MAX)) as u16;
        Self {
            left: shift(self.left, dx),
            top: shift(self.top, dy),
            size: self.size,
        }
    }
}

/// Writes geometry changes once they have settled.
///
/// Every [`update`](Self::update) restarts the quiet period; only the latest
/// geometry is written. Pending changes are flushed when the saver is closed.
pub struct GeometrySaver {
    update_tx: mpsc::UnboundedSender<WindowGeometry>,
    task: JoinHandle<()>,
}

impl GeometrySaver {
    pub fn spawn(path: PathBuf, debounce: Duration) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::worker(path, debounce, update_rx));
        Self { update_tx, task }
    }

    pub fn update(&self, geometry: WindowGeometry) {
        let _ = self.update_tx.send(geometry);
    }

    /// Flushes any pending change and waits for the writer to stop
    pub async fn close(self) {
        drop(self.update_tx);
        if let Err(e) = self.task.await {
            warn!("Geometry writer failed: {}", e);
        }
    }

    async fn worker(
        path: PathBuf,
        debounce: Duration,
        mut update_rx: mpsc::UnboundedReceiver<WindowGeometry>,
    ) {
        while let Some(mut pending) = update_rx.recv().await {
            let mut closed = false;
            loop {
                match tokio::time::timeout(debounce, update_rx.recv()).await {
                    Ok(Some(newer)) => pending = newer,
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            match pending.save(&path) {
                Ok(()) => debug!("Saved geometry to {}", path.display()),
                Err(e) => warn!("Failed to save geometry to {}: {}", path.display(), e),
            }

            if closed {
                break;
            }
        }
    }
}
