// Thumbnail loading over the displayed result window

use crate::domain::SharedEntry;
use crate::thumbnail::ThumbnailCache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Pauses used while loading thumbnails for a freshly displayed result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadDelays {
    /// Wait before the first load, to coalesce rapid key edits
    pub settle: Duration,
    /// Per-item pause in the top-down pass
    pub forward_item: Duration,
    /// Per-item pause in the bottom-up retry pass
    pub backward_item: Duration,
}

impl Default for LoadDelays {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(150),
            forward_item: Duration::from_millis(10),
            backward_item: Duration::from_millis(40),
        }
    }
}

impl LoadDelays {
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            forward_item: Duration::ZERO,
            backward_item: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassOutcome {
    Finished,
    Superseded,
}

/// One loading pass over one displayed result.
///
/// The pass belongs to the result identified by `id`; `current` holds the id of
/// the result on screen. Every committed thumbnail is preceded by a check of
/// the two, and the pass stops quietly once they differ.
pub(crate) struct LoadPass {
    pub(crate) id: u64,
    pub(crate) entries: Vec<SharedEntry>,
    pub(crate) current: Arc<AtomicU64>,
    pub(crate) cache: Arc<ThumbnailCache>,
    pub(crate) delays: LoadDelays,
    pub(crate) loaded_tx: mpsc::UnboundedSender<u64>,
}

impl LoadPass {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.id
    }

    /// Loaded, or never going to load anything but the generic icon
    fn is_settled(&self, entry: &SharedEntry) -> bool {
        entry.is_thumbnail_loaded() || !self.cache.has_icon(entry.path(), entry.kind())
    }

    pub(crate) async fn run(self) -> PassOutcome {
        tokio::time::sleep(self.delays.settle).await;

        // top-down: nearest to the top of the list first
        for entry in &self.entries {
            if !self.is_current() {
                return PassOutcome::Superseded;
            }
            if self.is_settled(entry) {
                continue;
            }
            self.load(entry, self.delays.forward_item).await;
        }

        // bottom-up retry for anything whose extraction failed
        let mut pending: Vec<&SharedEntry> = self
            .entries
            .iter()
            .filter(|e| !self.is_settled(e))
            .collect();

        while let Some(entry) = pending.pop() {
            if !self.is_current() {
                return PassOutcome::Superseded;
            }
            self.load(entry, self.delays.backward_item).await;
        }

        PassOutcome::Finished
    }

    async fn load(&self, entry: &SharedEntry, delay: Duration) {
        let icon = self.cache.load_icon(entry.path(), entry.kind(), delay).await;

        if !self.is_current() {
            return;
        }

        if let Some(icon) = icon {
            if entry.set_thumbnail(icon) {
                let _ = self.loaded_tx.send(self.id);
            }
        }
    }
}
