//! Breadth-first filesystem crawl that feeds a shared result collection.
//!
//! A crawl runs on the blocking pool and appends each visited directory's
//! contents as one batch. After every batch it merges the batch's matches
//! into the visible window and signals the coordinator when the window
//! changed. The whole collection is re-ranked only when the live search key
//! moved since the previous batch. Crawls are never killed: a newer crawl advances the shared
//! generation counter and the old one notices and returns on its own.

use crate::domain::{
    list_directory, match_entries, merge_matches, same_paths, DirectoryListing, Entry, EntryKind,
    SharedEntry,
};
use crate::thumbnail::GenericIcons;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Source of crawl generations. Advancing it supersedes every older crawl.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    live: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> CrawlGeneration {
        let captured = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        CrawlGeneration {
            live: Arc::clone(&self.live),
            captured,
        }
    }
}

/// Token captured when a crawl starts
#[derive(Debug, Clone)]
pub struct CrawlGeneration {
    live: Arc<AtomicU64>,
    captured: u64,
}

impl CrawlGeneration {
    pub fn is_current(&self) -> bool {
        self.live.load(Ordering::Acquire) == self.captured
    }

    pub fn value(&self) -> u64 {
        self.captured
    }
}

/// Append-only entry collection shared between one crawl and its readers.
/// Every read and write goes through the lock.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResults {
    entries: Arc<Mutex<Vec<SharedEntry>>>,
}

impl FileSystemResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// Ranks the current contents against `key`
    pub fn ranked(&self, key: &str, limit: usize) -> Vec<SharedEntry> {
        match_entries(&self.entries.lock(), key, limit)
    }

    pub fn append(&self, batch: Vec<SharedEntry>) {
        self.entries.lock().extend(batch);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The queue drained
    Completed,
    /// A newer generation took over, or nobody is listening any more
    Superseded,
}

/// Counters sent with each "fresh results" signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlProgress {
    pub directories: usize,
    pub entries: usize,
}

/// Everything one crawl needs
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub base: PathBuf,
    pub generation: CrawlGeneration,
    pub results: FileSystemResults,
    pub key: watch::Receiver<String>,
    pub limit: usize,
    pub icons: GenericIcons,
}

/// Coordinator-side handle to a running crawl
#[derive(Debug)]
pub struct CrawlHandle {
    base: PathBuf,
    generation: CrawlGeneration,
    signals: mpsc::UnboundedReceiver<CrawlProgress>,
    task: JoinHandle<CrawlOutcome>,
}

impl CrawlHandle {
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn generation(&self) -> &CrawlGeneration {
        &self.generation
    }

    /// Waits for the next "fresh results" signal. `None` once the crawl ended.
    pub async fn next_signal(&mut self) -> Option<CrawlProgress> {
        self.signals.recv().await
    }

    /// Waits for the crawl task. `None` if it panicked.
    pub async fn finish(self) -> Option<CrawlOutcome> {
        match self.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Crawl of {} failed: {}", self.base.display(), e);
                None
            }
        }
    }
}

/// Starts `request` on the blocking pool
pub fn spawn_crawl(request: CrawlRequest) -> CrawlHandle {
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let base = request.base.clone();
    let generation = request.generation.clone();

    let task = tokio::task::spawn_blocking(move || crawl(request, signal_tx));

    CrawlHandle {
        base,
        generation,
        signals: signal_rx,
        task,
    }
}

/// Runs one crawl to completion or supersession on the current thread
pub fn crawl(request: CrawlRequest, signals: mpsc::UnboundedSender<CrawlProgress>) -> CrawlOutcome {
    let CrawlRequest {
        base,
        generation,
        results,
        key,
        limit,
        icons,
    } = request;

    let mut queue = VecDeque::from([base.clone()]);
    let mut visited = HashSet::new();
    let mut published: Vec<SharedEntry> = Vec::new();
    // key that `published` was ranked with
    let mut ranked_key = String::new();
    let mut progress = CrawlProgress::default();

    while let Some(dir) = queue.pop_front() {
        if !generation.is_current() {
            debug!("Crawl of {} superseded", base.display());
            return CrawlOutcome::Superseded;
        }

        // symlinked folders can form cycles
        let canonical = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(canonical) {
            continue;
        }

        let listing = match list_directory(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                debug!("Skipping {}: {}", dir.display(), e);
                continue;
            }
        };

        if !generation.is_current() {
            debug!("Crawl of {} superseded", base.display());
            return CrawlOutcome::Superseded;
        }

        progress.directories += 1;
        if listing.is_empty() {
            continue;
        }

        let DirectoryListing { files, directories } = listing;
        let mut batch = Vec::with_capacity(files.len() + directories.len());
        batch.extend(
            files
                .into_iter()
                .map(|path| Entry::shared(path, EntryKind::File, &icons)),
        );
        batch.extend(
            directories
                .iter()
                .cloned()
                .map(|path| Entry::shared(path, EntryKind::Directory, &icons)),
        );
        progress.entries += batch.len();

        let current_key = key.borrow().clone();
        let view = if current_key == ranked_key {
            let view = merge_matches(&published, &batch, &current_key, limit);
            results.append(batch);
            view
        } else {
            results.append(batch);
            ranked_key = current_key;
            results.ranked(&ranked_key, limit)
        };
        queue.extend(directories);

        if !same_paths(&view, &published) {
            published = view;
            if signals.send(progress).is_err() {
                debug!("Crawl of {} has no listener", base.display());
                return CrawlOutcome::Superseded;
            }
        }
    }

    debug!(
        "Crawl of {} completed: {} directories, {} entries",
        base.display(),
        progress.directories,
        progress.entries
    );
    CrawlOutcome::Completed
}
