//! Result coordinator: owns the active mode, the displayed result and the
//! selection, and drives crawls and thumbnail loading.
//!
//! All state lives in one actor task. Callers talk to it through the cloneable
//! [`Coordinator`] handle and observe it through [`Snapshot`]s published on a
//! watch channel. [`SyncCoordinator`] wraps the handle for synchronous callers.

pub mod loader;

pub use loader::LoadDelays;

use crate::crawler::{
    spawn_crawl, CrawlHandle, CrawlOutcome, CrawlProgress, CrawlRequest, FileSystemResults,
    GenerationCounter,
};
use crate::domain::{
    collect_catalog_paths, follow_selection, match_entries, same_paths, Catalog, CatalogDiff,
    EntryKind, SharedEntry, RESULT_LIMIT,
};
use crate::error::{AppSeekError, Result};
use crate::thumbnail::ThumbnailCache;
use loader::LoadPass;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Which source list the key is matched against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Catalog,
    FileSystem { base: PathBuf },
}

impl SearchMode {
    pub fn base(&self) -> Option<&Path> {
        match self {
            SearchMode::Catalog => None,
            SearchMode::FileSystem { base } => Some(base),
        }
    }
}

/// Published view of the coordinator state
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub results: Vec<SharedEntry>,
    /// Always `None` for an empty result, otherwise a valid index
    pub selected: Option<usize>,
    pub mode: SearchMode,
    pub key: String,
    pub crawling: bool,
    pub catalog_len: usize,
    /// Bumped on every publication, including thumbnail loads
    pub revision: u64,
}

impl Snapshot {
    pub fn selected_entry(&self) -> Option<&SharedEntry> {
        self.selected.and_then(|i| self.results.get(i))
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub roots: Vec<PathBuf>,
    pub limit: usize,
    pub delays: LoadDelays,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            limit: RESULT_LIMIT,
            delays: LoadDelays::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

/// Messages handled by the coordinator actor
enum Request {
    SetKey {
        key: String,
        reply: oneshot::Sender<()>,
    },
    SetSearchBase {
        base: Option<PathBuf>,
        reply: oneshot::Sender<()>,
    },
    RefreshCatalog {
        reply: oneshot::Sender<CatalogDiff>,
    },
    Select {
        direction: Direction,
        reply: oneshot::Sender<()>,
    },
    PivotIntoSelected {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle for sending requests to the coordinator
#[derive(Clone)]
pub struct Coordinator {
    request_tx: mpsc::UnboundedSender<Request>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl Coordinator {
    /// Spawns the coordinator actor on the current runtime. The catalog is
    /// listed once before the first request is served.
    pub fn spawn(options: CoordinatorOptions, cache: Arc<ThumbnailCache>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();

        let actor = CoordinatorActor::new(options, cache, snapshot_tx, loaded_tx);
        tokio::spawn(actor.run(request_rx, loaded_rx));

        Self {
            request_tx,
            snapshot_rx,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.request_tx
            .send(make(reply))
            .map_err(|_| AppSeekError::CoordinatorClosed)?;
        response.await.map_err(|_| AppSeekError::CoordinatorClosed)
    }

    pub async fn set_key(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.request(|reply| Request::SetKey { key, reply }).await
    }

    /// Enters filesystem mode on `base`, or leaves it for `None` (or an empty path)
    pub async fn set_search_base(&self, base: Option<PathBuf>) -> Result<()> {
        self.request(|reply| Request::SetSearchBase { base, reply })
            .await
    }

    pub async fn refresh_catalog(&self) -> Result<CatalogDiff> {
        self.request(|reply| Request::RefreshCatalog { reply }).await
    }

    pub async fn select_next(&self) -> Result<()> {
        self.request(|reply| Request::Select {
            direction: Direction::Next,
            reply,
        })
        .await
    }

    pub async fn select_previous(&self) -> Result<()> {
        self.request(|reply| Request::Select {
            direction: Direction::Previous,
            reply,
        })
        .await
    }

    /// Searches inside the selected entry: a directory becomes the search
    /// base, a file's parent does. Returns whether the base changed.
    pub async fn pivot_into_selected(&self) -> Result<bool> {
        self.request(|reply| Request::PivotIntoSelected { reply })
            .await
    }

    /// Clears the key and returns to catalog mode
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Request::Reset { reply }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Request::Shutdown { reply }).await
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Waits until no crawl is running and returns the snapshot at that point
    pub async fn wait_for_idle(&self) -> Result<Snapshot> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| !s.crawling)
            .await
            .map_err(|_| AppSeekError::CoordinatorClosed)?;
        Ok(snapshot.clone())
    }
}

struct CoordinatorActor {
    options: CoordinatorOptions,
    cache: Arc<ThumbnailCache>,
    catalog: Catalog,
    mode: SearchMode,
    key: String,
    key_tx: watch::Sender<String>,
    generations: GenerationCounter,
    fs_results: FileSystemResults,
    crawl: Option<CrawlHandle>,
    results: Vec<SharedEntry>,
    selected: Option<usize>,
    /// Id of the displayed result; load passes compare against it
    result_id: Arc<AtomicU64>,
    loaded_tx: mpsc::UnboundedSender<u64>,
    snapshot_tx: watch::Sender<Snapshot>,
    revision: u64,
}

impl CoordinatorActor {
    fn new(
        options: CoordinatorOptions,
        cache: Arc<ThumbnailCache>,
        snapshot_tx: watch::Sender<Snapshot>,
        loaded_tx: mpsc::UnboundedSender<u64>,
    ) -> Self {
        let (key_tx, _) = watch::channel(String::new());
        let catalog = Catalog::new(options.roots.clone());

        Self {
            options,
            cache,
            catalog,
            mode: SearchMode::Catalog,
            key: String::new(),
            key_tx,
            generations: GenerationCounter::new(),
            fs_results: FileSystemResults::new(),
            crawl: None,
            results: Vec::new(),
            selected: None,
            result_id: Arc::new(AtomicU64::new(0)),
            loaded_tx,
            snapshot_tx,
            revision: 0,
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut loaded_rx: mpsc::UnboundedReceiver<u64>,
    ) {
        self.refresh_catalog().await;
        self.publish();

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Shutdown { reply }) => {
                        self.stop_background_work();
                        let _ = reply.send(());
                        break;
                    }
                    Some(request) => self.handle(request).await,
                    None => {
                        self.stop_background_work();
                        break;
                    }
                },
                Some(pass_id) = loaded_rx.recv() => self.on_thumbnail_loaded(pass_id),
                signal = next_crawl_signal(&mut self.crawl) => match signal {
                    Some(progress) => self.on_crawl_progress(progress),
                    None => self.on_crawl_finished().await,
                },
            }
        }

        debug!("Coordinator stopped");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::SetKey { key, reply } => {
                self.set_key(key);
                let _ = reply.send(());
            }
            Request::SetSearchBase { base, reply } => {
                if self.set_search_base(base) {
                    self.publish();
                }
                let _ = reply.send(());
            }
            Request::RefreshCatalog { reply } => {
                let diff = self.refresh_catalog().await;
                if !diff.is_empty() {
                    self.publish();
                }
                let _ = reply.send(diff);
            }
            Request::Select { direction, reply } => {
                if self.move_selection(direction) {
                    self.publish();
                }
                let _ = reply.send(());
            }
            Request::PivotIntoSelected { reply } => {
                let pivoted = self.pivot_into_selected();
                if pivoted {
                    self.publish();
                }
                let _ = reply.send(pivoted);
            }
            Request::Reset { reply } => {
                self.reset();
                self.publish();
                let _ = reply.send(());
            }
            Request::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn set_key(&mut self, key: String) {
        if key == self.key {
            return;
        }
        self.replace_key(key);
        self.update_search_result();
        self.publish();
    }

    fn replace_key(&mut self, key: String) {
        self.key_tx.send_replace(key.clone());
        self.key = key;
    }

    /// Returns whether the mode or base changed
    fn set_search_base(&mut self, base: Option<PathBuf>) -> bool {
        let base = base.filter(|b| !b.as_os_str().is_empty());

        match base {
            None => {
                if self.mode == SearchMode::Catalog {
                    return false;
                }
                self.stop_crawl();
                self.fs_results = FileSystemResults::new();
                self.mode = SearchMode::Catalog;
                info!("Leaving filesystem search");
            }
            Some(base) => {
                if self.mode.base() == Some(base.as_path()) {
                    return false;
                }
                self.start_crawl(base);
            }
        }

        self.update_search_result();
        true
    }

    fn start_crawl(&mut self, base: PathBuf) {
        info!("Searching filesystem under {}", base.display());

        self.replace_key(String::new());
        self.fs_results = FileSystemResults::new();
        self.mode = SearchMode::FileSystem { base: base.clone() };

        // the previous crawl sees the advanced generation and returns on its own
        let request = CrawlRequest {
            base,
            generation: self.generations.advance(),
            results: self.fs_results.clone(),
            key: self.key_tx.subscribe(),
            limit: self.options.limit,
            icons: self.cache.generic_icons().clone(),
        };
        self.crawl = Some(spawn_crawl(request));
    }

    fn stop_crawl(&mut self) {
        self.generations.advance();
        self.crawl = None;
    }

    /// Supersedes the running crawl and any load pass
    fn stop_background_work(&mut self) {
        self.stop_crawl();
        self.result_id.fetch_add(1, Ordering::AcqRel);
    }

    fn pivot_into_selected(&mut self) -> bool {
        let Some(entry) = self.selected.and_then(|i| self.results.get(i)) else {
            return false;
        };

        let target = match entry.kind() {
            EntryKind::Directory => Some(entry.path().to_path_buf()),
            EntryKind::File => entry.path().parent().map(Path::to_path_buf),
        };

        match target {
            Some(target) => self.set_search_base(Some(target)),
            None => false,
        }
    }

    fn reset(&mut self) {
        self.replace_key(String::new());
        if !self.set_search_base(None) {
            self.update_search_result();
        }
    }

    fn move_selection(&mut self, direction: Direction) -> bool {
        let len = self.results.len();
        let Some(current) = self.selected else {
            return false;
        };
        if len == 0 {
            return false;
        }

        let next = match direction {
            Direction::Next => (current + 1) % len,
            Direction::Previous => (current + len - 1) % len,
        };
        self.selected = Some(next);
        next != current
    }

    async fn refresh_catalog(&mut self) -> CatalogDiff {
        let roots = self.catalog.roots().to_vec();
        let paths = match tokio::task::spawn_blocking(move || collect_catalog_paths(&roots)).await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Catalog listing failed: {}", e);
                return CatalogDiff::default();
            }
        };

        let diff = self.catalog.refresh(&paths, self.cache.generic_icons());
        if !diff.is_empty() {
            info!(
                "Catalog refreshed: {} added, {} removed, {} total",
                diff.added,
                diff.removed,
                self.catalog.len()
            );
            if self.mode == SearchMode::Catalog {
                self.update_search_result();
            }
        }
        diff
    }

    fn on_crawl_progress(&mut self, progress: CrawlProgress) {
        let current = self
            .crawl
            .as_ref()
            .is_some_and(|crawl| crawl.generation().is_current());
        if !current {
            return;
        }

        debug!(
            "Crawl progress: {} directories, {} entries",
            progress.directories, progress.entries
        );
        if self.update_search_result() {
            self.publish();
        }
    }

    async fn on_crawl_finished(&mut self) {
        let Some(crawl) = self.crawl.take() else {
            return;
        };
        let base = crawl.base().to_path_buf();
        let current = crawl.generation().is_current();

        match crawl.finish().await {
            Some(CrawlOutcome::Completed) => info!(
                "Crawl of {} completed with {} entries",
                base.display(),
                self.fs_results.len()
            ),
            Some(CrawlOutcome::Superseded) => debug!("Crawl of {} superseded", base.display()),
            None => {}
        }

        if current {
            self.update_search_result();
        }
        self.publish();
    }

    fn on_thumbnail_loaded(&mut self, pass_id: u64) {
        if pass_id == self.result_id.load(Ordering::Acquire) {
            self.publish();
        }
    }

    /// Re-ranks the active source list. Returns whether the displayed result
    /// changed; thumbnails are scheduled only in that case.
    fn update_search_result(&mut self) -> bool {
        let next = match self.mode {
            SearchMode::Catalog => {
                match_entries(self.catalog.entries(), &self.key, self.options.limit)
            }
            SearchMode::FileSystem { .. } => self.fs_results.ranked(&self.key, self.options.limit),
        };

        if same_paths(&next, &self.results) {
            return false;
        }

        self.selected = follow_selection(&self.results, self.selected, &next);
        self.results = next;
        self.schedule_thumbnails();
        true
    }

    fn schedule_thumbnails(&mut self) {
        let id = self.result_id.fetch_add(1, Ordering::AcqRel) + 1;
        if self.results.is_empty() {
            return;
        }

        let pass = LoadPass {
            id,
            entries: self.results.clone(),
            current: Arc::clone(&self.result_id),
            cache: Arc::clone(&self.cache),
            delays: self.options.delays,
            loaded_tx: self.loaded_tx.clone(),
        };
        tokio::spawn(pass.run());
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshot_tx.send_replace(Snapshot {
            results: self.results.clone(),
            selected: self.selected,
            mode: self.mode.clone(),
            key: self.key.clone(),
            crawling: self.crawl.is_some(),
            catalog_len: self.catalog.len(),
            revision: self.revision,
        });
    }
}

async fn next_crawl_signal(crawl: &mut Option<CrawlHandle>) -> Option<CrawlProgress> {
    match crawl {
        Some(handle) => handle.next_signal().await,
        None => std::future::pending().await,
    }
}

/// Synchronous wrapper for the terminal loop. Owns its own runtime.
pub struct SyncCoordinator {
    coordinator: Coordinator,
    snapshots: watch::Receiver<Snapshot>,
    runtime: tokio::runtime::Runtime,
}

impl SyncCoordinator {
    pub fn new(options: CoordinatorOptions, cache: Arc<ThumbnailCache>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let coordinator = runtime.block_on(async { Coordinator::spawn(options, cache) });
        let snapshots = coordinator.subscribe();

        Ok(Self {
            coordinator,
            snapshots,
            runtime,
        })
    }

    pub fn set_key(&self, key: impl Into<String>) -> Result<()> {
        self.runtime.block_on(self.coordinator.set_key(key))
    }

    pub fn set_search_base(&self, base: Option<PathBuf>) -> Result<()> {
        self.runtime.block_on(self.coordinator.set_search_base(base))
    }

    pub fn refresh_catalog(&self) -> Result<CatalogDiff> {
        self.runtime.block_on(self.coordinator.refresh_catalog())
    }

    pub fn select_next(&self) -> Result<()> {
        self.runtime.block_on(self.coordinator.select_next())
    }

    pub fn select_previous(&self) -> Result<()> {
        self.runtime.block_on(self.coordinator.select_previous())
    }

    pub fn pivot_into_selected(&self) -> Result<bool> {
        self.runtime.block_on(self.coordinator.pivot_into_selected())
    }

    pub fn reset(&self) -> Result<()> {
        self.runtime.block_on(self.coordinator.reset())
    }

    pub fn wait_for_idle(&self) -> Result<Snapshot> {
        self.runtime.block_on(self.coordinator.wait_for_idle())
    }

    /// Latest snapshot; marks it as seen
    pub fn snapshot(&mut self) -> Snapshot {
        self.snapshots.borrow_and_update().clone()
    }

    /// Whether a snapshot was published since the last [`snapshot`](Self::snapshot)
    pub fn has_changed(&self) -> bool {
        self.snapshots.has_changed().unwrap_or(false)
    }

    /// Handle to the owned runtime, for spawning companion tasks
    pub fn runtime_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn shutdown(self) -> Result<()> {
        self.runtime.block_on(self.coordinator.shutdown())
    }
}
