//! Appseek - an incremental launcher search engine
//!
//! This crate provides the core of the Appseek launcher: a ranked search over a
//! catalog of known entries, an on-demand breadth-first filesystem crawl, and
//! a thumbnail pipeline for the visible results.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod thumbnail;
pub mod tui;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use coordinator::{
    Coordinator, CoordinatorOptions, LoadDelays, SearchMode, Snapshot, SyncCoordinator,
};
pub use domain::{
    match_entries, Catalog, CatalogDiff, Entry, EntryKind, SharedEntry, RESULT_LIMIT,
};
pub use error::{AppSeekError, Result};
pub use thumbnail::{GenericIcons, IconExtractor, ImageIconExtractor, Thumbnail, ThumbnailCache};
