//! Entry model and filesystem listing helpers

pub mod catalog;
pub mod matcher;

pub use catalog::{collect_catalog_paths, Catalog, CatalogDiff};
pub use matcher::{follow_selection, match_entries, merge_matches, same_paths, RESULT_LIMIT};

use crate::thumbnail::{GenericIcons, Thumbnail};
use parking_lot::RwLock;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// One searchable item. Identity is the full path; the thumbnail starts as the
/// generic icon for the kind and is replaced at most once.
#[derive(Debug)]
pub struct Entry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
    thumbnail: RwLock<Thumbnail>,
    thumbnail_loaded: AtomicBool,
}

/// Entries are shared between the catalog, crawl results and the displayed list.
pub type SharedEntry = Arc<Entry>;

impl Entry {
    pub fn new(path: PathBuf, kind: EntryKind, icons: &GenericIcons) -> Self {
        let name = display_name(&path);

        Self {
            path,
            name,
            kind,
            thumbnail: RwLock::new(icons.for_kind(kind)),
            thumbnail_loaded: AtomicBool::new(false),
        }
    }

    pub fn shared(path: PathBuf, kind: EntryKind, icons: &GenericIcons) -> SharedEntry {
        Arc::new(Self::new(path, kind, icons))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn thumbnail(&self) -> Thumbnail {
        self.thumbnail.read().clone()
    }

    pub fn is_thumbnail_loaded(&self) -> bool {
        self.thumbnail_loaded.load(Ordering::Acquire)
    }

    /// Stores a loaded icon. Only the first call takes effect; returns whether
    /// the thumbnail changed.
    pub fn set_thumbnail(&self, thumbnail: Thumbnail) -> bool {
        let mut guard = self.thumbnail.write();
        if self.thumbnail_loaded.load(Ordering::Acquire) {
            return false;
        }
        *guard = thumbnail;
        self.thumbnail_loaded.store(true, Ordering::Release);
        true
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Entry {}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Reports whether a path carries the platform's hidden marker.
#[cfg(windows)]
pub fn is_hidden(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    fs::symlink_metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

/// Reports whether a path carries the platform's hidden marker.
#[cfg(not(windows))]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Visible contents of one directory, split by kind and sorted by path.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub files: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

impl DirectoryListing {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

/// Lists one level of `dir`, skipping hidden entries and entries whose
/// metadata cannot be read. Fails only if the directory itself is unreadable.
pub fn list_directory(dir: &Path) -> io::Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();

    for entry_result in fs::read_dir(dir)? {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        // Follow symlinks so linked folders are crawled like real ones.
        let is_dir = if file_type.is_symlink() {
            fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            file_type.is_dir()
        };

        if is_dir {
            listing.directories.push(path);
        } else {
            listing.files.push(path);
        }
    }

    listing.files.sort();
    listing.directories.sort();

    Ok(listing)
}
