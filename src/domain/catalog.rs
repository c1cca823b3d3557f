use super::{is_hidden, list_directory, Entry, EntryKind, SharedEntry};
use crate::thumbnail::GenericIcons;
use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Lists the catalog roots: files pass through, directories contribute the
/// files directly inside them. Hidden paths and duplicates are dropped.
pub fn collect_catalog_paths(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for root in roots {
        for path in root_files(root) {
            if is_hidden(&path) {
                continue;
            }
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
    }

    paths
}

fn root_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    match list_directory(root) {
        Ok(listing) => listing.files,
        Err(e) => {
            warn!("Skipping catalog source {}: {}", root.display(), e);
            Vec::new()
        }
    }
}

/// Outcome of a catalog refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    pub added: usize,
    pub removed: usize,
}

impl CatalogDiff {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Ordered set of known entries, unique by path.
#[derive(Debug)]
pub struct Catalog {
    roots: Vec<PathBuf>,
    entries: Vec<SharedEntry>,
}

impl Catalog {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            entries: Vec::new(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn entries(&self) -> &[SharedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies a fresh listing. Vanished paths are removed, new paths appended
    /// in listing order, and surviving entries (with their thumbnails) kept.
    pub fn refresh(&mut self, paths: &[PathBuf], icons: &GenericIcons) -> CatalogDiff {
        let fresh: HashSet<&Path> = paths.iter().map(|p| p.as_path()).collect();

        let before = self.entries.len();
        self.entries.retain(|e| fresh.contains(e.path()));
        let removed = before - self.entries.len();

        let known: HashSet<PathBuf> = self.entries.iter().map(|e| e.path().to_path_buf()).collect();
        let mut added = 0;
        for path in paths {
            if known.contains(path) {
                continue;
            }
            let kind = if path.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            self.entries.push(Entry::shared(path.clone(), kind, icons));
            added += 1;
        }

        CatalogDiff { added, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnail::Thumbnail;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_collect_mixes_files_and_directory_roots() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let apps = root.join("apps");
        fs::create_dir(&apps).unwrap();
        fs::write(apps.join("editor"), b"").unwrap();
        fs::write(apps.join("browser"), b"").unwrap();
        fs::create_dir(apps.join("nested")).unwrap();
        fs::write(apps.join("nested").join("deep"), b"").unwrap();
        let single = root.join("single.sh");
        fs::write(&single, b"").unwrap();

        let paths = collect_catalog_paths(&[apps.clone(), single.clone()]);

        assert_eq!(paths, vec![apps.join("browser"), apps.join("editor"), single]);
    }

    #[test]
    fn test_collect_drops_duplicates_and_missing_roots() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tool");
        fs::write(&file, b"").unwrap();

        let paths = collect_catalog_paths(&[
            file.clone(),
            temp_dir.path().to_path_buf(),
            PathBuf::from("/nonexistent/appseek/root"),
        ]);

        assert_eq!(paths, vec![file]);
    }

    #[test]
    fn test_refresh_adds_and_removes() {
        let icons = GenericIcons::placeholder();
        let mut catalog = Catalog::new(vec![]);

        let first = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let diff = catalog.refresh(&first, &icons);
        assert_eq!(diff, CatalogDiff { added: 2, removed: 0 });

        let second = vec![PathBuf::from("/b"), PathBuf::from("/c")];
        let diff = catalog.refresh(&second, &icons);
        assert_eq!(diff, CatalogDiff { added: 1, removed: 1 });

        let paths: Vec<_> = catalog.entries().iter().map(|e| e.path().to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("/b"), PathBuf::from("/c")]);
    }

    #[test]
    fn test_refresh_keeps_surviving_entries() {
        let icons = GenericIcons::placeholder();
        let mut catalog = Catalog::new(vec![]);
        catalog.refresh(&[PathBuf::from("/keep")], &icons);

        let original = Arc::clone(&catalog.entries()[0]);
        let loaded = Thumbnail::solid([9, 9, 9, 255]);
        original.set_thumbnail(loaded.clone());

        let diff = catalog.refresh(&[PathBuf::from("/keep"), PathBuf::from("/new")], &icons);

        assert_eq!(diff, CatalogDiff { added: 1, removed: 0 });
        assert!(Arc::ptr_eq(&original, &catalog.entries()[0]));
        assert!(catalog.entries()[0].thumbnail().same_as(&loaded));
    }

    #[test]
    fn test_refresh_unchanged_is_empty_diff() {
        let icons = GenericIcons::placeholder();
        let mut catalog = Catalog::new(vec![]);
        let paths = vec![PathBuf::from("/x")];
        catalog.refresh(&paths, &icons);

        assert!(catalog.refresh(&paths, &icons).is_empty());
        assert_eq!(catalog.len(), 1);
    }
}
