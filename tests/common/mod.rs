// Common fixtures for coordinator scenarios

use appseek::coordinator::{Coordinator, CoordinatorOptions, LoadDelays, Snapshot};
use appseek::error::Result;
use appseek::thumbnail::{GenericIcons, IconExtractor, Thumbnail, ThumbnailCache};
use appseek::RESULT_LIMIT;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extractor that never touches the disk
pub struct SolidExtractor;

impl IconExtractor for SolidExtractor {
    fn extract(&self, _path: &Path) -> Result<Thumbnail> {
        Ok(Thumbnail::solid([40, 80, 120, 255]))
    }
}

/// Coordinator over `roots` with no loader delays
#[allow(dead_code)]
pub fn spawn_coordinator(roots: Vec<PathBuf>) -> Coordinator {
    let cache = ThumbnailCache::new(
        GenericIcons::placeholder(),
        Arc::new(SolidExtractor),
        Vec::<String>::new(),
    );
    let options = CoordinatorOptions {
        roots,
        limit: RESULT_LIMIT,
        delays: LoadDelays::immediate(),
    };
    Coordinator::spawn(options, Arc::new(cache))
}

/// Creates `files` (relative paths, parents included) under `root`
#[allow(dead_code)]
pub fn build_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }
}

/// Creates `width` folders per level, `depth` levels deep, each holding one
/// file named `<prefix>_<n>.txt`
#[allow(dead_code)]
pub fn build_wide_tree(root: &Path, prefix: &str, width: usize, depth: usize) {
    let mut level = vec![root.to_path_buf()];
    let mut counter = 0;
    for _ in 0..depth {
        let mut next = Vec::new();
        for dir in &level {
            for i in 0..width {
                let child = dir.join(format!("{}_dir{}", prefix, i));
                fs::create_dir_all(&child).unwrap();
                fs::write(child.join(format!("{}_{}.txt", prefix, counter)), b"").unwrap();
                counter += 1;
                next.push(child);
            }
        }
        level = next;
    }
}

#[allow(dead_code)]
pub fn result_paths(snapshot: &Snapshot) -> BTreeSet<PathBuf> {
    snapshot
        .results
        .iter()
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[allow(dead_code)]
pub fn result_names(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .results
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}
