// Thumbnail cache: per-extension icon cache with generic fallbacks

use crate::domain::EntryKind;
use crate::error::{AppSeekError, Result};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Edge length of extracted and generic icons, in pixels
pub const ICON_SIZE: u32 = 32;

const GENERIC_FILE_ICON: &str = "genericFileThumbnail.png";
const GENERIC_FOLDER_ICON: &str = "genericFolderThumbnail.png";

/// Shared, immutable icon bitmap. Clones share the same pixels.
#[derive(Clone)]
pub struct Thumbnail(Arc<RgbaImage>);

impl Thumbnail {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    /// A square icon filled with one color
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, Rgba(rgba)))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    /// Identity comparison: true when both handles share the same bitmap
    pub fn same_as(&self, other: &Thumbnail) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbnail({}x{})", self.0.width(), self.0.height())
    }
}

/// The two fallback icons, built once at startup and passed around by value.
#[derive(Debug, Clone)]
pub struct GenericIcons {
    pub file: Thumbnail,
    pub folder: Thumbnail,
}

impl GenericIcons {
    /// Loads the generic icons from `icons_dir`, substituting placeholders for
    /// any icon that is missing or cannot be decoded.
    pub fn load(icons_dir: Option<&Path>) -> Self {
        let placeholder = Self::placeholder();
        let Some(dir) = icons_dir else {
            return placeholder;
        };

        Self {
            file: load_icon_file(&dir.join(GENERIC_FILE_ICON)).unwrap_or(placeholder.file),
            folder: load_icon_file(&dir.join(GENERIC_FOLDER_ICON)).unwrap_or(placeholder.folder),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            file: Thumbnail::solid([180, 180, 180, 255]),
            folder: Thumbnail::solid([222, 184, 92, 255]),
        }
    }

    pub fn for_kind(&self, kind: EntryKind) -> Thumbnail {
        match kind {
            EntryKind::File => self.file.clone(),
            EntryKind::Directory => self.folder.clone(),
        }
    }
}

fn load_icon_file(path: &Path) -> Option<Thumbnail> {
    match image::open(path) {
        Ok(img) => Some(Thumbnail::new(img.thumbnail(ICON_SIZE, ICON_SIZE).to_rgba8())),
        Err(e) => {
            warn!("Using placeholder for {}: {}", path.display(), e);
            None
        }
    }
}

/// Platform seam for producing the icon of a path.
pub trait IconExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Thumbnail>;

    /// Whether `path` can have an icon at all. Entries without one keep their
    /// generic icon and are never extracted.
    fn has_icon(&self, _path: &Path, _kind: EntryKind) -> bool {
        true
    }

    /// True when icons show the file's own contents rather than its type.
    /// Such icons are never shared between paths.
    fn per_file(&self) -> bool {
        false
    }
}

/// Decodes image files and scales them down to icon size. Any other path is
/// reported as a failure, which callers degrade to the generic icon.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageIconExtractor;

impl IconExtractor for ImageIconExtractor {
    fn has_icon(&self, path: &Path, kind: EntryKind) -> bool {
        kind == EntryKind::File && image::ImageFormat::from_path(path).is_ok()
    }

    fn per_file(&self) -> bool {
        true
    }

    fn extract(&self, path: &Path) -> Result<Thumbnail> {
        if path.is_dir() {
            return Err(AppSeekError::IconError {
                path: path.to_path_buf(),
                reason: "directories have no image icon".to_string(),
            });
        }

        let img = image::open(path)?;
        Ok(Thumbnail::new(img.thumbnail(ICON_SIZE, ICON_SIZE).to_rgba8()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IconKey {
    Extension(String),
    Directory,
}

impl IconKey {
    fn for_path(path: &Path, kind: EntryKind) -> Self {
        match kind {
            EntryKind::Directory => IconKey::Directory,
            EntryKind::File => IconKey::Extension(extension_of(path)),
        }
    }
}

/// Lowercase extension without the dot, empty when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Normalizes a deny-list line: trims, strips a leading dot, lowercases.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}

/// Icon cache keyed by extension.
///
/// A slot holding `None` marks an extension that must always be re-extracted
/// (seeded from the deny-list). Missing slots are cacheable. A per-file
/// extractor bypasses the slots entirely.
pub struct ThumbnailCache {
    icons: GenericIcons,
    extractor: Arc<dyn IconExtractor>,
    slots: Mutex<HashMap<IconKey, Option<Thumbnail>>>,
}

impl ThumbnailCache {
    pub fn new<I, S>(icons: GenericIcons, extractor: Arc<dyn IconExtractor>, deny_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slots = deny_list
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .map(|ext| (IconKey::Extension(ext), None))
            .collect();

        Self {
            icons,
            extractor,
            slots: Mutex::new(slots),
        }
    }

    pub fn generic_icons(&self) -> &GenericIcons {
        &self.icons
    }

    /// Whether loading an icon for `path` can produce anything but the generic one
    pub fn has_icon(&self, path: &Path, kind: EntryKind) -> bool {
        self.extractor.has_icon(path, kind)
    }

    /// Returns the icon for `path`, substituting the generic icon for `kind`
    /// when extraction fails.
    pub async fn get_icon(&self, path: &Path, kind: EntryKind, settle: Duration) -> Thumbnail {
        match self.load_icon(path, kind, settle).await {
            Some(icon) => icon,
            None => self.icons.for_kind(kind),
        }
    }

    /// Like [`get_icon`](Self::get_icon) but reports extraction failure as `None`.
    ///
    /// A cache hit, or a path without an icon, returns without delay. Otherwise
    /// the icon is extracted on the blocking pool, cached unless the extension
    /// is deny-listed or the extractor is per-file, and returned after `settle`
    /// so a superseding request can win the race.
    pub async fn load_icon(
        &self,
        path: &Path,
        kind: EntryKind,
        settle: Duration,
    ) -> Option<Thumbnail> {
        if !self.has_icon(path, kind) {
            return None;
        }

        let key = IconKey::for_path(path, kind);

        let always_reload = self.extractor.per_file() || {
            let slots = self.slots.lock();
            match slots.get(&key) {
                Some(Some(icon)) => return Some(icon.clone()),
                Some(None) => true,
                None => false,
            }
        };

        let extracted = self.extract(path.to_path_buf()).await;

        if let Some(icon) = &extracted {
            if !always_reload {
                self.slots
                    .lock()
                    .entry(key)
                    .or_insert_with(|| Some(icon.clone()));
            }
        }

        tokio::time::sleep(settle).await;
        extracted
    }

    async fn extract(&self, path: PathBuf) -> Option<Thumbnail> {
        let extractor = Arc::clone(&self.extractor);
        let display = path.clone();

        match tokio::task::spawn_blocking(move || extractor.extract(&path)).await {
            Ok(Ok(icon)) => Some(icon),
            Ok(Err(e)) => {
                debug!("No icon for {}: {}", display.display(), e);
                None
            }
            Err(e) => {
                debug!("Icon task for {} failed: {}", display.display(), e);
                None
            }
        }
    }

    /// Number of extensions currently holding a cached icon
    pub fn cached_count(&self) -> usize {
        self.slots.lock().values().filter(|v| v.is_some()).count()
    }
}

impl fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("icons", &self.icons)
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}
