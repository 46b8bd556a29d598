//! Catalog data model shared across the crate.
//!
//! The filesystem is the data source: the media root holds exactly two
//! directory levels (`{category}/{folder}/{file}`), and everything here is a
//! derived, rebuildable projection of that tree. Nothing in this module does
//! I/O — the [`scan`](crate::scan) module produces these values, the
//! [`cache`](crate::cache) memoizes them, and the thin collaborator layer
//! serializes them as JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Image file extensions accepted into the catalog (case-insensitive).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Video file extensions accepted into the catalog (case-insensitive).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv"];

/// Reserved folder name for the moderation staging area. Never exposed in
/// any [`Category`], never exported, never optimized.
pub const PENDING_DIR: &str = "Pending";

/// Serving-route prefix for original files.
pub const MEDIA_ROUTE: &str = "media";
/// Serving-route prefix for generated thumbnails and video placeholders.
pub const THUMBNAIL_ROUTE: &str = "cache/thumbnails";
/// Serving-route prefix for web-optimized renditions.
pub const WEB_ROUTE: &str = "cache/web-optimized";

/// Kind of a catalog entry, derived from the extension allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Classify a file name against the media extension allow-lists.
///
/// Returns `None` for anything that is neither an image nor a video —
/// such files simply do not exist as far as the catalog is concerned.
pub fn classify(file_name: &str) -> Option<MediaKind> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// One physical image or video under a category/folder.
///
/// `logical_path` (`{category}/{folder}/{name}`) is the addressable identity:
/// it keys derived-artifact lookups and must stay stable across rescans.
/// The three serving paths uphold one invariant: they always resolve to a
/// reachable file. When artifact generation fails or is stale, `display_path`
/// and `thumbnail_path` fall back to the original rather than pointing at a
/// missing or outdated rendition.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub logical_path: String,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub source_modified_at: DateTime<Utc>,
    /// Full-view route: web-optimized rendition when available, else original.
    pub display_path: String,
    /// Grid-preview route: thumbnail (or video placeholder), else original.
    pub thumbnail_path: String,
    /// Authoritative download route — always the raw file, never an artifact.
    pub original_path: String,
}

/// Ordered set of media files inside one category folder.
///
/// Files are sorted ascending by `source_modified_at` (filesystem mtime —
/// EXIF is deliberately never read on the scan path).
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub name: String,
    pub count: usize,
    pub files: Vec<MediaFile>,
}

/// Who a category's content is attributed to. Resolved by matching the
/// category name against a configured substring allow-list — an inherently
/// fuzzy rule, so it lives in [`GalleryConfig`](crate::config::GalleryConfig)
/// rather than being hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Professional,
    Guest,
}

/// Named grouping of folders (level 1 of the media tree).
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub name: String,
    pub audience: Audience,
    pub folders: Vec<Folder>,
}

/// The full catalog: every published category, sorted by name. This is the
/// unit the [`CatalogCache`](crate::cache::CatalogCache) stores and
/// invalidates as a whole.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Total number of media files across all categories.
    pub fn file_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.folders)
            .map(|f| f.count)
            .sum()
    }

    /// Look up a folder by category and folder name.
    pub fn find_folder(&self, category: &str, folder: &str) -> Option<&Folder> {
        self.categories
            .iter()
            .find(|c| c.name == category)?
            .folders
            .iter()
            .find(|f| f.name == folder)
    }
}

/// A file waiting in the moderation staging area.
///
/// `name` is the path relative to the Pending root and is the handle passed
/// to approve/reject — unique even when a ZIP extraction produced nested
/// layouts. `folder_path` preserves the nesting for admin display only.
#[derive(Debug, Clone, Serialize)]
pub struct PendingUpload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Serving route for an original file, addressed by logical path.
pub fn media_route(logical_path: &str) -> String {
    format!("{MEDIA_ROUTE}/{logical_path}")
}

/// Serving route for a thumbnail or placeholder artifact.
pub fn thumbnail_route(key: &str) -> String {
    format!("{THUMBNAIL_ROUTE}/{key}.avif")
}

/// Serving route for a web-optimized artifact.
pub fn web_route(key: &str) -> String {
    format!("{WEB_ROUTE}/{key}.avif")
}
