//! Media tree scanner: directory structure in, [`Catalog`] out.
//!
//! The layout contract is exactly two levels below the media root —
//! `{category}/{folder}/{file}` — and the scanner never recurses deeper for
//! structure. Hidden entries (dot-prefixed) and the reserved `Pending`
//! staging folder are skipped outright. Files that match neither extension
//! allow-list do not exist as far as the catalog is concerned.
//!
//! Dates come from filesystem mtime only. Reading EXIF here would turn a
//! directory walk into a full read of every photo; the offline
//! [`rename`](crate::rename) utility exists for deployments that want
//! capture-date ordering baked into the filenames.
//!
//! Artifact generation runs per file on the rayon pool and degrades softly:
//! a failed thumbnail or rendition is logged and the entry falls back to its
//! original route, so one corrupt photo never takes down the catalog. The
//! same holds for the walk itself: an unreadable entry, folder or category
//! is logged and skipped, and only a media root that cannot be read at all
//! fails the scan.

use crate::artifacts::ArtifactStore;
use crate::config::GalleryConfig;
use crate::types::{
    Audience, Catalog, Category, Folder, MediaFile, MediaKind, PENDING_DIR, classify, media_route,
    thumbnail_route, web_route,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A classified file before artifact generation.
struct RawEntry {
    name: String,
    logical_path: String,
    source: PathBuf,
    kind: MediaKind,
    size_bytes: u64,
    source_modified_at: DateTime<Utc>,
}

/// Scan the media tree and generate/refresh artifacts for every file.
pub fn scan(config: &GalleryConfig, store: &ArtifactStore) -> Result<Catalog, ScanError> {
    let mut categories = Vec::new();

    for category_dir in subdirectories(&config.media_root)? {
        let category_name = category_dir.name;
        if category_name == PENDING_DIR {
            continue;
        }

        let folder_dirs = match subdirectories(&category_dir.path) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(category = %category_name, error = %e, "skipping unreadable category");
                continue;
            }
        };

        let mut folders = Vec::new();
        for folder_dir in folder_dirs {
            let raw = match collect_files(&folder_dir.path, &category_name, &folder_dir.name) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(folder = %folder_dir.name, error = %e, "skipping unreadable folder");
                    continue;
                }
            };
            if raw.is_empty() {
                continue;
            }

            let mut files: Vec<MediaFile> = raw
                .into_par_iter()
                .map(|entry| build_media_file(entry, store))
                .collect();
            files.sort_by(|a, b| {
                a.source_modified_at
                    .cmp(&b.source_modified_at)
                    .then_with(|| a.name.cmp(&b.name))
            });

            folders.push(Folder {
                name: folder_dir.name,
                count: files.len(),
                files,
            });
        }

        if folders.is_empty() {
            continue;
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));

        categories.push(Category {
            audience: audience_for(config, &category_name),
            name: category_name,
            folders,
        });
    }

    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Catalog { categories })
}

/// All artifact keys the current tree justifies, for the orphan sweep.
/// Walks the same two levels as [`scan`] but does no stat-ing or pixel work.
pub fn collect_media_keys(config: &GalleryConfig) -> Result<HashSet<String>, ScanError> {
    let mut keys = HashSet::new();
    for category_dir in subdirectories(&config.media_root)? {
        if category_dir.name == PENDING_DIR {
            continue;
        }
        let folder_dirs = match subdirectories(&category_dir.path) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(category = %category_dir.name, error = %e, "skipping unreadable category");
                continue;
            }
        };
        for folder_dir in folder_dirs {
            let read = match std::fs::read_dir(&folder_dir.path) {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!(folder = %folder_dir.name, error = %e, "skipping unreadable folder");
                    continue;
                }
            };
            for entry in read {
                let Ok(entry) = entry else {
                    continue;
                };
                let Some(name) = utf8_name(&entry) else {
                    continue;
                };
                if name.starts_with('.') || classify(&name).is_none() {
                    continue;
                }
                let logical = format!("{}/{}/{}", category_dir.name, folder_dir.name, name);
                keys.insert(crate::identity::media_key(&logical));
            }
        }
    }
    Ok(keys)
}

struct NamedDir {
    name: String,
    path: PathBuf,
}

/// Visible subdirectories of `dir`, skipping hidden entries. A missing
/// directory yields an empty list: an empty gallery is not an error.
/// Entries that cannot be stat-ed are logged and skipped.
fn subdirectories(dir: &Path) -> Result<Vec<NamedDir>, ScanError> {
    let read = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    for entry in read {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let is_dir = match entry.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                tracing::warn!(entry = %entry.path().display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !is_dir {
            continue;
        }
        let Some(name) = utf8_name(&entry) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        dirs.push(NamedDir {
            name,
            path: entry.path(),
        });
    }
    Ok(dirs)
}

fn utf8_name(entry: &std::fs::DirEntry) -> Option<String> {
    match entry.file_name().into_string() {
        Ok(name) => Some(name),
        Err(os) => {
            tracing::warn!(name = ?os, "skipping non-UTF-8 file name");
            None
        }
    }
}

fn collect_files(
    folder: &Path,
    category: &str,
    folder_name: &str,
) -> Result<Vec<RawEntry>, ScanError> {
    let mut raw = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let Some(name) = utf8_name(&entry) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let Some(kind) = classify(&name) else {
            continue;
        };

        // fs::metadata follows symlinks, so a symlinked photo is cataloged
        // like a plain file and a dangling link lands in the error arm.
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
        raw.push(RawEntry {
            logical_path: format!("{category}/{folder_name}/{name}"),
            source: entry.path(),
            kind,
            size_bytes: metadata.len(),
            source_modified_at: DateTime::<Utc>::from(modified),
            name,
        });
    }
    Ok(raw)
}

/// Generate (or reuse) the artifacts for one file and resolve its serving
/// routes. Failures fall back to the original route.
fn build_media_file(entry: RawEntry, store: &ArtifactStore) -> MediaFile {
    let key = crate::identity::media_key(&entry.logical_path);
    let original = media_route(&entry.logical_path);

    let (display_path, thumbnail_path) = match entry.kind {
        MediaKind::Image => {
            let display = match store.ensure_web_optimized(&entry.source, &entry.logical_path) {
                Ok(_) => web_route(&key),
                Err(e) => {
                    tracing::warn!(file = %entry.logical_path, error = %e, "web rendition failed");
                    original.clone()
                }
            };
            let thumb = match store.ensure_thumbnail(&entry.source, &entry.logical_path) {
                Ok(_) => thumbnail_route(&key),
                Err(e) => {
                    tracing::warn!(file = %entry.logical_path, error = %e, "thumbnail failed");
                    original.clone()
                }
            };
            (display, thumb)
        }
        MediaKind::Video => {
            let thumb = match store.ensure_video_placeholder(&entry.logical_path) {
                Ok(_) => thumbnail_route(&key),
                Err(e) => {
                    tracing::warn!(file = %entry.logical_path, error = %e, "placeholder failed");
                    original.clone()
                }
            };
            // Videos are always served as-is; only the grid gets an artifact
            (original.clone(), thumb)
        }
    };

    MediaFile {
        name: entry.name,
        logical_path: entry.logical_path,
        kind: entry.kind,
        size_bytes: entry.size_bytes,
        source_modified_at: entry.source_modified_at,
        display_path,
        thumbnail_path,
        original_path: original,
    }
}

fn audience_for(config: &GalleryConfig, category_name: &str) -> Audience {
    let lower = category_name.to_lowercase();
    if config
        .professional_markers
        .iter()
        .any(|m| lower.contains(&m.to_lowercase()))
    {
        Audience::Professional
    } else {
        Audience::Guest
    }
}
