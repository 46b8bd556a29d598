//! Offline capture-date renamer.
//!
//! Walks a directory tree and prefixes every image filename with its EXIF
//! capture date as `YYYYMMDD-HHMMSS-`, so plain name ordering matches
//! shooting order even for files whose mtime was clobbered in transfer.
//!
//! This is a one-shot CLI utility, never part of a scan: renaming changes
//! logical paths and therefore artifact keys, so it is meant to be run once
//! over a freshly imported batch, before the gallery serves it. Files that
//! already carry the prefix and files without readable EXIF are skipped.

use crate::exif_date::exif_capture_date;
use crate::types::{MediaKind, classify};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenameStats {
    /// Images seen.
    pub total: usize,
    pub renamed: usize,
    pub already_renamed: usize,
    pub no_exif: usize,
    pub errors: usize,
}

/// Whether a filename already starts with `YYYYMMDD-HHMMSS-`.
pub fn has_date_prefix(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() >= 16
        && b[..8].iter().all(u8::is_ascii_digit)
        && b[8] == b'-'
        && b[9..15].iter().all(u8::is_ascii_digit)
        && b[15] == b'-'
}

fn date_prefix(date: &NaiveDateTime) -> String {
    date.format("%Y%m%d-%H%M%S-").to_string()
}

/// Rename every image under `root` (recursively) with its EXIF date prefix.
///
/// Per-file problems are counted, never fatal: a name collision or an
/// unreadable file leaves that file untouched and the walk continues.
pub fn rename_with_exif_dates(root: &Path) -> Result<RenameStats, RenameError> {
    let mut stats = RenameStats::default();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.starts_with('.') || classify(name) != Some(MediaKind::Image) {
            continue;
        }
        stats.total += 1;

        if has_date_prefix(name) {
            stats.already_renamed += 1;
            continue;
        }
        let Some(date) = exif_capture_date(entry.path()) else {
            stats.no_exif += 1;
            continue;
        };

        let new_path = entry.path().with_file_name(format!("{}{name}", date_prefix(&date)));
        if new_path.exists() {
            tracing::warn!(file = %entry.path().display(), "rename target already exists");
            stats.errors += 1;
            continue;
        }
        match std::fs::rename(entry.path(), &new_path) {
            Ok(()) => {
                tracing::info!(from = name, to = %new_path.display(), "renamed");
                stats.renamed += 1;
            }
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "rename failed");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif_date::tests::{build_jpeg_with_exif, build_tiff};
    use tempfile::TempDir;

    fn exif_jpeg_bytes(date: &str) -> Vec<u8> {
        build_jpeg_with_exif(&build_tiff(Some(date), None, None))
    }

    #[test]
    fn date_prefix_detection() {
        assert!(has_date_prefix("20251108-153045-photo.jpg"));
        assert!(!has_date_prefix("photo.jpg"));
        assert!(!has_date_prefix("20251108_153045-photo.jpg"));
        assert!(!has_date_prefix("2025-11-08-photo.jpg"));
        assert!(!has_date_prefix("short"));
    }

    #[test]
    fn renames_image_with_exif_date() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("Soirée");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("dance.jpg"), exif_jpeg_bytes("2025:11:08 21:14:03")).unwrap();

        let stats = rename_with_exif_dates(tmp.path()).unwrap();

        assert_eq!(stats.total, 1);
        assert_eq!(stats.renamed, 1);
        assert!(nested.join("20251108-211403-dance.jpg").is_file());
        assert!(!nested.join("dance.jpg").exists());
    }

    #[test]
    fn already_prefixed_files_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        let name = "20251108-211403-dance.jpg";
        std::fs::write(tmp.path().join(name), exif_jpeg_bytes("2025:11:08 21:14:03")).unwrap();

        let stats = rename_with_exif_dates(tmp.path()).unwrap();

        assert_eq!(stats.already_renamed, 1);
        assert_eq!(stats.renamed, 0);
        assert!(tmp.path().join(name).is_file());
    }

    #[test]
    fn files_without_exif_are_counted_and_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("scan.jpg"), [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"not an image").unwrap();

        let stats = rename_with_exif_dates(tmp.path()).unwrap();

        assert_eq!(stats.total, 1);
        assert_eq!(stats.no_exif, 1);
        assert!(tmp.path().join("scan.jpg").is_file());
    }

    #[test]
    fn collision_with_existing_target_is_an_error_not_a_panic() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("dance.jpg"), exif_jpeg_bytes("2025:11:08 21:14:03")).unwrap();
        std::fs::write(tmp.path().join("20251108-211403-dance.jpg"), b"occupied").unwrap();

        let stats = rename_with_exif_dates(tmp.path()).unwrap();

        assert_eq!(stats.errors, 1);
        assert!(tmp.path().join("dance.jpg").is_file());
    }
}
