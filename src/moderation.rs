//! Moderation pipeline: pending uploads, approve/reject, ZIP ingestion.
//!
//! Guest uploads land in the reserved `Pending/` folder under the media root
//! and stay invisible to the catalog until moderated. The lifecycle has
//! exactly two terminal transitions and no undo:
//!
//! - **approve** renames the file into the configured published destination
//! - **reject** deletes it permanently
//!
//! The handle for both is the upload's path relative to the Pending root
//! ([`PendingUpload::name`]), which stays unique even when a ZIP extraction
//! produced nested directories. Handles are validated against traversal
//! before touching the filesystem.
//!
//! This module is pure filesystem mechanics; catalog-cache invalidation on
//! successful transitions is the [`Gallery`](crate::gallery::Gallery)
//! facade's job.

use crate::config::GalleryConfig;
use crate::types::{PendingUpload, classify};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("no pending upload named '{0}'")]
    NotFound(String),
    #[error("invalid upload: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One incoming file handed over by the upload layer: where its bytes were
/// spooled and the name the uploader gave it.
pub struct Upload {
    pub source: PathBuf,
    pub original_name: String,
}

/// What an ingest run accepted, as pending handles.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub accepted: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub name: String,
    pub error: String,
}

/// Per-item partition of a bulk approve/reject. One failure never blocks
/// the remaining items.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub success: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn any_success(&self) -> bool {
        !self.success.is_empty()
    }
}

/// Seam for the "new uploads arrived" notification (e-mail in production).
/// A notification failure is logged and swallowed; it never fails the
/// ingest that triggered it.
pub trait Notifier: Send + Sync {
    fn uploads_received(&self, report: &IngestReport) -> Result<(), Box<dyn std::error::Error>>;
}

/// Default notifier: does nothing.
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn uploads_received(&self, _report: &IngestReport) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

pub struct ModerationQueue {
    pending_dir: PathBuf,
    media_root: PathBuf,
    approved_destination: String,
    notifier: Box<dyn Notifier>,
}

impl ModerationQueue {
    pub fn new(config: &GalleryConfig) -> Self {
        Self::with_notifier(config, Box::new(NoNotifier))
    }

    pub fn with_notifier(config: &GalleryConfig, notifier: Box<dyn Notifier>) -> Self {
        Self {
            pending_dir: config.pending_dir(),
            media_root: config.media_root.clone(),
            approved_destination: config.approved_destination.clone(),
            notifier,
        }
    }

    /// Move uploads into the Pending area. Media files are staged under a
    /// collision-free name; ZIPs are expanded entry-by-entry and then
    /// deleted. Anything that is neither media nor a ZIP rejects the whole
    /// batch up front, before any file is moved.
    pub fn ingest(&self, uploads: Vec<Upload>) -> Result<IngestReport, ModerationError> {
        for upload in &uploads {
            if classify(&upload.original_name).is_none() && !is_zip(&upload.original_name) {
                return Err(ModerationError::Validation(format!(
                    "'{}' is neither a media file nor a ZIP archive",
                    upload.original_name
                )));
            }
        }

        std::fs::create_dir_all(&self.pending_dir)?;
        let mut accepted = Vec::new();
        for upload in uploads {
            if is_zip(&upload.original_name) {
                self.extract_zip(&upload.source, &mut accepted)?;
                std::fs::remove_file(&upload.source)?;
            } else {
                let dest = unique_destination(&self.pending_dir, &upload.original_name);
                move_file(&upload.source, &dest)?;
                accepted.push(relative_handle(&self.pending_dir, &dest));
            }
        }

        let report = IngestReport { accepted };
        tracing::info!(count = report.accepted.len(), "uploads ingested");
        if let Err(e) = self.notifier.uploads_received(&report) {
            tracing::warn!(error = %e, "upload notification failed");
        }
        Ok(report)
    }

    /// Everything currently awaiting moderation, newest first. Entries that
    /// cannot be read are logged and left out rather than failing the list.
    pub fn list_pending(&self) -> Result<Vec<PendingUpload>, ModerationError> {
        if !self.pending_dir.exists() {
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        for entry in WalkDir::new(&self.pending_dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable pending entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }
            let Some(kind) = classify(file_name) else {
                continue;
            };

            let metadata = match std::fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(upload = file_name, error = %e, "skipping unreadable pending entry");
                    continue;
                }
            };
            let rel = entry
                .path()
                .strip_prefix(&self.pending_dir)
                .expect("walkdir stays under its root");
            let folder_path = rel
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(path_to_handle);

            pending.push(PendingUpload {
                name: path_to_handle(rel),
                folder_path,
                kind,
                size_bytes: metadata.len(),
                uploaded_at: DateTime::<Utc>::from(
                    metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
                ),
            });
        }

        pending.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(pending)
    }

    /// Publish a pending upload: rename it into the configured destination
    /// folder, which is created on first use. Nested pending layouts are
    /// flattened to the bare file name on publish.
    pub fn approve(&self, name: &str) -> Result<(), ModerationError> {
        let source = self.resolve(name)?;
        let dest_dir = self.media_root.join(&self.approved_destination);
        std::fs::create_dir_all(&dest_dir)?;

        let file_name = source
            .file_name()
            .ok_or_else(|| ModerationError::Validation(format!("'{name}' has no file name")))?;
        let dest = unique_destination(&dest_dir, &file_name.to_string_lossy());
        move_file(&source, &dest)?;
        tracing::info!(upload = name, dest = %dest.display(), "upload approved");
        Ok(())
    }

    /// Delete a pending upload permanently. There is no undo.
    pub fn reject(&self, name: &str) -> Result<(), ModerationError> {
        let source = self.resolve(name)?;
        std::fs::remove_file(&source)?;
        tracing::info!(upload = name, "upload rejected");
        Ok(())
    }

    pub fn batch_approve(&self, names: &[String]) -> BatchOutcome {
        self.batch(names, |n| self.approve(n))
    }

    pub fn batch_reject(&self, names: &[String]) -> BatchOutcome {
        self.batch(names, |n| self.reject(n))
    }

    fn batch(
        &self,
        names: &[String],
        op: impl Fn(&str) -> Result<(), ModerationError>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for name in names {
            match op(name) {
                Ok(()) => outcome.success.push(name.clone()),
                Err(e) => outcome.failed.push(BatchFailure {
                    name: name.clone(),
                    error: e.to_string(),
                }),
            }
        }
        outcome
    }

    /// Validate a handle and resolve it under the Pending root.
    fn resolve(&self, name: &str) -> Result<PathBuf, ModerationError> {
        let rel = Path::new(name);
        let escapes = rel.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if name.is_empty() || escapes {
            return Err(ModerationError::Validation(format!(
                "'{name}' is not a valid pending handle"
            )));
        }

        let path = self.pending_dir.join(rel);
        if !path.is_file() {
            return Err(ModerationError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Expand a ZIP into the Pending area. Directory entries, hidden files,
    /// `__MACOSX` resource junk, traversal attempts and non-media entries
    /// are skipped; nested entry paths are preserved so the admin view can
    /// show where each file came from.
    fn extract_zip(
        &self,
        archive_path: &Path,
        accepted: &mut Vec<String>,
    ) -> Result<(), ModerationError> {
        let file = std::fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let Some(rel) = entry.enclosed_name() else {
                tracing::warn!(entry = entry.name(), "skipping unsafe ZIP entry path");
                continue;
            };
            if rel.components().any(|c| match c {
                Component::Normal(os) => {
                    let s = os.to_string_lossy();
                    s.starts_with('.') || s == "__MACOSX"
                }
                _ => true,
            }) {
                continue;
            }
            let Some(file_name) = rel.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            if classify(&file_name).is_none() {
                continue;
            }

            let target_dir = match rel.parent() {
                Some(p) if !p.as_os_str().is_empty() => self.pending_dir.join(p),
                _ => self.pending_dir.clone(),
            };
            std::fs::create_dir_all(&target_dir)?;
            let dest = unique_destination(&target_dir, &file_name);

            let mut out = std::fs::File::create(&dest)?;
            std::io::copy(&mut entry, &mut out)?;
            accepted.push(relative_handle(&self.pending_dir, &dest));
        }
        Ok(())
    }
}

fn is_zip(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

/// Forward-slash handle for a path under `base`.
fn relative_handle(base: &Path, path: &Path) -> String {
    path_to_handle(path.strip_prefix(base).expect("destination is under base"))
}

fn path_to_handle(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `name`, or `name-1`, `name-2`, ... until the path is free.
fn unique_destination(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s.to_string(), Some(e.to_string())),
        _ => (name.to_string(), None),
    };
    for i in 1.. {
        let attempt = match &ext {
            Some(e) => dir.join(format!("{stem}-{i}.{e}")),
            None => dir.join(format!("{stem}-{i}")),
        };
        if !attempt.exists() {
            return attempt;
        }
    }
    unreachable!()
}

/// Rename, falling back to copy+delete for cross-filesystem moves (upload
/// spool directories often live on a different mount than the media tree).
fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    match std::fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(source, dest)?;
            std::fs::remove_file(source)
        }
    }
}
