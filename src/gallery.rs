//! The gallery facade: one handle wiring config, artifact store, catalog
//! cache and moderation queue together.
//!
//! The collaborator layer (HTTP server, CLI) talks only to [`Gallery`];
//! every error it can see is a [`GalleryError`], collapsed to four kinds so
//! callers can map them mechanically (404 for `NotFound`, 400 for
//! `Validation`, 500 for the rest).
//!
//! Cache discipline lives here: approve and reject invalidate the catalog
//! cache synchronously on success, and a batch invalidates once if anything
//! in it succeeded, so the next catalog read always reflects moderation.

use crate::archive::{self, ArchiveError};
use crate::artifacts::{ArtifactError, ArtifactStore, SweepStats};
use crate::cache::{CatalogCache, directory_signature};
use crate::config::GalleryConfig;
use crate::imaging::{ImageBackend, RustBackend};
use crate::moderation::{
    BatchOutcome, IngestReport, ModerationError, ModerationQueue, Notifier, Upload,
};
use crate::scan::{ScanError, collect_media_keys, scan};
use crate::types::{Catalog, MediaKind, PENDING_DIR, PendingUpload, classify};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{Seek, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl From<ScanError> for GalleryError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Io(io) => GalleryError::Io(io),
        }
    }
}

impl From<ArtifactError> for GalleryError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::Io(io) => GalleryError::Io(io),
            ArtifactError::Backend(b) => GalleryError::Artifact(b.to_string()),
        }
    }
}

impl From<ModerationError> for GalleryError {
    fn from(e: ModerationError) -> Self {
        match e {
            ModerationError::NotFound(n) => GalleryError::NotFound(n),
            ModerationError::Validation(v) => GalleryError::Validation(v),
            ModerationError::Io(io) => GalleryError::Io(io),
            // A ZIP the library cannot open is the uploader's problem
            ModerationError::Zip(z) => GalleryError::Validation(z.to_string()),
        }
    }
}

impl From<ArchiveError> for GalleryError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::NotFound(n) => GalleryError::NotFound(n),
            ArchiveError::Validation(v) => GalleryError::Validation(v),
            ArchiveError::Io(io) => GalleryError::Io(io),
            ArchiveError::Zip(z) => GalleryError::Io(std::io::Error::other(z)),
        }
    }
}

/// A catalog read, with its cache provenance.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub catalog: Arc<Catalog>,
    pub cached: bool,
}

/// Result of an optimize-all run. A second run over an unchanged tree
/// reports `optimized == 0` and `already_optimized == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeStats {
    /// Media files considered.
    pub total: usize,
    /// Files for which at least one artifact was (re)generated.
    pub optimized: usize,
    /// Files whose artifacts were all current already.
    pub already_optimized: usize,
    /// Files whose artifact generation failed (logged, non-fatal).
    pub errors: usize,
}

pub struct Gallery {
    config: GalleryConfig,
    store: ArtifactStore,
    cache: CatalogCache,
    queue: ModerationQueue,
}

impl Gallery {
    /// Open a gallery with the production image backend.
    pub fn new(config: GalleryConfig) -> Result<Self, GalleryError> {
        Self::with_backend(config, Box::new(RustBackend::new()))
    }

    pub fn with_backend(
        config: GalleryConfig,
        backend: Box<dyn ImageBackend>,
    ) -> Result<Self, GalleryError> {
        let store = ArtifactStore::new(&config, backend)?;
        let cache = CatalogCache::new(config.cache_ttl());
        let queue = ModerationQueue::new(&config);
        Ok(Self {
            config,
            store,
            cache,
            queue,
        })
    }

    /// Like [`Gallery::with_backend`], with an upload notifier attached.
    pub fn with_notifier(
        config: GalleryConfig,
        backend: Box<dyn ImageBackend>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, GalleryError> {
        let store = ArtifactStore::new(&config, backend)?;
        let cache = CatalogCache::new(config.cache_ttl());
        let queue = ModerationQueue::with_notifier(&config, notifier);
        Ok(Self {
            config,
            store,
            cache,
            queue,
        })
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// The current catalog, served from cache when still valid.
    pub fn catalog(&self) -> Result<CatalogView, GalleryError> {
        let signature = directory_signature(&self.config.media_root);
        let (catalog, cached) = self
            .cache
            .get_with(signature, || scan(&self.config, &self.store))?;
        Ok(CatalogView { catalog, cached })
    }

    pub fn pending_list(&self) -> Result<Vec<PendingUpload>, GalleryError> {
        Ok(self.queue.list_pending()?)
    }

    /// Stage uploads for moderation. Does not touch the catalog cache —
    /// pending files are invisible to the catalog by definition.
    pub fn ingest_uploads(&self, uploads: Vec<Upload>) -> Result<IngestReport, GalleryError> {
        Ok(self.queue.ingest(uploads)?)
    }

    pub fn approve(&self, name: &str) -> Result<(), GalleryError> {
        self.queue.approve(name)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn reject(&self, name: &str) -> Result<(), GalleryError> {
        self.queue.reject(name)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn batch_approve(&self, names: &[String]) -> BatchOutcome {
        let outcome = self.queue.batch_approve(names);
        if outcome.any_success() {
            self.cache.invalidate();
        }
        outcome
    }

    pub fn batch_reject(&self, names: &[String]) -> BatchOutcome {
        let outcome = self.queue.batch_reject(names);
        if outcome.any_success() {
            self.cache.invalidate();
        }
        outcome
    }

    pub fn export_all<W: Write + Seek>(&self, sink: W) -> Result<usize, GalleryError> {
        Ok(archive::export_all(&self.config, sink)?)
    }

    pub fn export_folder<W: Write + Seek>(
        &self,
        folder_path: &str,
        sink: W,
    ) -> Result<usize, GalleryError> {
        Ok(archive::export_folder(&self.config, folder_path, sink)?)
    }

    /// Generate or refresh every artifact for the published tree, in
    /// parallel. Idempotent: re-running over an unchanged tree does no
    /// pixel work.
    pub fn optimize_all(&self) -> Result<OptimizeStats, GalleryError> {
        let files = self.published_files()?;

        let stats = files
            .par_iter()
            .map(|(source, logical, kind)| {
                let outcomes = match kind {
                    MediaKind::Image => [
                        self.store.ensure_web_optimized(source, logical),
                        self.store.ensure_thumbnail(source, logical),
                    ]
                    .into_iter()
                    .collect::<Vec<_>>(),
                    MediaKind::Video => vec![self.store.ensure_video_placeholder(logical)],
                };

                let mut delta = OptimizeStats {
                    total: 1,
                    ..OptimizeStats::default()
                };
                if let Some(e) = outcomes.iter().find_map(|o| o.as_ref().err()) {
                    tracing::warn!(file = %logical, error = %e, "optimize failed");
                    delta.errors = 1;
                } else if outcomes.iter().any(|o| {
                    o.as_ref().is_ok_and(crate::artifacts::Outcome::was_generated)
                }) {
                    delta.optimized = 1;
                } else {
                    delta.already_optimized = 1;
                }
                delta
            })
            .reduce(OptimizeStats::default, |a, b| OptimizeStats {
                total: a.total + b.total,
                optimized: a.optimized + b.optimized,
                already_optimized: a.already_optimized + b.already_optimized,
                errors: a.errors + b.errors,
            });

        tracing::info!(
            total = stats.total,
            optimized = stats.optimized,
            errors = stats.errors,
            "optimize run complete"
        );
        Ok(stats)
    }

    /// Delete cached artifacts that no longer correspond to any live file.
    pub fn sweep_cache(&self) -> Result<SweepStats, GalleryError> {
        let keys = collect_media_keys(&self.config)?;
        Ok(self.store.sweep(&keys)?)
    }

    /// Every published media file as `(source, logical_path, kind)`.
    fn published_files(&self) -> Result<Vec<(PathBuf, String, MediaKind)>, GalleryError> {
        if !self.config.media_root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.config.media_root)
            .min_depth(1)
            .max_depth(3)
            .into_iter()
            .filter_entry(|e| {
                let Some(name) = e.file_name().to_str() else {
                    return false;
                };
                !name.starts_with('.') && !(e.depth() == 1 && name == PENDING_DIR)
            });

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.depth() != 3 || !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(kind) = classify(name) else {
                continue;
            };
            let rel = entry
                .path()
                .strip_prefix(&self.config.media_root)
                .expect("walkdir stays under its root");
            let logical = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((entry.path().to_path_buf(), logical, kind));
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{test_config, write_media_file};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn gallery_with_dims(tmp: &TempDir, dims: Vec<Dimensions>) -> Gallery {
        Gallery::with_backend(
            test_config(tmp),
            Box::new(MockBackend::with_dimensions(dims)),
        )
        .unwrap()
    }

    fn small(n: usize) -> Vec<Dimensions> {
        vec![
            Dimensions {
                width: 800,
                height: 600
            };
            n
        ]
    }

    fn spool(tmp: &TempDir, name: &str) -> Upload {
        let source = tmp.path().join("spool").join(name);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, b"uploaded bytes").unwrap();
        Upload {
            source,
            original_name: name.to_string(),
        }
    }

    #[test]
    fn second_catalog_read_is_cached() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, small(1));
        write_media_file(gallery.config(), "C/F/a.jpg");

        let first = gallery.catalog().unwrap();
        assert!(!first.cached);
        assert_eq!(first.catalog.file_count(), 1);

        let second = gallery.catalog().unwrap();
        assert!(second.cached);
    }

    #[test]
    fn approve_makes_upload_visible_in_catalog() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, small(2));
        write_media_file(gallery.config(), "C/F/existing.jpg");

        gallery.catalog().unwrap();
        gallery
            .ingest_uploads(vec![spool(&tmp, "guest.jpg")])
            .unwrap();
        assert_eq!(gallery.pending_list().unwrap().len(), 1);

        gallery.approve("guest.jpg").unwrap();

        let view = gallery.catalog().unwrap();
        assert!(!view.cached);
        let dest = &gallery.config().approved_destination;
        let (category, folder) = dest.split_once('/').unwrap();
        let folder = view.catalog.find_folder(category, folder).unwrap();
        assert!(folder.files.iter().any(|f| f.name == "guest.jpg"));
        assert!(gallery.pending_list().unwrap().is_empty());
    }

    #[test]
    fn reject_removes_upload_and_second_reject_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, vec![]);
        gallery
            .ingest_uploads(vec![spool(&tmp, "bad.jpg")])
            .unwrap();

        gallery.reject("bad.jpg").unwrap();
        assert!(gallery.pending_list().unwrap().is_empty());

        let again = gallery.reject("bad.jpg");
        assert!(matches!(again, Err(GalleryError::NotFound(_))));
    }

    #[test]
    fn batch_approve_partitions_and_invalidates_once() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, small(4));
        write_media_file(gallery.config(), "C/F/existing.jpg");
        gallery.catalog().unwrap();
        gallery
            .ingest_uploads(vec![spool(&tmp, "a.jpg"), spool(&tmp, "b.jpg")])
            .unwrap();

        let outcome =
            gallery.batch_approve(&["a.jpg".into(), "b.jpg".into(), "missing.jpg".into()]);

        assert_eq!(outcome.success, vec!["a.jpg", "b.jpg"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].name, "missing.jpg");
        // Two successes, one invalidation for the whole batch
        assert_eq!(gallery.cache.invalidations(), 1);
        assert!(!gallery.catalog().unwrap().cached);

        // A batch with no successes leaves the cache alone
        let outcome = gallery.batch_reject(&["missing.jpg".into()]);
        assert!(!outcome.any_success());
        assert_eq!(gallery.cache.invalidations(), 1);
    }

    #[test]
    fn optimize_all_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, small(2));
        write_media_file(gallery.config(), "C/F/a.jpg");
        write_media_file(gallery.config(), "C/F/b.jpg");
        write_media_file(gallery.config(), "C/F/clip.mp4");
        write_media_file(gallery.config(), "Pending/waiting.jpg");

        let first = gallery.optimize_all().unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.optimized, 3);
        assert_eq!(first.errors, 0);

        let second = gallery.optimize_all().unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.optimized, 0);
        assert_eq!(second.already_optimized, 3);
    }

    #[test]
    fn optimize_counts_failures_without_aborting() {
        let tmp = TempDir::new().unwrap();
        let gallery =
            Gallery::with_backend(test_config(&tmp), Box::new(MockBackend::failing())).unwrap();
        write_media_file(gallery.config(), "C/F/a.jpg");
        write_media_file(gallery.config(), "C/F/clip.mp4");

        let stats = gallery.optimize_all().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.optimized, 0);
    }

    #[test]
    fn sweep_cache_reclaims_orphans() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, small(2));
        let doomed = write_media_file(gallery.config(), "C/F/doomed.jpg");
        write_media_file(gallery.config(), "C/F/kept.jpg");
        gallery.optimize_all().unwrap();

        std::fs::remove_file(doomed).unwrap();
        let stats = gallery.sweep_cache().unwrap();

        // doomed.jpg had a thumbnail and a web rendition
        assert_eq!(stats.deleted, 2);
        assert_eq!(stats.kept, 2);
    }

    #[test]
    fn export_goes_through_the_facade() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery_with_dims(&tmp, vec![]);
        write_media_file(gallery.config(), "C/F/a.jpg");
        write_media_file(gallery.config(), "Pending/waiting.jpg");

        let mut sink = Cursor::new(Vec::new());
        assert_eq!(gallery.export_all(&mut sink).unwrap(), 1);

        let result = gallery.export_folder("C/Nope", &mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(GalleryError::NotFound(_))));
    }
}
