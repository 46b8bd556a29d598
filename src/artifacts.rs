//! Derived-artifact store: thumbnails, web-optimized renditions, video
//! placeholders.
//!
//! Artifacts are content-addressed by the SHA-256 of the *logical path*
//! ([`crate::identity::media_key`]) and written as `{key}.avif` into two flat
//! cache directories. Freshness is mtime-based: an artifact whose mtime is at
//! least the source's mtime is reused, anything older is regenerated in
//! place. Video placeholders carry no pixel data from the source, so they are
//! generated exactly once and only swept away when the video disappears.
//!
//! Every `ensure_*` call reports whether it hit the cache
//! ([`Outcome::Cached`]) or did pixel work ([`Outcome::Generated`]), which is
//! what lets a second optimize-all run prove its own idempotence.

use crate::config::GalleryConfig;
use crate::identity::media_key;
use crate::imaging::{
    ImageBackend, PlaceholderParams, Quality, ReencodeParams, ThumbnailParams, bounded_dimensions,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] crate::imaging::BackendError),
}

/// How an `ensure_*` call was satisfied. Both carry the on-disk artifact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Generated(PathBuf),
    Cached(PathBuf),
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Generated(p) | Outcome::Cached(p) => p,
        }
    }

    pub fn was_generated(&self) -> bool {
        matches!(self, Outcome::Generated(_))
    }
}

/// Result of an orphan sweep over the cache directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepStats {
    pub total: usize,
    pub deleted: usize,
    pub kept: usize,
}

/// Persistent cache of derived artifacts, parameterized over the pixel
/// backend so tests can swap in a recording mock.
pub struct ArtifactStore {
    thumbnails_dir: PathBuf,
    web_dir: PathBuf,
    thumbnail_size: u32,
    thumbnail_quality: Quality,
    web_max_edge: u32,
    web_quality: Quality,
    backend: Box<dyn ImageBackend>,
}

impl ArtifactStore {
    /// Create the store, making sure both cache directories exist.
    pub fn new(
        config: &GalleryConfig,
        backend: Box<dyn ImageBackend>,
    ) -> Result<Self, ArtifactError> {
        let thumbnails_dir = config.thumbnails_dir();
        let web_dir = config.web_dir();
        std::fs::create_dir_all(&thumbnails_dir)?;
        std::fs::create_dir_all(&web_dir)?;

        Ok(Self {
            thumbnails_dir,
            web_dir,
            thumbnail_size: config.thumbnail_size,
            thumbnail_quality: Quality::new(config.thumbnail_quality),
            web_max_edge: config.web_max_edge,
            web_quality: Quality::new(config.web_quality),
            backend,
        })
    }

    /// On-disk path a thumbnail (or video placeholder) for `logical_path`
    /// would live at, whether or not it exists yet.
    pub fn thumbnail_path(&self, logical_path: &str) -> PathBuf {
        self.thumbnails_dir
            .join(format!("{}.avif", media_key(logical_path)))
    }

    /// On-disk path of the web-optimized rendition for `logical_path`.
    pub fn web_path(&self, logical_path: &str) -> PathBuf {
        self.web_dir
            .join(format!("{}.avif", media_key(logical_path)))
    }

    /// Square center-cropped grid thumbnail for an image.
    pub fn ensure_thumbnail(
        &self,
        source: &Path,
        logical_path: &str,
    ) -> Result<Outcome, ArtifactError> {
        let output = self.thumbnail_path(logical_path);
        if is_fresh(&output, source) {
            return Ok(Outcome::Cached(output));
        }

        self.backend.thumbnail(&ThumbnailParams {
            source: source.to_path_buf(),
            output: output.clone(),
            width: self.thumbnail_size,
            height: self.thumbnail_size,
            quality: self.thumbnail_quality,
        })?;
        Ok(Outcome::Generated(output))
    }

    /// Full-view rendition with the longest edge bounded. Images already
    /// within bounds are re-encoded without resizing; nothing is upscaled.
    pub fn ensure_web_optimized(
        &self,
        source: &Path,
        logical_path: &str,
    ) -> Result<Outcome, ArtifactError> {
        let output = self.web_path(logical_path);
        if is_fresh(&output, source) {
            return Ok(Outcome::Cached(output));
        }

        let dims = self.backend.identify(source)?;
        let resize_to = bounded_dimensions((dims.width, dims.height), self.web_max_edge);

        self.backend.reencode(&ReencodeParams {
            source: source.to_path_buf(),
            output: output.clone(),
            resize_to,
            quality: self.web_quality,
        })?;
        Ok(Outcome::Generated(output))
    }

    /// Static placeholder standing in for a video in the grid. Not derived
    /// from the video's content, so existence alone means fresh.
    pub fn ensure_video_placeholder(&self, logical_path: &str) -> Result<Outcome, ArtifactError> {
        let output = self.thumbnail_path(logical_path);
        if output.exists() {
            return Ok(Outcome::Cached(output));
        }

        self.backend.render_placeholder(&PlaceholderParams {
            output: output.clone(),
            width: self.thumbnail_size,
            height: self.thumbnail_size,
            quality: self.thumbnail_quality,
        })?;
        Ok(Outcome::Generated(output))
    }

    /// Delete artifacts whose key no longer corresponds to any live media
    /// file. `valid_keys` is the full set of [`media_key`]s for the current
    /// tree (Pending excluded — its files never had artifacts to begin with).
    pub fn sweep(&self, valid_keys: &HashSet<String>) -> Result<SweepStats, ArtifactError> {
        let mut stats = SweepStats::default();
        for dir in [&self.thumbnails_dir, &self.web_dir] {
            let before = stats;
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                stats.total += 1;
                if valid_keys.contains(stem) {
                    stats.kept += 1;
                } else {
                    std::fs::remove_file(&path)?;
                    stats.deleted += 1;
                }
            }
            tracing::info!(
                dir = %dir.display(),
                scanned = stats.total - before.total,
                deleted = stats.deleted - before.deleted,
                "cache sweep"
            );
        }
        Ok(stats)
    }
}

/// An artifact is fresh when it exists and its mtime is not older than the
/// source's. Clock skew can only cause a spurious regeneration, never a
/// stale artifact being served.
fn is_fresh(artifact: &Path, source: &Path) -> bool {
    let Ok(artifact_mtime) = std::fs::metadata(artifact).and_then(|m| m.modified()) else {
        return false;
    };
    let Ok(source_mtime) = std::fs::metadata(source).and_then(|m| m.modified()) else {
        return false;
    };
    artifact_mtime >= source_mtime
}
