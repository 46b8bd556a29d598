//! Gallery configuration.
//!
//! One flat TOML file; every field has a default so a missing file means a
//! working gallery with conventional paths. Knobs that are genuinely
//! deployment decisions live here (roots, TTL, artifact sizing, the
//! professional/guest name heuristic, the approve destination). The media
//! extension allow-lists are compiled-in constants in [`crate::types`] —
//! changing what counts as media is a code decision, not configuration.

use crate::types::PENDING_DIR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Root of the published media tree (`{category}/{folder}/{file}`).
    pub media_root: PathBuf,
    /// Root of the derived-artifact cache; thumbnails and web-optimized
    /// renditions live in subdirectories under it.
    pub cache_root: PathBuf,
    /// Catalog cache time-to-live in seconds. Bounds staleness even when a
    /// mutation bypasses the invalidation hooks.
    pub cache_ttl_secs: u64,
    /// Edge size of the square grid thumbnail, in pixels.
    pub thumbnail_size: u32,
    /// AVIF quality for thumbnails (1-100).
    pub thumbnail_quality: u8,
    /// Longest-edge bound for web-optimized renditions, in pixels.
    pub web_max_edge: u32,
    /// AVIF quality for web-optimized renditions (1-100).
    pub web_quality: u8,
    /// Case-insensitive substrings marking a category as professional
    /// content. Anything that matches none of them is guest content.
    pub professional_markers: Vec<String>,
    /// `{category}/{folder}` that approved uploads are moved into. Created
    /// on first approve if absent.
    pub approved_destination: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            cache_root: PathBuf::from(".cache"),
            cache_ttl_secs: 300,
            thumbnail_size: 400,
            thumbnail_quality: 80,
            web_max_edge: 2048,
            web_quality: 85,
            professional_markers: vec![
                "professionnel".into(),
                "photographe".into(),
                "pro".into(),
            ],
            approved_destination: "Photos Invités/Téléversements".into(),
        }
    }
}

impl GalleryConfig {
    /// Load from a TOML file. A missing file yields the defaults; a present
    /// but malformed file is an error — silently ignoring typos in a config
    /// that controls destructive moderation paths is worse than failing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Directory holding `{hash}.avif` thumbnails and video placeholders.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.cache_root.join("thumbnails")
    }

    /// Directory holding `{hash}.avif` web-optimized renditions.
    pub fn web_dir(&self) -> PathBuf {
        self.cache_root.join("web-optimized")
    }

    /// The moderation staging area under the media root.
    pub fn pending_dir(&self) -> PathBuf {
        self.media_root.join(PENDING_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let cfg = GalleryConfig::default();
        assert_eq!(cfg.thumbnail_size, 400);
        assert_eq!(cfg.web_max_edge, 2048);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert!(cfg.approved_destination.contains('/'));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = GalleryConfig::load(&tmp.path().join("galerie.toml")).unwrap();
        assert_eq!(cfg.media_root, PathBuf::from("media"));
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("galerie.toml");
        std::fs::write(
            &path,
            "media_root = \"/srv/wedding\"\ncache_ttl_secs = 60\n",
        )
        .unwrap();

        let cfg = GalleryConfig::load(&path).unwrap();
        assert_eq!(cfg.media_root, PathBuf::from("/srv/wedding"));
        assert_eq!(cfg.cache_ttl_secs, 60);
        // Untouched fields keep their defaults
        assert_eq!(cfg.thumbnail_quality, 80);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("galerie.toml");
        std::fs::write(&path, "media_roott = \"typo\"\n").unwrap();
        assert!(matches!(
            GalleryConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn derived_dirs_hang_off_roots() {
        let cfg = GalleryConfig {
            media_root: PathBuf::from("/data/media"),
            cache_root: PathBuf::from("/data/cache"),
            ..GalleryConfig::default()
        };
        assert_eq!(cfg.thumbnails_dir(), PathBuf::from("/data/cache/thumbnails"));
        assert_eq!(cfg.web_dir(), PathBuf::from("/data/cache/web-optimized"));
        assert_eq!(cfg.pending_dir(), PathBuf::from("/data/media/Pending"));
    }
}
