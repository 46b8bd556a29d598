//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`crate::artifacts`] (which decides which renditions to
//! create and where they live) and the [`backend`](super::backend) (which
//! does the actual pixel work). The separation allows swapping backends
//! (e.g. a recording mock in tests) without changing cache logic.

use std::path::PathBuf;

/// Quality setting for lossy AVIF encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for a web-optimized re-encode.
///
/// `resize_to` is `None` when the source is already within bounds — the
/// image is re-encoded at the same dimensions, format conversion only.
#[derive(Debug, Clone, PartialEq)]
pub struct ReencodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub resize_to: Option<(u32, u32)>,
    pub quality: Quality,
}

/// Parameters for a thumbnail operation (fill-resize + center crop).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Final crop dimensions.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for rendering a static video-placeholder image. Carries no
/// source path — the placeholder is synthesized, not decoded from the video.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderParams {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
