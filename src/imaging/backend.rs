//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: identify, reencode, thumbnail, and render_placeholder.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, zero
//! external dependencies. Everything is statically linked into the binary.

use super::params::{PlaceholderParams, ReencodeParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn longest_edge(self) -> u32 {
        self.width.max(self.height)
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the artifact cache is
/// backend-agnostic; `Sync` because artifact generation runs across files on
/// the rayon pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Re-encode (optionally resizing) into the lossy web format.
    fn reencode(&self, params: &ReencodeParams) -> Result<(), BackendError>;

    /// Execute a thumbnail operation (fill-resize + center crop).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Synthesize a static video-placeholder image.
    fn render_placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and touches output files
    /// without doing any pixel work. Uses Mutex (not RefCell) so it is Sync
    /// and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, every pixel operation fails — for degradation tests.
        pub fail_processing: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Reencode {
            source: String,
            output: String,
            resize_to: Option<(u32, u32)>,
            quality: u8,
        },
        Thumbnail {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u8,
        },
        Placeholder {
            output: String,
            width: u32,
            height: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_processing: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn touch(&self, path: &Path) -> Result<(), BackendError> {
            if self.fail_processing {
                return Err(BackendError::ProcessingFailed("mock failure".into()));
            }
            std::fs::write(path, b"mock artifact")?;
            Ok(())
        }
    }

    /// Delegate so tests can keep a handle on the mock after boxing it into
    /// an owner that takes `Box<dyn ImageBackend>`.
    impl ImageBackend for std::sync::Arc<MockBackend> {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            (**self).identify(path)
        }

        fn reencode(&self, params: &ReencodeParams) -> Result<(), BackendError> {
            (**self).reencode(params)
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
            (**self).thumbnail(params)
        }

        fn render_placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError> {
            (**self).render_placeholder(params)
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn reencode(&self, params: &ReencodeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Reencode {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                resize_to: params.resize_to,
                quality: params.quality.value(),
            });
            self.touch(&params.output)
        }

        fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            self.touch(&params.output)
        }

        fn render_placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Placeholder {
                    output: params.output.to_string_lossy().to_string(),
                    width: params.width,
                    height: params.height,
                });
            self.touch(&params.output)
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_writes_output_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("thumb.avif");
        let backend = MockBackend::new();

        backend
            .thumbnail(&crate::imaging::ThumbnailParams {
                source: "/source.jpg".into(),
                output: output.clone(),
                width: 400,
                height: 400,
                quality: crate::imaging::Quality::new(80),
            })
            .unwrap();

        assert!(output.exists());
        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Thumbnail {
                width: 400,
                height: 400,
                quality: 80,
                ..
            }
        ));
    }

    #[test]
    fn failing_mock_errors_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("thumb.avif");
        let backend = MockBackend::failing();

        let result = backend.thumbnail(&crate::imaging::ThumbnailParams {
            source: "/source.jpg".into(),
            output: output.clone(),
            width: 400,
            height: 400,
            quality: crate::imaging::Quality::new(80),
        });

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
