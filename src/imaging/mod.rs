//! Image processing — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Web re-encode** | Lanczos3 + AVIF encoder (rav1e) |
//! | **Thumbnail** | `resize_to_fill` center crop |
//! | **Video placeholder** | procedural render |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{bounded_dimensions, cover_dimensions};
pub use params::{PlaceholderParams, Quality, ReencodeParams, ThumbnailParams};
pub use rust_backend::RustBackend;
