//! Pure Rust image processing backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, GIF, WebP, BMP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::imageops` with `Lanczos3` filter |
//! | Thumbnail crop | `image::DynamicImage::resize_to_fill` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Video placeholder | procedural render, no video decoding at all |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{PlaceholderParams, ReencodeParams, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode and save as AVIF using rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
}

/// Render the static video placeholder: dark gradient backdrop, a ring, and
/// a play triangle. Purely synthetic so no video codec is ever linked in.
fn render_placeholder_image(width: u32, height: u32) -> RgbImage {
    const TOP: [f32; 3] = [44.0, 44.0, 56.0];
    const BOTTOM: [f32; 3] = [16.0, 16.0, 24.0];
    const ACCENT: Rgb<u8> = Rgb([212, 175, 55]);
    const GLYPH: Rgb<u8> = Rgb([235, 235, 240]);

    let mut img = RgbImage::from_fn(width, height, |_, y| {
        let t = y as f32 / height.max(1) as f32;
        Rgb([
            (TOP[0] + (BOTTOM[0] - TOP[0]) * t) as u8,
            (TOP[1] + (BOTTOM[1] - TOP[1]) * t) as u8,
            (TOP[2] + (BOTTOM[2] - TOP[2]) * t) as u8,
        ])
    });

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = width.min(height) as f32 * 0.28;
    let ring_width = (radius * 0.06).max(2.0);

    // Play triangle vertices, nudged right so it reads as centered
    let ax = cx - radius * 0.38;
    let ay_top = cy - radius * 0.52;
    let ay_bot = cy + radius * 0.52;
    let bx = cx + radius * 0.58;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();

            if (dist - radius).abs() <= ring_width {
                img.put_pixel(x, y, ACCENT);
                continue;
            }

            // Inside the triangle: left edge vertical, apex on the right
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            if px >= ax && px <= bx {
                let span = (bx - px) / (bx - ax);
                let half = (ay_bot - ay_top) / 2.0 * span;
                if (py - cy).abs() <= half {
                    img.put_pixel(x, y, GLYPH);
                }
            }
        }
    }

    img
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn reencode(&self, params: &ReencodeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let output = match params.resize_to {
            Some((w, h)) => img.resize_exact(w, h, FilterType::Lanczos3),
            None => img,
        };
        save_avif(&output, &params.output, params.quality.value())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        // Fill-resize then center-crop to exact dimensions
        let cropped = img.resize_to_fill(params.width, params.height, FilterType::Lanczos3);
        save_avif(&cropped, &params.output, params.quality.value())
    }

    fn render_placeholder(&self, params: &PlaceholderParams) -> Result<(), BackendError> {
        let img = render_placeholder_image(params.width, params.height);
        save_avif(
            &DynamicImage::ImageRgb8(img),
            &params.output,
            params.quality.value(),
        )
    }
}
