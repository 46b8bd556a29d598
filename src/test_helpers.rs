//! Shared test fixtures: temp media trees, synthetic images, ZIP payloads.
//!
//! Compiled only for tests (`#[cfg(test)]` in lib.rs). Most tests only need
//! a file to *exist* with an allow-listed extension — [`write_media_file`]
//! writes a few placeholder bytes, which is enough for everything that goes
//! through the [`MockBackend`](crate::imaging::backend::tests::MockBackend).
//! Tests that exercise the real pixel backend use [`write_jpeg`].

use crate::config::GalleryConfig;
use image::{ImageEncoder, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Config rooted inside a temp dir: `media/` tree, `cache/` artifacts.
pub fn test_config(tmp: &TempDir) -> GalleryConfig {
    GalleryConfig {
        media_root: tmp.path().join("media"),
        cache_root: tmp.path().join("cache"),
        ..GalleryConfig::default()
    }
}

/// Create `media_root/{relative}` (and its parents) with placeholder bytes.
/// Returns the created path.
pub fn write_media_file(config: &GalleryConfig, relative: &str) -> PathBuf {
    let path = config.media_root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"media bytes").unwrap();
    path
}

/// Write a small but real JPEG, decodable by the production backend.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Build a ZIP file at `path` from `(entry_name, bytes)` pairs. Entry names
/// may contain `/` to produce nested layouts.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}
