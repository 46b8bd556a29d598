//! ZIP export of original media files.
//!
//! Guests can pull down one folder or the whole published gallery as a
//! deflate ZIP of the *originals* — derived artifacts never go into an
//! archive. Entries are streamed file-at-a-time through a fixed copy
//! buffer, so memory use is independent of gallery size; the sink only
//! needs `Write + Seek` (the ZIP trailer requires seeking), letting the
//! HTTP layer hand in a spooled temp file or a seekable response body.
//!
//! Any mid-stream I/O error aborts the export with an error. A truncated
//! archive that looks successful is worse than a failed download.

use crate::config::GalleryConfig;
use crate::types::{PENDING_DIR, classify};
use std::io::{Seek, Write};
use std::path::{Component, Path};
use thiserror::Error;
use zip::write::SimpleFileOptions;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("no folder at '{0}'")]
    NotFound(String),
    #[error("invalid folder path: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .large_file(true)
}

/// Export every published media file, entries named
/// `{category}/{folder}/{file}`. `Pending` never appears in an export.
/// Returns the number of files written.
pub fn export_all<W: Write + Seek>(
    config: &GalleryConfig,
    sink: W,
) -> Result<usize, ArchiveError> {
    let mut writer = zip::ZipWriter::new(sink);
    let mut written = 0;

    for category in media_subdirs(&config.media_root)? {
        if category == PENDING_DIR {
            continue;
        }
        let category_path = config.media_root.join(&category);
        for folder in media_subdirs(&category_path)? {
            written += write_folder_entries(
                &mut writer,
                &category_path.join(&folder),
                &format!("{category}/{folder}"),
            )?;
        }
    }

    writer.finish()?;
    tracing::info!(files = written, "full gallery export");
    Ok(written)
}

/// Export one folder, addressed as `{category}/{folder}`. Entries are
/// rooted at the folder name. Returns the number of files written.
pub fn export_folder<W: Write + Seek>(
    config: &GalleryConfig,
    folder_path: &str,
    sink: W,
) -> Result<usize, ArchiveError> {
    let (category, folder) = validate_folder_path(folder_path)?;

    let dir = config.media_root.join(&category).join(&folder);
    // Belt and braces on top of the component check: the resolved directory
    // must still live under the media root after symlinks.
    if !dir.is_dir() {
        return Err(ArchiveError::NotFound(folder_path.to_string()));
    }
    let canonical = dir.canonicalize()?;
    let root = config.media_root.canonicalize()?;
    if !canonical.starts_with(&root) {
        return Err(ArchiveError::Validation(folder_path.to_string()));
    }

    let mut writer = zip::ZipWriter::new(sink);
    let written = write_folder_entries(&mut writer, &dir, &folder)?;
    writer.finish()?;
    tracing::info!(folder = folder_path, files = written, "folder export");
    Ok(written)
}

/// Exactly `{category}/{folder}`, both plain path segments, category not
/// the staging area.
fn validate_folder_path(folder_path: &str) -> Result<(String, String), ArchiveError> {
    let invalid = || ArchiveError::Validation(folder_path.to_string());

    let mut components = Path::new(folder_path).components();
    let category = match components.next() {
        Some(Component::Normal(c)) => c.to_string_lossy().to_string(),
        _ => return Err(invalid()),
    };
    let folder = match components.next() {
        Some(Component::Normal(f)) => f.to_string_lossy().to_string(),
        _ => return Err(invalid()),
    };
    if components.next().is_some() || category == PENDING_DIR {
        return Err(invalid());
    }
    Ok((category, folder))
}

fn write_folder_entries<W: Write + Seek>(
    writer: &mut zip::ZipWriter<W>,
    dir: &Path,
    entry_prefix: &str,
) -> Result<usize, ArchiveError> {
    let mut written = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || classify(&name).is_none() {
            continue;
        }

        writer.start_file(format!("{entry_prefix}/{name}"), zip_options())?;
        let mut file = std::fs::File::open(entry.path())?;
        std::io::copy(&mut file, writer)?;
        written += 1;
    }
    Ok(written)
}

/// Visible subdirectory names, empty list for a missing parent.
fn media_subdirs(dir: &Path) -> Result<Vec<String>, ArchiveError> {
    let read = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in read {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_config, write_media_file};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn export_all_covers_published_tree_without_pending() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "Ceremony/Morning/a.jpg");
        write_media_file(&config, "Party/Dance/b.mp4");
        write_media_file(&config, "Pending/waiting.jpg");
        write_media_file(&config, "Ceremony/Morning/notes.txt");

        let mut sink = Cursor::new(Vec::new());
        let written = export_all(&config, &mut sink).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            entry_names(sink.into_inner()),
            vec!["Ceremony/Morning/a.jpg", "Party/Dance/b.mp4"]
        );
    }

    #[test]
    fn export_folder_roots_entries_at_folder_name() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "Ceremony/Morning/a.jpg");
        write_media_file(&config, "Ceremony/Morning/b.png");
        write_media_file(&config, "Ceremony/Evening/c.jpg");

        let mut sink = Cursor::new(Vec::new());
        let written = export_folder(&config, "Ceremony/Morning", &mut sink).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            entry_names(sink.into_inner()),
            vec!["Morning/a.jpg", "Morning/b.png"]
        );
    }

    #[test]
    fn export_folder_archive_round_trips_bytes() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "C/F/a.jpg");

        let mut sink = Cursor::new(Vec::new());
        export_folder(&config, "C/F", &mut sink).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(sink.into_inner())).unwrap();
        let mut entry = archive.by_name("F/a.jpg").unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
        assert_eq!(bytes, b"media bytes");
    }

    #[test]
    fn unknown_folder_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "C/F/a.jpg");

        let result = export_folder(&config, "C/Nope", &mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(ArchiveError::NotFound(_))));
    }

    #[test]
    fn traversal_and_malformed_paths_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "C/F/a.jpg");

        for bad in ["../outside/F", "C/../../etc", "C", "C/F/deep", "/abs/F", "Pending/F"] {
            let result = export_folder(&config, bad, &mut Cursor::new(Vec::new()));
            assert!(
                matches!(result, Err(ArchiveError::Validation(_))),
                "expected validation error for {bad:?}"
            );
        }
    }

    /// Sink that accepts a fixed number of writes and then reports the
    /// client as gone, like an HTTP response body mid-download.
    struct DroppingSink {
        inner: Cursor<Vec<u8>>,
        writes_left: usize,
    }

    impl Write for DroppingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.writes_left == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "client disconnected",
                ));
            }
            self.writes_left -= 1;
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for DroppingSink {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn sink_errors_abort_the_export() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        write_media_file(&config, "C/F/a.jpg");
        write_media_file(&config, "C/F/b.png");

        let sink = DroppingSink {
            inner: Cursor::new(Vec::new()),
            writes_left: 0,
        };
        let result = export_all(&config, sink);
        assert!(matches!(
            result,
            Err(ArchiveError::Io(_) | ArchiveError::Zip(_))
        ));

        // Failing partway through the stream, not on the first byte
        let sink = DroppingSink {
            inner: Cursor::new(Vec::new()),
            writes_left: 4,
        };
        let result = export_folder(&config, "C/F", sink);
        assert!(matches!(
            result,
            Err(ArchiveError::Io(_) | ArchiveError::Zip(_))
        ));
    }

    #[test]
    fn export_all_of_empty_gallery_is_an_empty_archive() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        std::fs::create_dir_all(&config.media_root).unwrap();

        let mut sink = Cursor::new(Vec::new());
        let written = export_all(&config, &mut sink).unwrap();

        assert_eq!(written, 0);
        assert!(entry_names(sink.into_inner()).is_empty());
    }
}
