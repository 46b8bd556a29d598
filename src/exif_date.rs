//! Minimal EXIF capture-date parser for JPEG and TIFF files.
//!
//! Extracts exactly one thing: the capture date, trying three tags in
//! priority order:
//! - DateTimeOriginal (0x9003, Exif sub-IFD)
//! - DateTimeDigitized (0x9004, Exif sub-IFD)
//! - DateTime (0x0132, IFD0 — the file modification date)
//!
//! For JPEG: reads the TIFF structure embedded in the APP1 marker
//! (`Exif\0\0` header). For TIFF: parses the file directly.
//!
//! EXIF dates are local wall time with no zone, hence [`NaiveDateTime`].
//! Any parse failure yields `None` — a photo without a readable date is
//! normal, not an error.

use chrono::NaiveDateTime;
use std::path::Path;

/// Read the EXIF capture date from a file, dispatching by extension.
/// Returns `None` on any read or parse failure.
pub fn exif_capture_date(path: &Path) -> Option<NaiveDateTime> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let bytes = std::fs::read(path).ok()?;

    match ext.as_str() {
        "jpg" | "jpeg" => parse_tiff_dates(find_jpeg_app1_exif(&bytes)?),
        "tif" | "tiff" => parse_tiff_dates(&bytes),
        _ => None,
    }
}

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Find the TIFF byte block inside a JPEG's APP1 segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    // Find APP1 marker (0xFF 0xE1)
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xE1 {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            let seg_end = (pos + 2 + seg_len).min(data.len());
            let segment = &data[seg_start..seg_end];

            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return Some(tiff);
            }
        }

        // Advance: if 0xFF, skip marker + length; otherwise byte-by-byte
        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS (0xDA) means image data starts — stop scanning
            if marker == 0xDA {
                break;
            }
            // Markers without length field
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    None
}

const TAG_DATETIME: u16 = 0x0132;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
const TAG_DATETIME_DIGITIZED: u16 = 0x9004;

/// Walk a TIFF structure and return the best available date.
///
/// All offsets inside the structure are relative to the start of the TIFF
/// header (the `II`/`MM` bytes), which is why the JPEG path hands in the
/// APP1 payload with the `Exif\0\0` prefix already stripped.
fn parse_tiff_dates(data: &[u8]) -> Option<NaiveDateTime> {
    if data.len() < 8 {
        return None;
    }

    // Determine byte order
    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes = [*data.get(offset)?, *data.get(offset + 1)?];
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };

    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes = [
            *data.get(offset)?,
            *data.get(offset + 1)?,
            *data.get(offset + 2)?,
            *data.get(offset + 3)?,
        ];
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    // Verify TIFF magic (42)
    if read_u16(2)? != 42 {
        return None;
    }

    // ASCII tag value: inline in the entry when it fits in 4 bytes,
    // otherwise at the pointed-to offset. Date strings are 20 bytes, so in
    // practice always the latter.
    let read_ascii = |entry_offset: usize| -> Option<String> {
        let count = read_u32(entry_offset + 4)? as usize;
        let start = if count <= 4 {
            entry_offset + 8
        } else {
            read_u32(entry_offset + 8)? as usize
        };
        let bytes = data.get(start..start + count)?;
        let s = String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .trim()
            .to_string();
        if s.is_empty() { None } else { Some(s) }
    };

    let mut original = None;
    let mut digitized = None;
    let mut modify = None;
    let mut exif_ifd_offset = None;

    let ifd0_offset = read_u32(4)? as usize;
    let entry_count = read_u16(ifd0_offset)? as usize;
    for i in 0..entry_count {
        let entry_offset = ifd0_offset + 2 + i * 12;
        match read_u16(entry_offset)? {
            TAG_DATETIME => modify = read_ascii(entry_offset),
            TAG_EXIF_IFD_POINTER => exif_ifd_offset = Some(read_u32(entry_offset + 8)? as usize),
            _ => {}
        }
    }

    if let Some(sub_offset) = exif_ifd_offset {
        let entry_count = read_u16(sub_offset)? as usize;
        for i in 0..entry_count {
            let entry_offset = sub_offset + 2 + i * 12;
            match read_u16(entry_offset)? {
                TAG_DATETIME_ORIGINAL => original = read_ascii(entry_offset),
                TAG_DATETIME_DIGITIZED => digitized = read_ascii(entry_offset),
                _ => {}
            }
        }
    }

    [original, digitized, modify]
        .into_iter()
        .flatten()
        .find_map(|s| parse_exif_datetime(&s))
}

/// EXIF datetime format: `YYYY:MM:DD HH:MM:SS`.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S").ok()
}
