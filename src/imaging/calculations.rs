//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output dimensions for a longest-edge bound.
///
/// Returns `None` when the image already fits within `max_edge` — the
/// caller should re-encode without resizing. Otherwise returns the scaled
/// dimensions, aspect-preserving, longest edge exactly `max_edge`. Never
/// upscales.
///
/// # Examples
/// ```
/// # use galerie::imaging::bounded_dimensions;
/// assert_eq!(bounded_dimensions((2400, 1600), 2048), Some((2048, 1365)));
/// assert_eq!(bounded_dimensions((1600, 2400), 2048), Some((1365, 2048)));
/// assert_eq!(bounded_dimensions((1920, 1080), 2048), None);
/// ```
pub fn bounded_dimensions(original: (u32, u32), max_edge: u32) -> Option<(u32, u32)> {
    let (w, h) = original;
    let longer = w.max(h);
    if longer <= max_edge {
        return None;
    }

    let ratio = max_edge as f64 / longer as f64;
    if w >= h {
        Some((max_edge, (h as f64 * ratio).round() as u32))
    } else {
        Some(((w as f64 * ratio).round() as u32, max_edge))
    }
}

/// Dimensions needed to cover a target area before a center crop.
///
/// One output dimension matches the target exactly, the other meets or
/// exceeds it, preserving the source aspect ratio.
pub fn cover_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height matches, width exceeds
        ((tgt_h as f64 * src_aspect).round() as u32, tgt_h)
    } else {
        // Source is taller: width matches, height exceeds
        (tgt_w, (tgt_w as f64 / src_aspect).round() as u32)
    }
}
