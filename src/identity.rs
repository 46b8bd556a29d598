//! Content addressing for derived artifacts.
//!
//! Every derived file (thumbnail, web-optimized rendition, video
//! placeholder) is stored as `{media_key}.avif`, where the key is a digest
//! of the *logical path* string (`{category}/{folder}/{name}`) — not the
//! file bytes. Hashing the path keeps key computation O(1) regardless of
//! file size and makes the key stable across re-encodes of the source, at
//! the cost that a rename orphans the old artifacts (the sweep in
//! [`crate::artifacts`] reclaims them).
//!
//! SHA-256 gives a deterministic, salt-free digest: the same logical path
//! produces the same key across process restarts and machines, and two
//! distinct paths cannot plausibly collide.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a logical media path, used as the artifact filename stem.
pub fn media_key(logical_path: &str) -> String {
    format!("{:x}", Sha256::digest(logical_path.as_bytes()))
}
