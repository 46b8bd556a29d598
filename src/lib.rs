//! # Galerie
//!
//! The core of a password-gated media gallery for a private event. Your
//! filesystem is the data source: two directory levels under the media root
//! (`{category}/{folder}/{file}`) become the catalog, guests browse
//! generated renditions, and everything guests upload passes through a
//! moderation area before it is published.
//!
//! # Architecture
//!
//! ```text
//! media/                    scan →  Catalog        (filesystem → structured data)
//! media/Pending/          ingest →  moderation     (approve → publish, reject → delete)
//! .cache/{thumbnails,web}  ensure →  AVIF artifacts (hash-keyed, mtime-fresh)
//! ```
//!
//! Three properties anchor the design:
//!
//! - **Rebuildable everything**: the catalog and every artifact are pure
//!   functions of the media tree. Deleting `.cache/` costs CPU, never data.
//! - **Soft degradation**: a corrupt photo loses its renditions and falls
//!   back to the original route; it never takes the catalog down.
//! - **Terminal moderation**: pending uploads are either published (rename)
//!   or deleted. No undo, no soft-delete, no second state machine.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | Facade wiring everything together — the only surface collaborators touch |
//! | [`scan`] | Walks the media tree into a [`types::Catalog`], triggering artifact generation |
//! | [`cache`] | TTL + signature memoization of the catalog |
//! | [`artifacts`] | Hash-keyed artifact store: thumbnails, web renditions, placeholders, sweep |
//! | [`moderation`] | Pending uploads: ingest (incl. ZIP expansion), approve, reject, batches |
//! | [`archive`] | Streamed ZIP export of original files |
//! | [`imaging`] | Pure-Rust pixel work behind the [`imaging::ImageBackend`] seam |
//! | [`identity`] | Logical-path hashing for artifact keys |
//! | [`exif_date`] / [`rename`] | Offline capture-date renamer (never on the scan path) |
//! | [`config`] | Flat TOML deployment config with full defaults |
//! | [`types`] | Catalog data model and media classification |
//!
//! # Design Decisions
//!
//! ## AVIF-Only Artifacts
//!
//! Every derived artifact is AVIF. The format has had
//! [100% browser support since September 2023](https://caniuse.com/avif)
//! and produces dramatically smaller files than JPEG at equivalent quality,
//! which matters when guests scroll hundreds of wedding photos on hotel
//! wifi. Originals keep their format and are always downloadable untouched.
//!
//! ## Path-Keyed Artifact Identity
//!
//! Artifacts are keyed by SHA-256 of the logical path, not the file bytes.
//! Key computation is O(1) per file, so a cold catalog scan never reads
//! image data for files whose artifacts are already fresh; mtime comparison
//! handles content changes. The trade-off — a rename orphans its artifacts —
//! is reclaimed by the cache sweep.
//!
//! ## Pure-Rust Imaging (No ImageMagick, No FFmpeg)
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling) and
//! rav1e AVIF encoding — both pure Rust. No system dependencies, no version
//! conflicts; the binary is fully self-contained. Video placeholders are
//! rendered procedurally precisely so no video codec is ever linked in.
//!
//! ## EXIF Off the Hot Path
//!
//! Photo order inside a folder comes from filesystem mtime, not EXIF —
//! reading EXIF would turn a directory stat-walk into a full read of every
//! photo on every cold scan. Deployments that want capture-date order run
//! the one-shot [`rename`] utility, which bakes the EXIF date into the
//! filenames once.

pub mod archive;
pub mod artifacts;
pub mod cache;
pub mod config;
pub mod exif_date;
pub mod gallery;
pub mod identity;
pub mod imaging;
pub mod moderation;
pub mod rename;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
