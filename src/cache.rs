//! In-memory catalog cache with TTL and signature-based invalidation.
//!
//! Scanning the media tree and (worst case) generating artifacts is the
//! expensive path, so the resulting [`Catalog`] is memoized here. An entry is
//! served only while *both* hold:
//!
//! 1. it is younger than the TTL (bounds staleness even if some mutation
//!    path forgot to invalidate), and
//! 2. the directory signature — the maximum mtime across the recursive media
//!    tree — still matches, so out-of-band filesystem edits are picked up on
//!    the next request rather than the next TTL expiry.
//!
//! Mutating operations call [`CatalogCache::invalidate`] synchronously, so
//! their effects are visible to the very next catalog read. Concurrent
//! rebuilds are deliberately not deduplicated: the rebuild runs outside the
//! lock and the last writer wins, which is harmless because a scan is a pure
//! function of the tree.
//!
//! The clock is injected behind a trait so expiry tests do not sleep.

use crate::types::Catalog;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Time source seam. Production uses [`SystemClock`]; tests use a manual
/// clock they can advance.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

struct CacheEntry {
    catalog: Arc<Catalog>,
    taken_at: SystemTime,
    signature: SystemTime,
}

pub struct CatalogCache {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entry: Mutex<Option<CacheEntry>>,
    invalidations: AtomicUsize,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: Mutex::new(None),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// Return the cached catalog when it is still valid for `signature`,
    /// otherwise run `rebuild` and cache its output. The bool reports
    /// whether the call was served from cache.
    ///
    /// `rebuild` runs outside the lock: a slow scan must not block readers
    /// of a still-valid entry, and concurrent misses resolve last-writer-wins.
    pub fn get_with<E>(
        &self,
        signature: SystemTime,
        rebuild: impl FnOnce() -> Result<Catalog, E>,
    ) -> Result<(Arc<Catalog>, bool), E> {
        {
            let guard = self.entry.lock().unwrap();
            if let Some(entry) = guard.as_ref() {
                let age = self
                    .clock
                    .now()
                    .duration_since(entry.taken_at)
                    .unwrap_or(Duration::MAX);
                if age < self.ttl && entry.signature == signature {
                    return Ok((Arc::clone(&entry.catalog), true));
                }
            }
        }

        let catalog = Arc::new(rebuild()?);
        let mut guard = self.entry.lock().unwrap();
        *guard = Some(CacheEntry {
            catalog: Arc::clone(&catalog),
            taken_at: self.clock.now(),
            signature,
        });
        Ok((catalog, false))
    }

    /// Drop the cached entry unconditionally. Called by every mutating
    /// operation so its effect is visible to the next read.
    pub fn invalidate(&self) {
        *self.entry.lock().unwrap() = None;
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// How many times [`CatalogCache::invalidate`] has run. Mutating
    /// operations are expected to invalidate once per call, not per item.
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Relaxed)
    }
}

/// Cheap change detector for the media tree: the maximum mtime over every
/// entry (files and directories) under `root`. Directory mtimes make adds
/// and deletes visible, not just edits. Unreadable entries are skipped —
/// a partially unreadable tree still yields a usable signature.
pub fn directory_signature(root: &Path) -> SystemTime {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter_map(|m| m.modified().ok())
        .max()
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
