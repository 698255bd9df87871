// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Persistent response store
//!
//! Previously observed response bodies are kept keyed by their full request
//! URL so a new session can deliver data before the network answers.
//!
//! - [`DiskStore`]: one versioned JSON file per URL under a directory (default)
//! - [`MemoryStore`]: in-process map with an optional size limit
//! - [`NoOpStore`]: stores nothing; backs the unavailable handle
//!
//! Callers never talk to a backend directly. They hold a [`StoreHandle`],
//! obtained once per client through [`StoreHandle::open`], which turns every
//! backend failure into "no cache".
//!
//! # Examples
//!
//! ```rust,ignore
//! use vecscan::StoreHandle;
//!
//! // Durable region under the configured directory, or unavailable
//! let store = StoreHandle::open(Some(Path::new("/var/cache/vecscan"))).await;
//!
//! // In-memory only
//! let store = StoreHandle::memory();
//!
//! // No persistence at all
//! let store = StoreHandle::unavailable();
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::config::constants::{CACHE_NAME, DEFAULT_DISK_MAX_ENTRIES};
use crate::errors::StoreError;
use crate::spans;

mod disk;
mod memory;
mod noop;
pub mod types;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use noop::NoOpStore;
pub use types::{CacheEntry, Validator};

/// Statistics about store usage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing (including read failures)
    pub misses: u64,
    /// Entries written
    pub writes: u64,
    /// Writes that failed
    pub write_failures: u64,
    /// Entries evicted due to size limits
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, writes={}, write_failures={}, evictions={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.writes,
            self.write_failures,
            self.evictions,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Trait for persistent store backends
///
/// # Thread Safety
///
/// Implementations must support concurrent access. Use interior mutability
/// (e.g. `Mutex`) as needed.
///
/// # Error Handling
///
/// `match_url` never fails: read errors are logged inside the backend and
/// reported as a miss. `put` reports failures so [`StoreHandle`] can log and
/// count them, but nothing above the handle ever sees them.
#[async_trait]
pub trait PersistentStore: Send + Sync + fmt::Debug {
    /// Returns the entry stored for `url`, if any
    async fn match_url(&self, url: &Url) -> Option<CacheEntry>;

    /// Stores or overwrites the entry for `entry.url`
    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError>;

    /// Returns current statistics
    async fn stats(&self) -> CacheStats;

    /// Human-readable backend name for logging
    fn name(&self) -> &'static str;
}

/// Process-wide handle to the persistent store
///
/// Constructed once per client and shared by every request it makes. A handle
/// is either *available* (backed by a real store) or *unavailable*, in which
/// case reads miss and writes are skipped. Both states are normal operation.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    inner: Arc<dyn PersistentStore>,
    available: bool,
}

impl StoreHandle {
    /// Opens the durable cache region under `dir`
    ///
    /// The region is a directory named after [`CACHE_NAME`] holding at most
    /// [`DEFAULT_DISK_MAX_ENTRIES`] entry files. Any failure to
    /// prepare it (no directory configured, directory cannot be created or is
    /// not writable) yields an unavailable handle instead of an error.
    pub async fn open(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            debug!("No cache directory configured, persistent store unavailable");
            return Self::unavailable();
        };

        let path = dir.join(CACHE_NAME);
        match DiskStore::new(&path)
            .with_max_entries(DEFAULT_DISK_MAX_ENTRIES)
            .validate()
        {
            Ok(store) => {
                debug!(path = %path.display(), "Opened persistent store");
                Self::from_store(Arc::new(store))
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Persistent store unavailable, continuing without cache"
                );
                Self::unavailable()
            }
        }
    }

    /// A handle over an in-memory store
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// A handle that never stores anything
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(NoOpStore),
            available: false,
        }
    }

    /// Wraps an existing backend as an available handle
    pub fn from_store(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            inner: store,
            available: true,
        }
    }

    /// Whether reads and writes reach a real backend
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Name of the backing store
    pub fn backend_name(&self) -> &'static str {
        self.inner.name()
    }

    /// Looks up the entry for `url`; unavailable handles always miss
    pub async fn match_url(&self, url: &Url) -> Option<CacheEntry> {
        if !self.available {
            return None;
        }
        self.inner.match_url(url).await
    }

    /// Writes an entry, logging and discarding any failure
    pub async fn put(&self, entry: CacheEntry) {
        if !self.available {
            return;
        }
        let url = entry.url.clone();
        if let Err(e) = self.inner.put(entry).await {
            warn!(url = %url, store = self.inner.name(), error = %e, "Cache write failed");
        }
    }

    /// Schedules a write on a background task
    ///
    /// The task yields once before writing so the caller's critical path runs
    /// first. Returns `None` when the handle is unavailable.
    pub fn schedule_put(&self, entry: CacheEntry) -> Option<JoinHandle<()>> {
        if !self.available {
            return None;
        }
        let span = spans::store_put(&entry.url);
        let handle = self.clone();
        Some(tokio::spawn(
            async move {
                tokio::task::yield_now().await;
                handle.put(entry).await;
            }
            .instrument(span),
        ))
    }

    /// Statistics from the backing store
    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn url(path: &str) -> Url {
        Url::parse(&format!("http://localhost:3110{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_open_without_directory_is_unavailable() {
        let store = StoreHandle::open(None).await;
        assert!(!store.is_available());
        assert_eq!(store.backend_name(), "NoOpStore");
    }

    #[tokio::test]
    async fn test_open_creates_region_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = StoreHandle::open(Some(temp_dir.path())).await;
        assert!(store.is_available());
        assert_eq!(store.backend_name(), "DiskStore");

        let u = url("/api/vecs/height-to-close");
        store.put(CacheEntry::new(&u, json!([1.0]), None)).await;

        let region = temp_dir.path().join("vecscan-cache-v1");
        assert!(region.is_dir());
        assert_eq!(std::fs::read_dir(&region).unwrap().count(), 1);
        assert_eq!(store.match_url(&u).await.unwrap().body, json!([1.0]));
    }

    #[tokio::test]
    async fn test_open_on_file_path_degrades_to_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = StoreHandle::open(Some(&blocker)).await;
        assert!(!store.is_available());
    }

    #[tokio::test]
    async fn test_unavailable_handle_misses_and_skips_writes() {
        let store = StoreHandle::unavailable();
        let u = url("/x");
        store.put(CacheEntry::new(&u, json!(1), None)).await;
        assert!(store.match_url(&u).await.is_none());
        assert!(store.schedule_put(CacheEntry::new(&u, json!(1), None)).is_none());
    }

    #[tokio::test]
    async fn test_scheduled_put_lands() {
        let store = StoreHandle::memory();
        let u = url("/api/vecs/height-to-open");
        let handle = store
            .schedule_put(CacheEntry::new(&u, json!([1, 2]), None))
            .unwrap();
        handle.await.unwrap();

        assert_eq!(store.match_url(&u).await.unwrap().body, json!([1, 2]));
        assert_eq!(store.stats().await.writes, 1);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
