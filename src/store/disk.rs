// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Disk-based store with one versioned file per URL
//!
//! Each entry lives in `<dir>/<sha256(url)>.json`, so a lookup reads and
//! decodes only the entry it asks for and a write replaces only its own file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::{CacheEntry, CacheStats, PersistentStore};
use crate::errors::StoreError;

/// Current on-disk format version
const STORE_VERSION: u32 = 1;

/// Extension of committed entry files
const ENTRY_EXTENSION: &str = "json";

/// Serialized entry format (versioned)
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    /// Store format version
    version: u32,
    entry: CacheEntry,
}

/// Internal state for disk store
#[derive(Debug, Default)]
struct DiskStoreState {
    /// Statistics (in-memory only, not persisted)
    stats: CacheStats,
}

/// Disk-based response store
///
/// Persists each entry to its own JSON file under a cache directory:
/// - File names are the hex SHA-256 of the full request URL
/// - Format versioning; a file written by another version is ignored
/// - Atomic writes through a uniquely named temp file and rename
/// - Optional entry bound, evicting the least recently written files
///
/// Writers never read-modify-write shared data. Concurrent writers for the
/// same URL, in this process or another, resolve as last writer wins; readers
/// always see one complete entry.
///
/// # Examples
///
/// ```rust,ignore
/// use vecscan::DiskStore;
///
/// let store = DiskStore::new("/var/cache/vecscan/vecscan-cache-v1")
///     .with_max_entries(512)
///     .validate()?;
/// ```
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    max_entries: Option<usize>,
    temp_seq: AtomicU64,
    state: Mutex<DiskStoreState>,
}

impl DiskStore {
    /// Creates a store backed by the directory at `dir`
    ///
    /// Path validation is NOT performed until the first I/O operation. Use
    /// [`validate()`](Self::validate) to check the path immediately.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_entries: None,
            temp_seq: AtomicU64::new(0),
            state: Mutex::new(DiskStoreState::default()),
        }
    }

    /// Bounds the number of entry files kept on disk
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// The cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates the directory, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is not writable.
    pub fn validate(self) -> Result<Self, StoreError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| {
                StoreError::io(
                    self.dir.display().to_string(),
                    format!("Failed to create cache directory: {}", e),
                    e,
                )
            })?;
            debug!(path = %self.dir.display(), "Created cache directory");
        }

        // Probe writability with a throwaway file
        let test_file = self.dir.join(".cache_write_test");
        std::fs::write(&test_file, b"test").map_err(|e| {
            StoreError::io(
                self.dir.display().to_string(),
                format!("Cache directory is not writable: {}", e),
                e,
            )
        })?;
        let _ = std::fs::remove_file(&test_file);

        debug!(path = %self.dir.display(), "Cache directory validated successfully");
        Ok(self)
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXTENSION}", entry_name(url)))
    }

    /// Reads and decodes the entry for `url`, if one is on disk
    async fn read_entry(&self, url: &str) -> Result<Option<CacheEntry>, StoreError> {
        let path = self.entry_path(url);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::io(
                    path.display().to_string(),
                    format!("Failed to read cache entry: {}", e),
                    e,
                ))
            }
        };

        let file: EntryFile =
            tokio::task::spawn_blocking(move || serde_json::from_slice::<EntryFile>(&bytes))
                .await
                .map_err(|e| {
                    StoreError::io_message(
                        path.display().to_string(),
                        format!("Cache decode task failed: {}", e),
                    )
                })?
                .map_err(StoreError::serialization)?;

        if file.version != STORE_VERSION {
            warn!(
                path = %path.display(),
                cached_version = file.version,
                current_version = STORE_VERSION,
                "Cache version mismatch, ignoring cached entry"
            );
            return Ok(None);
        }
        if file.entry.url != url {
            warn!(path = %path.display(), "Cache entry belongs to another URL, ignoring");
            return Ok(None);
        }

        Ok(Some(file.entry))
    }

    /// Writes `entry` to its own file atomically and returns the file path
    async fn write_entry(&self, entry: CacheEntry) -> Result<PathBuf, StoreError> {
        let path = self.entry_path(&entry.url);
        let temp_path = self.dir.join(format!(
            "{}.{}.{}.tmp",
            entry_name(&entry.url),
            std::process::id(),
            self.temp_seq.fetch_add(1, Ordering::Relaxed)
        ));

        let file = EntryFile {
            version: STORE_VERSION,
            entry,
        };
        let json = tokio::task::spawn_blocking(move || serde_json::to_vec(&file))
            .await
            .map_err(|e| {
                StoreError::io_message(
                    path.display().to_string(),
                    format!("Cache encode task failed: {}", e),
                )
            })?
            .map_err(StoreError::serialization)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            StoreError::io(
                self.dir.display().to_string(),
                format!("Failed to create cache directory: {}", e),
                e,
            )
        })?;

        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StoreError::io(
                temp_path.display().to_string(),
                format!("Failed to write cache entry: {}", e),
                e,
            )
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::io(
                path.display().to_string(),
                format!(
                    "Failed to rename cache entry from '{}': {}",
                    temp_path.display(),
                    e
                ),
                e,
            ));
        }

        debug!(path = %path.display(), bytes = json.len(), "Saved cache entry");
        Ok(path)
    }

    /// Committed entry files with their modification times
    async fn entry_files(&self) -> Result<Vec<(PathBuf, SystemTime)>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::io(
                    self.dir.display().to_string(),
                    format!("Failed to list cache directory: {}", e),
                    e,
                ))
            }
        };

        let mut files = Vec::new();
        loop {
            let item = match dir.next_entry().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    return Err(StoreError::io(
                        self.dir.display().to_string(),
                        format!("Failed to list cache directory: {}", e),
                        e,
                    ))
                }
            };
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let modified = item
                .metadata()
                .await
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
        Ok(files)
    }

    /// Removes the oldest entry files beyond `max_entries`, never `keep`
    async fn prune(&self, keep: &Path) -> Result<u64, StoreError> {
        let Some(max_entries) = self.max_entries else {
            return Ok(0);
        };

        let files = self.entry_files().await?;
        if files.len() <= max_entries {
            return Ok(0);
        }

        let excess = files.len() - max_entries;
        let mut candidates: Vec<_> = files.into_iter().filter(|(path, _)| path != keep).collect();
        candidates.sort_by_key(|(_, modified)| *modified);

        let mut removed = 0;
        for (path, _) in candidates.into_iter().take(excess) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %path.display(), "Evicted cache entry");
                }
                // Another process may have evicted it first
                Err(e) => debug!(path = %path.display(), error = %e, "Failed to evict cache entry"),
            }
        }
        Ok(removed)
    }
}

/// File stem for `url`: hex SHA-256 of the full URL
fn entry_name(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

#[async_trait]
impl PersistentStore for DiskStore {
    async fn match_url(&self, url: &Url) -> Option<CacheEntry> {
        let result = self.read_entry(url.as_str()).await;
        let mut state = self.state.lock().await;

        match result {
            Ok(Some(entry)) => {
                state.stats.hits += 1;
                debug!(url = %url, "Cache hit (disk)");
                Some(entry)
            }
            Ok(None) => {
                state.stats.misses += 1;
                debug!(url = %url, "Cache miss (disk)");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to load cache entry, treating as miss");
                state.stats.misses += 1;
                None
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError> {
        let path = match self.write_entry(entry).await {
            Ok(path) => path,
            Err(e) => {
                self.state.lock().await.stats.write_failures += 1;
                return Err(e);
            }
        };

        let evicted = match self.prune(&path).await {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(error = %e, "Failed to prune cache directory");
                0
            }
        };

        let mut state = self.state.lock().await;
        state.stats.writes += 1;
        state.stats.evictions += evicted;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let entries = self.entry_files().await.map(|files| files.len());
        let mut state = self.state.lock().await;

        if let Ok(entries) = entries {
            state.stats.entries = entries;
        }

        state.stats.clone()
    }

    fn name(&self) -> &'static str {
        "DiskStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Validator;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_url(metric: &str) -> Url {
        Url::parse(&format!(
            "http://localhost:3110/api/vecs/height-to-{metric}?from=-10000"
        ))
        .unwrap()
    }

    fn open(temp_dir: &TempDir) -> DiskStore {
        DiskStore::new(temp_dir.path().join("entries"))
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn test_disk_store_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let url = test_url("close");
        assert!(store.match_url(&url).await.is_none());

        store
            .put(CacheEntry::new(&url, json!([1.0, 2.0]), None))
            .await
            .unwrap();
        let entry = store.match_url(&url).await.unwrap();
        assert_eq!(entry.body, json!([1.0, 2.0]));

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_disk_store_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("entries");
        let url = test_url("market-cap");

        {
            let store = DiskStore::new(&dir).validate().unwrap();
            store
                .put(CacheEntry::new(
                    &url,
                    json!([10, 20]),
                    Some(Validator::new("\"v1\"")),
                ))
                .await
                .unwrap();
        }

        {
            let store = DiskStore::new(&dir).validate().unwrap();
            let entry = store.match_url(&url).await.unwrap();
            assert_eq!(entry.body, json!([10, 20]));
            assert_eq!(entry.validator.unwrap().as_str(), "\"v1\"");
        }
    }

    #[tokio::test]
    async fn test_disk_store_overwrites_same_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let url = test_url("close");

        store.put(CacheEntry::new(&url, json!([1]), None)).await.unwrap();
        store.put(CacheEntry::new(&url, json!([1, 2]), None)).await.unwrap();

        assert_eq!(store.match_url(&url).await.unwrap().body, json!([1, 2]));
        assert_eq!(store.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_disk_store_keys_include_query() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let a = Url::parse("http://localhost/api/vecs/height-to-close?from=-10").unwrap();
        let b = Url::parse("http://localhost/api/vecs/height-to-close?from=-20").unwrap();

        store.put(CacheEntry::new(&a, json!([1]), None)).await.unwrap();

        assert!(store.match_url(&a).await.is_some());
        assert!(store.match_url(&b).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_store_writes_one_file_per_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let close = test_url("close");
        let market_cap = test_url("market-cap");

        store.put(CacheEntry::new(&close, json!([1, 2, 3]), None)).await.unwrap();
        let close_bytes = std::fs::read(store.entry_path(close.as_str())).unwrap();

        store.put(CacheEntry::new(&market_cap, json!([9]), None)).await.unwrap();

        // Writing one URL leaves the other entry's file untouched
        assert_eq!(std::fs::read(store.entry_path(close.as_str())).unwrap(), close_bytes);
        assert!(store.entry_path(market_cap.as_str()).exists());
        assert_eq!(store.stats().await.entries, 2);

        // No temp files are left behind
        let leftovers = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|item| item.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_disk_store_lookup_ignores_unrelated_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let close = test_url("close");
        let market_cap = test_url("market-cap");

        store.put(CacheEntry::new(&close, json!([1, 2]), None)).await.unwrap();
        store.put(CacheEntry::new(&market_cap, json!([3]), None)).await.unwrap();
        std::fs::write(store.entry_path(market_cap.as_str()), b"{ not json").unwrap();

        assert_eq!(store.match_url(&close).await.unwrap().body, json!([1, 2]));
        assert!(store.match_url(&market_cap).await.is_none());

        // A write replaces the corrupt entry
        store.put(CacheEntry::new(&market_cap, json!([4]), None)).await.unwrap();
        assert_eq!(store.match_url(&market_cap).await.unwrap().body, json!([4]));
    }

    #[tokio::test]
    async fn test_disk_store_ignores_other_versions() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let url = test_url("close");
        let stale = json!({
            "version": STORE_VERSION + 1,
            "entry": {
                "url": url.as_str(),
                "body": [1, 2, 3],
                "stored_at": "2025-01-01T00:00:00Z"
            }
        });
        std::fs::write(
            store.entry_path(url.as_str()),
            serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();

        assert!(store.match_url(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_store_rejects_entry_for_another_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let close = test_url("close");
        let other = json!({
            "version": STORE_VERSION,
            "entry": {
                "url": test_url("open").as_str(),
                "body": [5],
                "stored_at": "2025-01-01T00:00:00Z"
            }
        });
        std::fs::write(
            store.entry_path(close.as_str()),
            serde_json::to_vec(&other).unwrap(),
        )
        .unwrap();

        assert!(store.match_url(&close).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_store_evicts_beyond_max_entries() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskStore::new(temp_dir.path().join("entries"))
            .with_max_entries(2)
            .validate()
            .unwrap();
        let newest = test_url("market-cap");

        for metric in ["open", "close"] {
            store
                .put(CacheEntry::new(&test_url(metric), json!([1]), None))
                .await
                .unwrap();
        }
        store.put(CacheEntry::new(&newest, json!([2]), None)).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(store.match_url(&newest).await.unwrap().body, json!([2]));
    }

    #[tokio::test]
    async fn test_disk_store_validation_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("subdir").join("entries");

        let store = DiskStore::new(&dir).validate();
        assert!(store.is_ok());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_entry_names_are_stable_hex_digests() {
        let name = entry_name("http://localhost/api/last-height");
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(name, entry_name("http://localhost/api/last-height"));
        assert_ne!(name, entry_name("http://localhost/api/last-height?x=1"));
    }
}
