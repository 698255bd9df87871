// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory store with an optional size limit

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use super::{CacheEntry, CacheStats, PersistentStore};
use crate::errors::StoreError;

/// Internal state for memory store
#[derive(Debug, Default)]
struct MemoryStoreState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// In-memory response store
///
/// Lives only as long as the process. Useful for hosts without a writable
/// disk and for tests. With [`with_max_entries`](Self::with_max_entries) the
/// oldest-written entry is evicted once the limit is exceeded.
///
/// # Examples
///
/// ```rust
/// use vecscan::MemoryStore;
///
/// let store = MemoryStore::new().with_max_entries(256);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    max_entries: Option<usize>,
    state: Mutex<MemoryStoreState>,
}

impl MemoryStore {
    /// Creates an unbounded memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries kept
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Evicts the oldest-written entries until the limit holds
    fn evict_oldest(state: &mut MemoryStoreState, max_entries: usize) {
        while state.entries.len() > max_entries {
            let oldest = state
                .entries
                .values()
                .min_by_key(|entry| entry.stored_at)
                .map(|entry| entry.url.clone());

            match oldest {
                Some(url) => {
                    debug!(url = %url, "Evicting oldest cache entry");
                    state.entries.remove(&url);
                    state.stats.evictions += 1;
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn match_url(&self, url: &Url) -> Option<CacheEntry> {
        let mut state = self.state.lock().await;
        match state.entries.get(url.as_str()).cloned() {
            Some(entry) => {
                state.stats.hits += 1;
                Some(entry)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.entries.insert(entry.url.clone(), entry);
        state.stats.writes += 1;

        if let Some(max_entries) = self.max_entries {
            Self::evict_oldest(&mut state, max_entries);
        }

        state.stats.entries = state.entries.len();
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        self.state.lock().await.stats.clone()
    }

    fn name(&self) -> &'static str {
        "MemoryStore"
    }
}
