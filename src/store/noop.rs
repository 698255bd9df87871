// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! No-operation store backing the unavailable handle

use async_trait::async_trait;
use url::Url;

use super::{CacheEntry, CacheStats, PersistentStore};
use crate::errors::StoreError;

/// A store that keeps nothing
///
/// Reads always miss and writes are accepted and dropped. This is what a
/// [`StoreHandle`](super::StoreHandle) falls back to when the durable region
/// cannot be opened, so every request goes straight to the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStore;

#[async_trait]
impl PersistentStore for NoOpStore {
    async fn match_url(&self, _url: &Url) -> Option<CacheEntry> {
        None
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), StoreError> {
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn name(&self) -> &'static str {
        "NoOpStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_store_ignores_writes() {
        let store = NoOpStore;
        let url = Url::parse("http://localhost/api/vecs/height-to-close").unwrap();

        assert!(store.put(CacheEntry::new(&url, json!([1]), None)).await.is_ok());
        assert!(store.match_url(&url).await.is_none());
        assert_eq!(store.stats().await, CacheStats::default());
    }
}
