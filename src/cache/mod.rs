// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Stale-while-revalidate delivery of a single URL.
//!
//! [`CachingFetcher`] composes the persistent store, the network fetcher and the
//! freshness check into one per-call contract:
//!
//! 1. Look the URL up in the store and deliver a hit immediately.
//! 2. If the host is offline, stop there (cached value or [`FetchError::Offline`]).
//! 3. GET the URL with a bounded timeout; on failure fall back to the cached
//!    value if there is one.
//! 4. If the fresh body is unchanged, return the cached value without a second
//!    delivery.
//! 5. Otherwise deliver the fresh value and persist it in the background.
//!
//! Both the generic [`ApiClient`](crate::ApiClient) and the range
//! [`ResourceRegistry`](crate::ResourceRegistry) go through this type, so the
//! revalidation logic exists exactly once.

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::config::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::errors::FetchError;
use crate::freshness::{self, Freshness, Observed};
use crate::notify::{Origin, UpdateSink};
use crate::spans;
use crate::store::{CacheEntry, StoreHandle, Validator};
use crate::transport::{AlwaysOnline, Connectivity, FetchedBody, NetworkFetcher};

/// A decoded body together with the raw document it came from
struct Decoded<T> {
    value: Arc<T>,
    body: Value,
    validator: Option<Validator>,
}

impl<T> Decoded<T> {
    fn observed(&self) -> Observed<'_> {
        Observed::new(&self.body, self.validator.as_ref())
    }
}

/// Stale-while-revalidate cache over one store and one network fetcher
///
/// The fetcher holds no per-URL state; everything it remembers lives in the
/// [`StoreHandle`]. Background writes are tracked so [`flush`](Self::flush) can
/// wait for them.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use vecscan::{CachingFetcher, StoreHandle};
/// use vecscan::transport::HttpFetcher;
///
/// let fetcher = CachingFetcher::new(StoreHandle::memory(), Arc::new(HttpFetcher::new()?));
/// let height: Arc<u64> = fetcher
///     .get(&"http://localhost:3110/api/last-height".parse()?, None)
///     .await?;
/// ```
pub struct CachingFetcher {
    store: StoreHandle,
    network: Arc<dyn NetworkFetcher>,
    connectivity: Arc<dyn Connectivity>,
    timeout: Duration,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for CachingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingFetcher")
            .field("store", &self.store.backend_name())
            .field("connectivity", &self.connectivity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CachingFetcher {
    /// Creates a fetcher that is always online and times out after 5 seconds
    pub fn new(store: StoreHandle, network: Arc<dyn NetworkFetcher>) -> Self {
        Self {
            store,
            network,
            connectivity: Arc::new(AlwaysOnline),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Sets the per-request network timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connectivity probe consulted before each network attempt
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// The per-request network timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The store this fetcher reads from and writes to
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Delivers the value at `url`, cached first and fresh second
    ///
    /// `on_update` is called zero, one or two times: with the cached value as
    /// soon as it is read, then with the fresh value if it differs. The return
    /// value is the freshest value known when the call settles.
    ///
    /// # Errors
    ///
    /// Only when no cached value exists:
    /// - [`FetchError::Offline`] if the host reports no connectivity
    /// - [`FetchError::Timeout`], [`FetchError::Http`], [`FetchError::Parse`]
    ///   or [`FetchError::Transport`] if the network attempt failed
    pub async fn get<T>(
        &self,
        url: &Url,
        on_update: Option<&dyn UpdateSink<T>>,
    ) -> Result<Arc<T>, FetchError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        async {
            let cached = self.lookup::<T>(url).await;
            if let (Some(hit), Some(sink)) = (&cached, on_update) {
                sink.deliver(&hit.value, Origin::Cache);
            }

            if !self.connectivity.is_online() {
                return match cached {
                    Some(hit) => {
                        debug!("Offline, serving cached value");
                        Ok(hit.value)
                    }
                    None => Err(FetchError::offline(url.as_str())),
                };
            }

            let fresh = match self.fetch_fresh::<T>(url).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    return match cached {
                        Some(hit) => {
                            warn!(error = %e, "Network fetch failed, serving cached value");
                            Ok(hit.value)
                        }
                        None => Err(e),
                    };
                }
            };

            if let Some(hit) = cached {
                if freshness::compare(&hit.observed(), &fresh.observed()) == Freshness::Unchanged {
                    debug!("Fresh body unchanged, skipping second delivery");
                    return Ok(hit.value);
                }
            }

            if let Some(sink) = on_update {
                sink.deliver(&fresh.value, Origin::Network);
            }
            self.schedule_write(CacheEntry::new(url, fresh.body, fresh.validator));
            Ok(fresh.value)
        }
        .instrument(spans::cached_get(url))
        .await
    }

    /// Waits for every background cache write scheduled so far
    pub async fn flush(&self) {
        let pending: Vec<_> = self
            .pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for result in join_all(pending).await {
            if let Err(e) = result {
                warn!(error = %e, "Background cache write task failed");
            }
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, url: &Url) -> Option<Decoded<T>> {
        let entry = self.store.match_url(url).await?;
        match T::deserialize(&entry.body) {
            Ok(value) => Some(Decoded {
                value: Arc::new(value),
                body: entry.body,
                validator: entry.validator,
            }),
            Err(e) => {
                debug!(error = %e, "Cached body has an unexpected shape, ignoring");
                None
            }
        }
    }

    async fn fetch_fresh<T: DeserializeOwned>(&self, url: &Url) -> Result<Decoded<T>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.network.get(url, self.timeout))
            .await
            .map_err(|_| FetchError::timeout(url.as_str(), self.timeout))??;

        let FetchedBody { body, validator } = response.into_json(url)?;
        let value = T::deserialize(&body).map_err(|e| FetchError::parse(url.as_str(), e))?;

        Ok(Decoded {
            value: Arc::new(value),
            body,
            validator,
        })
    }

    fn schedule_write(&self, entry: CacheEntry) {
        let Some(handle) = self.store.schedule_put(entry) else {
            return;
        };
        let mut pending = self
            .pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}
