// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Keyed, range-aware resource registry
//!
//! Dashboards ask for the same metric vectors over and over, often from several
//! widgets at once. The registry keeps one [`ResourceHandle`] per [`VecId`] and,
//! inside it, one fetch state per [`RangeKey`], so that:
//!
//! - concurrent fetches of one key issue a single network request
//! - a key fetched successfully less than the TTL ago is served from memory
//! - a failed fetch can be retried immediately
//!
//! Everything below the key bookkeeping is delegated to
//! [`CachingFetcher`], which delivers the cached value first and the fresh one
//! second.
//!
//! # Example
//!
//! ```rust,ignore
//! use vecscan::{ApiClient, RangeQuery, VecId, VecscanConfig};
//!
//! let client = ApiClient::new(VecscanConfig::from_env()?).await?;
//! let registry = client.registry::<Vec<f64>>();
//!
//! let market_cap = registry.get_or_create(VecId::new("height", "market_cap"));
//! let points = market_cap.fetch(RangeQuery::default()).await?;
//! ```

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use crate::cache::CachingFetcher;
use crate::config::VecscanConfig;
use crate::errors::FetchError;
use crate::notify::{Origin, UpdateSink};
use crate::spans;

mod key;
mod state;

pub use key::{RangeKey, RangeQuery, VecId};
pub use state::Snapshot;

pub(crate) use key::vec_url;
use state::{Begin, FetchState, SettleGuard};

/// Values the registry can hold
///
/// `is_empty_value` decides whether a delivery may replace a value that is
/// already published: an empty value only lands in a blank state.
pub trait ResourceValue: DeserializeOwned + Send + Sync + 'static {
    /// Whether this value carries no data points
    fn is_empty_value(&self) -> bool {
        false
    }
}

impl<V> ResourceValue for Vec<V>
where
    V: DeserializeOwned + Send + Sync + 'static,
{
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl ResourceValue for serde_json::Value {
    fn is_empty_value(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Where handles send their requests and how long results stay fresh
#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    api_prefix: String,
    ttl: Duration,
    default_range: RangeQuery,
}

/// One handle per metric vector, shared by everyone asking for it
#[derive(Debug)]
pub struct ResourceRegistry<T> {
    fetcher: Arc<CachingFetcher>,
    endpoint: Endpoint,
    handles: Mutex<HashMap<VecId, Arc<ResourceHandle<T>>>>,
}

impl<T: ResourceValue> ResourceRegistry<T> {
    /// Creates an empty registry over `fetcher`
    pub fn new(fetcher: Arc<CachingFetcher>, config: &VecscanConfig) -> Self {
        Self {
            fetcher,
            endpoint: Endpoint {
                base_url: config.base_url.clone(),
                api_prefix: config.api_prefix.clone(),
                ttl: config.range_ttl,
                default_range: config.default_range,
            },
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `id`, creating it on first use
    ///
    /// Repeated calls with an equal id return the same `Arc`.
    pub fn get_or_create(&self, id: VecId) -> Arc<ResourceHandle<T>> {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = handles.entry(id).or_insert_with_key(|id| {
            debug!(vec_id = %id, "Creating resource handle");
            Arc::new(ResourceHandle {
                id: id.clone(),
                fetcher: Arc::clone(&self.fetcher),
                endpoint: self.endpoint.clone(),
                states: Mutex::new(HashMap::new()),
            })
        });
        Arc::clone(handle)
    }

    /// Number of vectors with a handle
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// No handle has been created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freshness window applied to every range
    pub fn ttl(&self) -> Duration {
        self.endpoint.ttl
    }
}

/// Fetch entry point for one metric vector
///
/// Holds a fetch state per range key. States are created lazily and live as
/// long as the handle.
pub struct ResourceHandle<T> {
    id: VecId,
    fetcher: Arc<CachingFetcher>,
    endpoint: Endpoint,
    states: Mutex<HashMap<RangeKey, Arc<FetchState<T>>>>,
}

impl<T> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T: ResourceValue> ResourceHandle<T> {
    /// The vector this handle fetches
    pub fn id(&self) -> &VecId {
        &self.id
    }

    /// Fetches `range`, reusing an in-flight or recent result when possible
    ///
    /// Returns immediately with the current value when another fetch of the
    /// same range is in flight, or when the last success is younger than the
    /// TTL. Otherwise runs a stale-while-revalidate fetch and returns the
    /// value published by it. `Ok(None)` means nothing has been published for
    /// this range yet.
    ///
    /// # Errors
    ///
    /// The network error, when this call started the attempt and no cached
    /// value could stand in for it. Callers that found the attempt in flight
    /// never see it.
    pub async fn fetch(&self, range: RangeQuery) -> Result<Option<Arc<T>>, FetchError> {
        self.fetch_with(range, None).await
    }

    /// Like [`fetch`](Self::fetch), also forwarding every delivery to `on_update`
    ///
    /// `on_update` only hears from the attempt this call starts. It sees the
    /// cached value and then the fresh one, including deliveries that do not
    /// replace the published value.
    pub async fn fetch_with(
        &self,
        range: RangeQuery,
        on_update: Option<&dyn UpdateSink<T>>,
    ) -> Result<Option<Arc<T>>, FetchError> {
        let key = range.key();
        let state = self.state(&key);

        match state.begin(self.endpoint.ttl) {
            Begin::InFlight => {
                debug!(vec_id = %self.id, range = %key, "Fetch in flight, returning current value");
                return Ok(state.value());
            }
            Begin::Fresh => {
                debug!(vec_id = %self.id, range = %key, "Within TTL, skipping network");
                return Ok(state.value());
            }
            Begin::Start => {}
        }

        let guard = SettleGuard::new(&state);
        let result = async {
            let url = vec_url(
                &self.endpoint.base_url,
                &self.endpoint.api_prefix,
                &self.id,
                &range,
            )?;
            let publish = |value: &Arc<T>, origin: Origin| {
                state.publish(value, origin);
                if let Some(sink) = on_update {
                    sink.deliver(value, origin);
                }
            };
            self.fetcher.get::<T>(&url, Some(&publish)).await
        }
        .instrument(spans::fetch_range(&self.id.to_string(), key.as_str()))
        .await;

        match result {
            Ok(_) => {
                guard.settle(true);
                Ok(state.value())
            }
            Err(e) => {
                guard.settle(false);
                warn!(vec_id = %self.id, range = %key, error = %e, "Range fetch failed");
                Err(e)
            }
        }
    }

    /// Fetches the configured default range
    pub async fn fetch_default(&self) -> Result<Option<Arc<T>>, FetchError> {
        self.fetch(self.endpoint.default_range).await
    }

    /// Watches the state of `range`
    ///
    /// The receiver sees every transition: loading, each published value, and
    /// the settle.
    pub fn subscribe(&self, range: RangeQuery) -> watch::Receiver<Snapshot<T>> {
        self.state(&range.key()).subscribe()
    }

    /// Current state of `range`
    pub fn snapshot(&self, range: RangeQuery) -> Snapshot<T> {
        self.state(&range.key()).snapshot()
    }

    /// Waits until no fetch of `range` is in flight and returns its value
    pub async fn settled(&self, range: RangeQuery) -> Option<Arc<T>> {
        let mut rx = self.subscribe(range);
        let value = match rx.wait_for(|snapshot| snapshot.is_settled()).await {
            Ok(snapshot) => snapshot.value.clone(),
            Err(_) => None,
        };
        value
    }

    fn state(&self, key: &RangeKey) -> Arc<FetchState<T>> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            states
                .entry(key.clone())
                .or_insert_with(|| Arc::new(FetchState::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreHandle;
    use crate::transport::{HttpResponse, NetworkFetcher};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Always answers with the same body and records the URLs it saw
    struct Fixed {
        body: serde_json::Value,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl Fixed {
        fn new(body: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NetworkFetcher for Fixed {
        async fn get(&self, url: &Url, _timeout: Duration) -> Result<HttpResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            Ok(HttpResponse::json(&self.body))
        }
    }

    fn registry(network: Arc<Fixed>) -> ResourceRegistry<Vec<f64>> {
        let fetcher = Arc::new(CachingFetcher::new(StoreHandle::memory(), network));
        ResourceRegistry::new(fetcher, &VecscanConfig::minimal())
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = registry(Fixed::new(json!([])));
        let a = registry.get_or_create(VecId::new("height", "market_cap"));
        let b = registry.get_or_create(VecId::new("height", "market_cap"));
        let c = registry.get_or_create(VecId::new("dateindex", "market_cap"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_builds_vector_url() {
        let network = Fixed::new(json!([1.0, 2.0]));
        let registry = registry(network.clone());
        let handle = registry.get_or_create(VecId::new("height", "market_cap"));

        let value = handle.fetch(RangeQuery::default()).await.unwrap();

        assert_eq!(value.as_deref(), Some(&vec![1.0, 2.0]));
        assert_eq!(
            *network.urls.lock().unwrap(),
            vec!["http://localhost:3110/api/vecs/height-to-market-cap?from=-10000".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ranges_are_tracked_separately() {
        let network = Fixed::new(json!([1.0]));
        let registry = registry(network.clone());
        let handle = registry.get_or_create(VecId::new("height", "close"));

        handle.fetch(RangeQuery::default()).await.unwrap();
        handle.fetch(RangeQuery::default()).await.unwrap();
        handle.fetch(RangeQuery::last(100)).await.unwrap();

        assert_eq!(network.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_snapshot_after_fetch() {
        let registry = registry(Fixed::new(json!([3.0])));
        let handle = registry.get_or_create(VecId::new("height", "close"));

        assert!(handle.snapshot(RangeQuery::default()).value.is_none());
        handle.fetch_default().await.unwrap();

        let snapshot = handle.snapshot(RangeQuery::default());
        assert!(snapshot.is_settled());
        assert!(snapshot.last_succeeded_at.is_some());
        assert_eq!(snapshot.origin, Some(Origin::Network));
        assert_eq!(
            handle.settled(RangeQuery::default()).await.as_deref(),
            Some(&vec![3.0])
        );
    }

    #[test]
    fn test_json_emptiness() {
        assert!(serde_json::Value::Null.is_empty_value());
        assert!(json!([]).is_empty_value());
        assert!(!json!({}).is_empty_value());
        assert!(!json!([0]).is_empty_value());
    }
}
