// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Client entry point
//!
//! [`ApiClient`] owns the one [`CachingFetcher`] a process needs: one store
//! handle, one HTTP stack, one connectivity probe. Generic resources are
//! fetched by path with [`ApiClient::get`]; metric vectors go through the
//! [`ResourceRegistry`] obtained from [`ApiClient::registry`], one per value
//! type and shared by every clone of the client.

use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tower::Layer;
use tracing::info;

use crate::cache::CachingFetcher;
use crate::config::VecscanConfig;
use crate::errors::{ConfigError, FetchError, VecscanError};
use crate::notify::UpdateSink;
use crate::registry::{ResourceRegistry, ResourceValue};
use crate::store::StoreHandle;
use crate::transport::{Connectivity, HttpFetcher, LoggingLayer, NetworkFetcher};

/// Stale-while-revalidate client for a vecs API server
///
/// # Examples
///
/// ```rust,ignore
/// use vecscan::{ApiClient, VecscanConfig};
///
/// let client = ApiClient::new(VecscanConfig::from_env()?).await?;
/// let height: std::sync::Arc<u64> = client.get("/api/last-height", None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: VecscanConfig,
    fetcher: Arc<CachingFetcher>,
    /// One `ResourceRegistry<T>` per value type, keyed by `TypeId::of::<T>()`
    registries: Arc<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>,
}

impl ApiClient {
    /// Builds a client over HTTP with the store under `config.cache_dir`
    ///
    /// A store that cannot be opened is not an error: the client runs without
    /// persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub async fn new(config: VecscanConfig) -> Result<Self, VecscanError> {
        config.base_url()?;
        let store = StoreHandle::open(config.cache_dir.as_deref()).await;
        let network = LoggingLayer::new().layer(HttpFetcher::new()?);

        info!(
            base_url = %config.base_url,
            store = store.backend_name(),
            timeout_ms = config.request_timeout.as_millis() as u64,
            "vecscan client ready"
        );

        let fetcher = CachingFetcher::new(store, Arc::new(network))
            .with_timeout(config.request_timeout);
        Ok(Self::from_fetcher(config, fetcher))
    }

    /// Builds a client from explicit parts
    pub fn with_parts(
        config: VecscanConfig,
        store: StoreHandle,
        network: Arc<dyn NetworkFetcher>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let fetcher = CachingFetcher::new(store, network)
            .with_timeout(config.request_timeout)
            .with_connectivity(connectivity);
        Self::from_fetcher(config, fetcher)
    }

    fn from_fetcher(config: VecscanConfig, fetcher: CachingFetcher) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            registries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Delivers the resource at `path` relative to the base URL
    ///
    /// See [`CachingFetcher::get`] for the delivery contract.
    pub async fn get<T>(
        &self,
        path: &str,
        on_update: Option<&dyn UpdateSink<T>>,
    ) -> Result<Arc<T>, FetchError>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let url = self.config.resolve(path).map_err(|e| match e {
            ConfigError::InvalidBaseUrl { input, source } => {
                FetchError::invalid_url(input, source)
            }
            other => FetchError::transport(path, other.to_string()),
        })?;
        self.fetcher.get(&url, on_update).await
    }

    /// The registry of metric vectors decoded as `T`
    ///
    /// Every call for the same `T`, from this client or any clone of it,
    /// returns the same registry, so handles and in-flight fetches are shared
    /// process-wide.
    pub fn registry<T: ResourceValue>(&self) -> Arc<ResourceRegistry<T>> {
        let mut registries = self
            .registries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = registries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| self.new_registry::<T>());

        match Arc::clone(slot).downcast::<ResourceRegistry<T>>() {
            Ok(registry) => registry,
            Err(_) => {
                // Unreachable while slots are only filled by `new_registry::<T>`
                let registry = Arc::new(ResourceRegistry::new(
                    Arc::clone(&self.fetcher),
                    &self.config,
                ));
                *slot = Arc::clone(&registry) as Arc<dyn Any + Send + Sync>;
                registry
            }
        }
    }

    fn new_registry<T: ResourceValue>(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::new(ResourceRegistry::<T>::new(
            Arc::clone(&self.fetcher),
            &self.config,
        ))
    }

    /// The shared stale-while-revalidate fetcher
    pub fn caching_fetcher(&self) -> &Arc<CachingFetcher> {
        &self.fetcher
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &VecscanConfig {
        &self.config
    }

    /// Waits for background cache writes to finish
    pub async fn flush(&self) {
        self.fetcher.flush().await;
    }
}
