// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # vecscan
//!
//! Client-side delivery of time-indexed metric vectors from a vecs API server,
//! with stale-while-revalidate caching and deduplicated range fetches.
//!
//! ## Features
//!
//! - **Stale-while-revalidate**: a cached value is delivered at once, the
//!   fresh one only if it differs ([`CachingFetcher`])
//! - **Single-flight range fetches**: concurrent requests for one range of one
//!   vector issue a single network call ([`ResourceRegistry`])
//! - **TTL suppression**: a range fetched successfully within the last minute
//!   is served from memory
//! - **Graceful degradation**: offline hosts and failing servers fall back to
//!   the persistent cache, and a cache that cannot be opened is simply skipped
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vecscan::{ApiClient, Origin, RangeQuery, VecId, VecscanConfig};
//!
//! let client = ApiClient::new(VecscanConfig::from_env()?).await?;
//!
//! // Metric vectors, deduplicated per range
//! let registry = client.registry::<Vec<f64>>();
//! let market_cap = registry.get_or_create(VecId::new("height", "market_cap"));
//! let mut updates = market_cap.subscribe(RangeQuery::default());
//! let points = market_cap.fetch(RangeQuery::default()).await?;
//!
//! // Any other JSON resource, with an update callback
//! let on_update = |height: &std::sync::Arc<u64>, origin: Origin| {
//!     println!("height {height} from {origin:?}");
//! };
//! let height = client.get::<u64>("/api/last-height", Some(&on_update)).await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`client`]: the [`ApiClient`] entry point
//! - [`cache`]: the stale-while-revalidate [`CachingFetcher`]
//! - [`registry`]: vector identities, range keys and per-key fetch state
//! - [`store`]: persistent store backends
//! - [`transport`]: network fetchers and connectivity
//! - [`freshness`]: the changed/unchanged decision
//! - [`notify`]: the update callback boundary
//! - [`config`]: client configuration
//! - [`errors`]: error types

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod freshness;
pub mod notify;
pub mod registry;
mod spans;
pub mod store;
pub mod transport;

pub use cache::CachingFetcher;
pub use client::ApiClient;
pub use config::{VecscanConfig, VecscanConfigBuilder};
pub use errors::{ConfigError, FetchError, StoreError, VecscanError};
pub use freshness::Freshness;
pub use notify::{Origin, UpdateSink};
pub use registry::{
    RangeKey, RangeQuery, ResourceHandle, ResourceRegistry, ResourceValue, Snapshot, VecId,
};
pub use store::{
    CacheEntry, CacheStats, DiskStore, MemoryStore, NoOpStore, PersistentStore, StoreHandle,
    Validator,
};
