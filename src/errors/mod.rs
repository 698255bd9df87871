// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the vecscan library.
//!
//! This module follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`FetchError`],
//!   [`StoreError`], [`ConfigError`])
//! - **Unified error type** ([`VecscanError`]) for callers that do not need to
//!   distinguish between sources
//!
//! # Propagation
//!
//! Any failure that has a cached fallback is recovered inside the delivery
//! layer and never reaches the caller. [`StoreError`] never propagates out of
//! the store adapter at all.
//!
//! # Examples
//!
//! ```rust,ignore
//! use vecscan::{ApiClient, FetchError, RangeQuery, VecId};
//!
//! let registry = client.registry::<Vec<f64>>();
//! let handle = registry.get_or_create(VecId::new("height", "market_cap"));
//!
//! match handle.fetch(RangeQuery::default()).await {
//!     Ok(Some(values)) => println!("{} points", values.len()),
//!     Ok(None) => println!("still loading"),
//!     Err(FetchError::Offline { .. }) => eprintln!("offline, nothing cached"),
//!     Err(e) => eprintln!("fetch failed: {e}"),
//! }
//! ```

mod config;
mod fetch;
mod store;

pub use config::ConfigError;
pub use fetch::FetchError;
pub use store::StoreError;

/// Unified error type for all vecscan operations.
///
/// Module-specific error types convert via `From`, so `?` propagates them.
#[derive(Debug, thiserror::Error)]
pub enum VecscanError {
    /// Error delivering a resource.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from a store backend.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error in client configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
