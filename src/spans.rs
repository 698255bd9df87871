// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for vecscan operations.
//!
//! Telemetry is kept apart from delivery logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and attaches
//! it with [`tracing::Instrument`].
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, url: &Url) -> Result<T> {
//!     async { /* logic */ }.instrument(spans::my_operation(url)).await
//! }
//! ```

use tracing::{Level, Span};
use url::Url;

/// Span for one stale-while-revalidate `get`.
///
/// Parent: `fetch_range` span when called through the registry
/// Children: `network_get`
#[inline]
pub(crate) fn cached_get(url: &Url) -> Span {
    tracing::debug_span!("vecscan.get", url = %url)
}

/// Span for a registry fetch of one range of one vector.
///
/// This is the entry point dashboards call, so it is recorded at INFO.
///
/// Parent: None (root span for this operation)
/// Children: `cached_get` when the fetch reaches the cache layer
#[inline]
pub(crate) fn fetch_range(vec_id: &str, range_key: &str) -> Span {
    tracing::span!(
        Level::INFO,
        "vecscan.fetch",
        vec_id = %vec_id,
        range = %range_key,
    )
}

/// Span for a single network GET.
///
/// Parent: `cached_get`
#[inline]
pub(crate) fn network_get(url: &Url) -> Span {
    tracing::debug_span!(
        "vecscan.network_get",
        url = %url,
        duration_ms = tracing::field::Empty,
    )
}

/// Span for a background write to the persistent store.
///
/// Parent: whatever span scheduled the write
#[inline]
pub(crate) fn store_put(url: &str) -> Span {
    tracing::trace_span!("vecscan.store_put", url = %url)
}
