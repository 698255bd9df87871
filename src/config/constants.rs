// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Default values and fixed identifiers
//!
//! This module centralizes the magic numbers used by the delivery layer so the
//! defaults applied by [`VecscanConfig`](super::VecscanConfig) and the values
//! asserted in tests stay in one place.

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3110";

/// Path prefix under which metric vectors are served
pub const DEFAULT_API_PREFIX: &str = "/api/vecs";

/// Network timeout for a single GET, in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// How long a successful range fetch suppresses further network access, in milliseconds
pub const DEFAULT_RANGE_TTL_MS: u64 = 60_000;

/// Default start of a range query: the last 10,000 points
pub const DEFAULT_RANGE_FROM: i64 = -10_000;

/// Name of the durable cache region
///
/// Bump the suffix when the persisted format changes incompatibly.
pub const CACHE_NAME: &str = "vecscan-cache-v1";

/// Entry files kept in the durable cache region before the oldest are evicted
pub const DEFAULT_DISK_MAX_ENTRIES: usize = 512;

/// Environment variables read by [`VecscanConfig::from_env`](super::VecscanConfig::from_env)
pub mod env {
    /// Server base URL, e.g. `https://bitview.space`
    pub const BASE_URL: &str = "VECSCAN_BASE_URL";
    /// Request timeout in milliseconds
    pub const TIMEOUT_MS: &str = "VECSCAN_TIMEOUT_MS";
    /// Range TTL in milliseconds
    pub const RANGE_TTL_MS: &str = "VECSCAN_RANGE_TTL_MS";
    /// Directory holding the persistent cache file
    pub const CACHE_DIR: &str = "VECSCAN_CACHE_DIR";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_is_last_ten_thousand_points() {
        assert_eq!(DEFAULT_RANGE_FROM, -10_000);
    }

    #[test]
    fn test_ttl_exceeds_request_timeout() {
        // A TTL shorter than a request would let a settled key go stale before
        // its own response arrives.
        assert!(DEFAULT_RANGE_TTL_MS > DEFAULT_REQUEST_TIMEOUT_MS);
    }
}
