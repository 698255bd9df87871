// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for vecscan clients
//!
//! This module controls where resources are fetched from, how long a network
//! request may take, how long range fetches stay fresh in memory, and where the
//! persistent response cache lives.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use vecscan::VecscanConfig;
//! use std::time::Duration;
//!
//! let config = VecscanConfig::default();
//! assert_eq!(config.request_timeout, Duration::from_millis(5_000));
//! assert_eq!(config.range_ttl, Duration::from_millis(60_000));
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use vecscan::{RangeQuery, VecscanConfigBuilder};
//! use std::time::Duration;
//!
//! let config = VecscanConfigBuilder::new()
//!     .base_url("https://bitview.space")
//!     .request_timeout(Duration::from_secs(10))
//!     .default_range(RangeQuery::last(1_000))
//!     .build();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;
use crate::registry::RangeQuery;

pub mod constants;

use constants::{
    env, DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_RANGE_TTL_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};

/// Configuration for a vecscan client
///
/// Use [`VecscanConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct VecscanConfig {
    /// Server base URL; every request URL starts with it
    /// Default: `http://localhost:3110`
    pub base_url: String,

    /// Path prefix for metric vector endpoints
    /// Default: `/api/vecs`
    pub api_prefix: String,

    /// Timeout for a single network GET
    /// Default: 5 seconds
    pub request_timeout: Duration,

    /// How long a successful range fetch is served from memory
    /// Default: 60 seconds
    pub range_ttl: Duration,

    /// Window requested when a caller has no range of its own
    /// Default: last 10,000 points, unbounded end
    pub default_range: RangeQuery,

    /// Directory for the persistent response cache
    /// Default: `<tmp>/vecscan`. `None` disables persistence.
    pub cache_dir: Option<PathBuf>,
}

impl Default for VecscanConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl VecscanConfig {
    /// Create config with the defaults used by dashboards
    ///
    /// Responses are persisted under the system temp directory so a restarted
    /// process can paint cached data before the network answers.
    pub fn with_common_defaults() -> Self {
        Self {
            cache_dir: Some(std::env::temp_dir().join("vecscan")),
            ..Self::minimal()
        }
    }

    /// Create config without a persistent cache
    ///
    /// Suitable for tests and short-lived tools where every run should hit the
    /// network.
    ///
    /// ```rust
    /// use vecscan::VecscanConfig;
    ///
    /// let config = VecscanConfig::minimal();
    /// assert!(config.cache_dir.is_none());
    /// ```
    pub fn minimal() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            range_ttl: Duration::from_millis(DEFAULT_RANGE_TTL_MS),
            default_range: RangeQuery::default(),
            cache_dir: None,
        }
    }

    /// Build a config from `VECSCAN_*` environment variables
    ///
    /// Unset variables keep their [`with_common_defaults`](Self::with_common_defaults)
    /// value. Numeric variables that do not parse are rejected rather than
    /// silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::with_common_defaults();

        if let Some(base_url) = lookup(env::BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(env::TIMEOUT_MS) {
            config.request_timeout = parse_millis(env::TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(env::RANGE_TTL_MS) {
            config.range_ttl = parse_millis(env::RANGE_TTL_MS, &raw)?;
        }
        if let Some(dir) = lookup(env::CACHE_DIR) {
            config.cache_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        config.base_url()?;
        Ok(config)
    }

    /// Parse the configured base URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::invalid_base_url(&self.base_url, e))
    }

    /// Resolve a path such as `/api/last-height` against the base URL
    ///
    /// The path is appended to the base URL verbatim, so a base URL with its
    /// own path prefix keeps it.
    ///
    /// ```rust
    /// use vecscan::VecscanConfigBuilder;
    ///
    /// let config = VecscanConfigBuilder::new()
    ///     .base_url("https://example.com/bitview/")
    ///     .build();
    /// let url = config.resolve("/api/last-height").unwrap();
    /// assert_eq!(url.as_str(), "https://example.com/bitview/api/last-height");
    /// ```
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::invalid_base_url(joined.clone(), e))
    }
}

fn parse_millis(var: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::invalid_env(var, raw, e.to_string()))
}

/// Builder for [`VecscanConfig`]
///
/// # Example
///
/// ```rust
/// use vecscan::VecscanConfigBuilder;
/// use std::time::Duration;
///
/// let config = VecscanConfigBuilder::new()
///     .range_ttl(Duration::from_secs(30))
///     .cache_dir("/var/cache/vecscan")
///     .build();
/// assert_eq!(config.range_ttl, Duration::from_secs(30));
/// ```
pub struct VecscanConfigBuilder {
    config: VecscanConfig,
}

impl Default for VecscanConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VecscanConfigBuilder {
    /// Create a new builder with minimal defaults (no persistent cache)
    pub fn new() -> Self {
        Self {
            config: VecscanConfig::minimal(),
        }
    }

    /// Start with common defaults
    ///
    /// Initializes the builder with the same defaults as
    /// [`VecscanConfig::with_common_defaults`].
    pub fn with_defaults() -> Self {
        Self {
            config: VecscanConfig::with_common_defaults(),
        }
    }

    /// Set the server base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the path prefix for metric vector endpoints
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// Set the network timeout for a single request
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set how long successful range fetches are served from memory
    pub fn range_ttl(mut self, ttl: Duration) -> Self {
        self.config.range_ttl = ttl;
        self
    }

    /// Set the window used when callers do not pick one
    pub fn default_range(mut self, range: RangeQuery) -> Self {
        self.config.default_range = range;
        self
    }

    /// Persist responses under `dir`
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// Disable the persistent cache
    pub fn without_cache(mut self) -> Self {
        self.config.cache_dir = None;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> VecscanConfig {
        self.config
    }
}
