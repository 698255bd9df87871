// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for fetching resources.
//!
//! These are the failures a consumer can observe from
//! [`CachingFetcher::get`](crate::CachingFetcher::get) and
//! [`ResourceHandle::fetch`](crate::ResourceHandle::fetch). They only surface
//! when no cached value is available to fall back on.

use std::time::Duration;

/// Errors that can occur while delivering a resource.
///
/// # Examples
///
/// ```rust
/// use vecscan::FetchError;
///
/// let error = FetchError::http("http://localhost:3110/api/vecs/height-to-close", 503);
/// assert_eq!(error.status(), Some(503));
/// assert!(!error.is_offline());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The host reported no connectivity and nothing was cached for the URL.
    #[error("Offline and no cached value for {url}")]
    Offline {
        /// Request URL
        url: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// Request URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out after {after:?}")]
    Timeout {
        /// Request URL
        url: String,
        /// The timeout that elapsed
        after: Duration,
    },

    /// The response body was not valid JSON or did not have the expected shape.
    #[error("Failed to parse response from {url}: {details}")]
    Parse {
        /// Request URL
        url: String,
        /// Details about the parse failure
        details: String,
        /// The underlying parse error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connection-level failure (DNS, TLS, reset, body read).
    #[error("Transport error for {url}: {details}")]
    Transport {
        /// Request URL
        url: String,
        /// Details about the transport failure
        details: String,
    },

    /// A request URL could not be built.
    #[error("Invalid request URL '{input}': {source}")]
    InvalidUrl {
        /// The string that failed to parse
        input: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Create an `Offline` error for a URL.
    pub fn offline(url: impl Into<String>) -> Self {
        FetchError::Offline { url: url.into() }
    }

    /// Create an `Http` error for a URL and status.
    pub fn http(url: impl Into<String>, status: u16) -> Self {
        FetchError::Http {
            url: url.into(),
            status,
        }
    }

    /// Create a `Timeout` error for a URL.
    pub fn timeout(url: impl Into<String>, after: Duration) -> Self {
        FetchError::Timeout {
            url: url.into(),
            after,
        }
    }

    /// Create a `Parse` error from any deserialization error.
    pub fn parse(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FetchError::Parse {
            url: url.into(),
            details: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Create a `Transport` error with details.
    pub fn transport(url: impl Into<String>, details: impl Into<String>) -> Self {
        FetchError::Transport {
            url: url.into(),
            details: details.into(),
        }
    }

    /// Create an `InvalidUrl` error.
    pub fn invalid_url(input: impl Into<String>, source: url::ParseError) -> Self {
        FetchError::InvalidUrl {
            input: input.into(),
            source,
        }
    }

    /// HTTP status, when the failure came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure was the offline short-circuit.
    pub fn is_offline(&self) -> bool {
        matches!(self, FetchError::Offline { .. })
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_url_and_status() {
        let error = FetchError::http("http://host/api/vecs/height-to-close", 404);
        assert_eq!(
            error.to_string(),
            "HTTP 404 from http://host/api/vecs/height-to-close"
        );
    }

    #[test]
    fn test_parse_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = FetchError::parse("http://host/x", source);
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().starts_with("Failed to parse response from http://host/x"));
    }

    #[test]
    fn test_classifiers() {
        assert!(FetchError::offline("u").is_offline());
        assert!(FetchError::timeout("u", Duration::from_secs(5)).is_timeout());
        assert_eq!(FetchError::transport("u", "reset").status(), None);
    }
}
