// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Network access for the delivery layer.
//!
//! - [`NetworkFetcher`]: the seam every GET goes through
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`LoggingLayer`]: Tower layer wrapping any fetcher with tracing output
//! - [`Connectivity`]: host-reported online/offline state
//!
//! Fetchers return a raw [`HttpResponse`]; status checking and JSON parsing
//! happen in [`HttpResponse::into_json`] so every implementation gets the same
//! error classification.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vecscan::transport::{HttpFetcher, LoggingLayer};
//! use tower::Layer;
//!
//! let fetcher = LoggingLayer::new().layer(HttpFetcher::new()?);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::FetchError;
use crate::store::Validator;

mod connectivity;
mod http;
mod logging;

pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use http::HttpFetcher;
pub use logging::{LoggingFetcher, LoggingLayer};

/// A response as received from the network, before interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Raw body bytes
    pub body: Vec<u8>,
    /// `ETag` header, if present
    pub validator: Option<Validator>,
}

/// A successfully parsed response body
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBody {
    /// Parsed JSON document
    pub body: Value,
    /// `ETag` header, if present
    pub validator: Option<Validator>,
}

impl HttpResponse {
    /// A 200 response carrying `body` serialized as JSON
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string().into_bytes(),
            validator: None,
        }
    }

    /// A response with the given status and an empty body
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            validator: None,
        }
    }

    /// Attach an `ETag`
    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(Validator::new(validator));
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Checks the status and parses the body as JSON
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] for a non-2xx status
    /// - [`FetchError::Parse`] when the body is not valid JSON
    pub fn into_json(self, url: &Url) -> Result<FetchedBody, FetchError> {
        if !self.is_success() {
            return Err(FetchError::http(url.as_str(), self.status));
        }
        let body = serde_json::from_slice(&self.body).map_err(|e| FetchError::parse(url.as_str(), e))?;
        Ok(FetchedBody {
            body,
            validator: self.validator,
        })
    }
}

/// Performs a single timeout-bounded GET
///
/// Implementations report connection failures as [`FetchError::Transport`]
/// and timeouts as [`FetchError::Timeout`]. Any HTTP status is a successful
/// fetch at this level.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// Issues `GET url`, giving up after `timeout`
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError>;
}

#[async_trait]
impl<F> NetworkFetcher for std::sync::Arc<F>
where
    F: NetworkFetcher + ?Sized,
{
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError> {
        (**self).get(url, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url() -> Url {
        Url::parse("http://localhost:3110/api/vecs/height-to-close").unwrap()
    }

    #[test]
    fn test_into_json_parses_body_and_keeps_validator() {
        let response = HttpResponse::json(&json!([1, 2, 3])).with_validator("\"abc\"");
        let fetched = response.into_json(&url()).unwrap();
        assert_eq!(fetched.body, json!([1, 2, 3]));
        assert_eq!(fetched.validator, Some(Validator::new("\"abc\"")));
    }

    #[test]
    fn test_into_json_rejects_non_success() {
        let err = HttpResponse::status(503).into_json(&url()).unwrap_err();
        assert_eq!(err.status(), Some(503));

        // 3xx is not followed at this level
        let err = HttpResponse::status(304).into_json(&url()).unwrap_err();
        assert_eq!(err.status(), Some(304));
    }

    #[test]
    fn test_into_json_rejects_invalid_json() {
        let response = HttpResponse {
            status: 200,
            body: b"<html>".to_vec(),
            validator: None,
        };
        assert!(matches!(
            response.into_json(&url()),
            Err(FetchError::Parse { .. })
        ));
    }
}
