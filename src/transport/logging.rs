// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for network fetchers.
//!
//! Wraps any [`NetworkFetcher`] so each GET is recorded in a tracing span with
//! its status, body size and duration.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tower::Layer;
use tracing::{debug, trace, warn, Instrument, Span};
use url::Url;

use super::{HttpResponse, NetworkFetcher};
use crate::errors::FetchError;
use crate::spans;

/// A Tower layer that adds logging/tracing to network fetches.
///
/// # Example
///
/// ```rust,ignore
/// use vecscan::transport::{HttpFetcher, LoggingLayer};
/// use tower::Layer;
///
/// let fetcher = LoggingLayer::new().with_response_logging().layer(HttpFetcher::new()?);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    /// Whether to log response bodies (can be very large for vectors)
    log_responses: bool,
}

impl LoggingLayer {
    /// Creates a new logging layer; only timing, status and errors are logged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables logging of response bodies at `trace` level.
    pub fn with_response_logging(mut self) -> Self {
        self.log_responses = true;
        self
    }
}

impl<F> Layer<F> for LoggingLayer {
    type Service = LoggingFetcher<F>;

    fn layer(&self, inner: F) -> Self::Service {
        LoggingFetcher {
            inner,
            log_responses: self.log_responses,
        }
    }
}

/// A fetcher that logs requests and responses of the fetcher it wraps.
#[derive(Clone, Debug)]
pub struct LoggingFetcher<F> {
    inner: F,
    log_responses: bool,
}

#[async_trait]
impl<F> NetworkFetcher for LoggingFetcher<F>
where
    F: NetworkFetcher,
{
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let span = spans::network_get(url);

        async {
            let start = Instant::now();
            debug!(timeout_ms = timeout.as_millis() as u64, "GET request");

            let result = self.inner.get(url, timeout).await;
            let duration = start.elapsed();
            Span::current().record("duration_ms", duration.as_millis() as u64);

            match &result {
                Ok(response) => {
                    if self.log_responses {
                        trace!(
                            status = response.status,
                            body = %String::from_utf8_lossy(&response.body),
                            duration_ms = %duration.as_millis(),
                            "GET response"
                        );
                    } else {
                        debug!(
                            status = response.status,
                            bytes = response.body.len(),
                            etag = ?response.validator.as_ref().map(|v| v.as_str()),
                            duration_ms = %duration.as_millis(),
                            "GET response"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        duration_ms = %duration.as_millis(),
                        "GET failed"
                    );
                }
            }

            result
        }
        .instrument(span)
        .await
    }
}
