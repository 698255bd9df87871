// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! `reqwest`-backed network fetcher

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ETAG};
use std::time::Duration;
use url::Url;

use super::{HttpResponse, NetworkFetcher};
use crate::errors::{ConfigError, FetchError};
use crate::store::Validator;

/// Network fetcher over a shared `reqwest::Client`
///
/// The client is cheap to clone and pools connections, so one fetcher should
/// serve the whole process.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with a crate-identifying user agent
    pub fn new() -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vecscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::http_client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify(url: &Url, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url.as_str(), timeout)
    } else {
        FetchError::transport(url.as_str(), error.to_string())
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        let status = response.status().as_u16();
        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(Validator::new);
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(url, timeout, e))?
            .to_vec();

        Ok(HttpResponse {
            status,
            body,
            validator,
        })
    }
}
