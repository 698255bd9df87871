// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for client configuration.

/// Errors that can occur while building a [`VecscanConfig`](crate::VecscanConfig)
/// or a client from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL (or a URL derived from it) does not parse.
    #[error("Invalid base URL '{input}': {source}")]
    InvalidBaseUrl {
        /// The offending URL string
        input: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value '{value}' for {var}: {details}")]
    InvalidEnv {
        /// Name of the environment variable
        var: String,
        /// The raw value
        value: String,
        /// Why it was rejected
        details: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {details}")]
    HttpClient {
        /// Details from the HTTP stack
        details: String,
    },
}

impl ConfigError {
    /// Create an `InvalidBaseUrl` error.
    pub fn invalid_base_url(input: impl Into<String>, source: url::ParseError) -> Self {
        ConfigError::InvalidBaseUrl {
            input: input.into(),
            source,
        }
    }

    /// Create an `InvalidEnv` error.
    pub fn invalid_env(
        var: impl Into<String>,
        value: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidEnv {
            var: var.into(),
            value: value.into(),
            details: details.into(),
        }
    }

    /// Create an `HttpClient` error.
    pub fn http_client(details: impl Into<String>) -> Self {
        ConfigError::HttpClient {
            details: details.into(),
        }
    }
}
