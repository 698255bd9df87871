// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the persistent response store.
//!
//! Store failures never reach consumers of the delivery layer: reads degrade to
//! a cache miss and background writes are logged and dropped. The type exists
//! so backends can report what went wrong to those log sites.

/// Errors that can occur inside a [`PersistentStore`](crate::PersistentStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Error reading from or writing to the cache file.
    #[error("Cache I/O error at {path}: {details}")]
    Io {
        /// Path to the cache file that caused the error
        path: String,
        /// Details about the I/O error
        details: String,
        /// The underlying I/O error, if available
        #[source]
        source: Option<std::io::Error>,
    },

    /// Error serializing or deserializing the cache file.
    #[error("Serialization error: {details}")]
    Serialization {
        /// Details about the serialization error
        details: String,
        /// The underlying serialization error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Create an `Io` error from a path and the underlying I/O error.
    pub fn io(path: impl Into<String>, details: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            details: details.into(),
            source: Some(source),
        }
    }

    /// Create an `Io` error without an underlying I/O error.
    pub fn io_message(path: impl Into<String>, details: impl Into<String>) -> Self {
        StoreError::Io {
            path: path.into(),
            details: details.into(),
            source: None,
        }
    }

    /// Create a `Serialization` error from any serialization error.
    pub fn serialization(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Serialization {
            details: source.to_string(),
            source: Box::new(source),
        }
    }
}
