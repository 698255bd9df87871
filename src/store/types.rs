// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for persisted responses
//!
//! - [`Validator`]: an opaque transport validator (the `ETag` header value)
//! - [`CacheEntry`]: one persisted response body keyed by its full request URL

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Opaque validator sent by the server alongside a body
///
/// Two bodies carrying equal validators are treated as identical without
/// comparing payloads. Weak (`W/`) and strong validators are compared as
/// opaque strings.
///
/// # Examples
///
/// ```
/// use vecscan::Validator;
///
/// let a = Validator::new("\"abc\"");
/// let b = Validator::new("\"abc\"");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "\"abc\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Validator(String);

impl Validator {
    /// Wrap a raw header value
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw header value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted response
///
/// Created or overwritten after every network fetch whose body differs from
/// what was cached. Entries are never deleted by the delivery layer; backends
/// may evict under their own size policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full request URL including query string
    pub url: String,
    /// Parsed JSON body of a successful response
    pub body: Value,
    /// `ETag` sent with the body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<Validator>,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry for `url` stamped with the current time
    pub fn new(url: &Url, body: Value, validator: Option<Validator>) -> Self {
        Self {
            url: url.as_str().to_string(),
            body,
            validator,
            stored_at: Utc::now(),
        }
    }
}
