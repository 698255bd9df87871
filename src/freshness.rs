// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Deciding whether a freshly fetched body differs from the cached one.
//!
//! The check runs after every successful network fetch that had a cached
//! counterpart. When it reports [`Freshness::Unchanged`] the consumer is not
//! notified a second time and nothing is written back to the store.
//!
//! Rules, in order of preference:
//!
//! 1. If both sides carry the same validator (`ETag`), the body is unchanged.
//!    Differing validators decide nothing on their own: servers may issue a
//!    new tag for an identical body, so the body rules below still apply.
//! 2. For two array bodies: equal length and an equal last element means
//!    unchanged. Metric vectors are append-only, so a new point always shows up
//!    at the tail. A change to an element in the middle of the array is NOT
//!    detected; that is an accepted false negative of the heuristic.
//! 3. Anything else is compared structurally.

use serde_json::Value;

use crate::store::Validator;

/// Outcome of comparing a fresh body against a cached one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The fresh body carries nothing new
    Unchanged,
    /// The fresh body must be delivered and persisted
    Changed,
}

/// A body as observed from either the cache or the network
#[derive(Debug, Clone, Copy)]
pub struct Observed<'a> {
    /// Parsed JSON body
    pub body: &'a Value,
    /// Validator that came with it
    pub validator: Option<&'a Validator>,
}

impl<'a> Observed<'a> {
    /// Pairs a body with its optional validator
    pub fn new(body: &'a Value, validator: Option<&'a Validator>) -> Self {
        Self { body, validator }
    }
}

/// Compares a fresh observation against the cached one
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vecscan::freshness::{compare, Freshness, Observed};
///
/// let cached = json!([1.0, 2.0, 3.0]);
/// let appended = json!([1.0, 2.0, 3.0, 4.0]);
///
/// assert_eq!(
///     compare(&Observed::new(&cached, None), &Observed::new(&cached, None)),
///     Freshness::Unchanged
/// );
/// assert_eq!(
///     compare(&Observed::new(&cached, None), &Observed::new(&appended, None)),
///     Freshness::Changed
/// );
/// ```
pub fn compare(cached: &Observed<'_>, fresh: &Observed<'_>) -> Freshness {
    if let (Some(old), Some(new)) = (cached.validator, fresh.validator) {
        if old == new {
            return Freshness::Unchanged;
        }
    }

    let unchanged = match (cached.body, fresh.body) {
        (Value::Array(old), Value::Array(new)) => {
            old.len() == new.len() && old.last() == new.last()
        }
        (old, new) => old == new,
    };

    if unchanged {
        Freshness::Unchanged
    } else {
        Freshness::Changed
    }
}
