// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Resource identities and range keys for metric vectors

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::config::constants::DEFAULT_RANGE_FROM;
use crate::errors::FetchError;

/// Identity of a metric vector: the index it is keyed by and the metric itself
///
/// # Examples
///
/// ```
/// use vecscan::VecId;
///
/// let id = VecId::new("height", "market_cap");
/// assert_eq!(id.path_segment(), "height-to-market-cap");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VecId {
    index: String,
    metric: String,
}

impl VecId {
    /// Creates an identity for `metric` indexed by `index`
    pub fn new(index: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            metric: metric.into(),
        }
    }

    /// Index name, e.g. `height` or `dateindex`
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Metric name, e.g. `market_cap`
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// URL path segment: `{index}-to-{metric}` with underscores as dashes
    pub fn path_segment(&self) -> String {
        format!(
            "{}-to-{}",
            self.index.replace('_', "-"),
            self.metric.replace('_', "-")
        )
    }
}

impl fmt::Display for VecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.metric)
    }
}

/// A window into a metric vector
///
/// `from` and `to` are point offsets as understood by the server; negative
/// values count back from the latest point. `to = None` means up to the
/// latest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeQuery {
    /// First point of the window
    pub from: i64,
    /// End of the window, unbounded when `None`
    pub to: Option<i64>,
}

impl Default for RangeQuery {
    fn default() -> Self {
        Self {
            from: DEFAULT_RANGE_FROM,
            to: None,
        }
    }
}

impl RangeQuery {
    /// An explicit window
    pub fn new(from: i64, to: Option<i64>) -> Self {
        Self { from, to }
    }

    /// The latest `count` points
    pub fn last(count: u32) -> Self {
        Self {
            from: -i64::from(count),
            to: None,
        }
    }

    /// Key identifying this window within one vector
    ///
    /// ```
    /// use vecscan::RangeQuery;
    ///
    /// assert_eq!(RangeQuery::default().key().as_str(), "-10000-");
    /// assert_eq!(RangeQuery::new(0, Some(100)).key().as_str(), "0-100");
    /// ```
    pub fn key(&self) -> RangeKey {
        match self.to {
            Some(to) => RangeKey(format!("{}-{}", self.from, to)),
            None => RangeKey(format!("{}-", self.from)),
        }
    }
}

/// Opaque per-vector key for a [`RangeQuery`]
///
/// Equal keys always produce the same request URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeKey(String);

impl RangeKey {
    /// The rendered key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds `{base_url}{api_prefix}/{index}-to-{metric}?from=..[&to=..]`
pub(crate) fn vec_url(
    base_url: &str,
    api_prefix: &str,
    id: &VecId,
    range: &RangeQuery,
) -> Result<Url, FetchError> {
    let raw = format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        api_prefix.trim_matches('/'),
        id.path_segment()
    );
    let mut url = Url::parse(&raw).map_err(|e| FetchError::invalid_url(raw.clone(), e))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("from", &range.from.to_string());
        if let Some(to) = range.to {
            query.append_pair("to", &to.to_string());
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_market_cap_url() {
        let url = vec_url(
            "http://localhost:3110",
            "/api/vecs",
            &VecId::new("height", "market_cap"),
            &RangeQuery::default(),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3110/api/vecs/height-to-market-cap?from=-10000"
        );
    }

    #[test]
    fn test_bounded_range_url() {
        let url = vec_url(
            "https://bitview.space/",
            "api/vecs/",
            &VecId::new("dateindex", "price_ohlc"),
            &RangeQuery::new(-30, Some(-1)),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://bitview.space/api/vecs/dateindex-to-price-ohlc?from=-30&to=-1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = vec_url(
            "not a url",
            "/api/vecs",
            &VecId::new("height", "close"),
            &RangeQuery::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_last() {
        assert_eq!(RangeQuery::last(500), RangeQuery::new(-500, None));
    }

    fn arb_range() -> impl Strategy<Value = RangeQuery> {
        (any::<i64>(), proptest::option::of(any::<i64>()))
            .prop_map(|(from, to)| RangeQuery::new(from, to))
    }

    proptest! {
        /// Property: two ranges share a key exactly when they are equal
        #[test]
        fn prop_key_is_injective(a in arb_range(), b in arb_range()) {
            prop_assert_eq!(a.key() == b.key(), a == b);
        }
    }
}
