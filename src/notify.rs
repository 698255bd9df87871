// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Update boundary between the delivery layer and its consumers.
//!
//! A single `get` delivers zero, one, or two values: the cached one first, the
//! fresh one second, and never the same value twice. Consumers receive them
//! through an [`UpdateSink`]. Any `Fn(&Arc<T>, Origin)` closure is a sink, so a
//! reactive store on the other side only needs to forward the value.

use std::sync::Arc;

/// Where a delivered value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Read back from the persistent store
    Cache,
    /// Returned by the server during this call
    Network,
}

/// Receives values as they become available
///
/// Implementations must be cheap and must not block: deliveries happen
/// inline on the task running the fetch.
pub trait UpdateSink<T>: Send + Sync {
    /// Called once per delivered value
    fn deliver(&self, value: &Arc<T>, origin: Origin);
}

impl<T, F> UpdateSink<T> for F
where
    F: Fn(&Arc<T>, Origin) + Send + Sync,
{
    fn deliver(&self, value: &Arc<T>, origin: Origin) {
        self(value, origin)
    }
}
