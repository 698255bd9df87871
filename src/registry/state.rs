// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-key fetch state
//!
//! Each range key owns one [`FetchState`], a `watch` channel whose current
//! [`Snapshot`] is the single source of truth for that key. Transitions are
//! applied with `send_if_modified`, so the check of `loading` and the TTL and
//! the claim of the key happen as one step and no lock is held across an
//! `.await`.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use super::ResourceValue;
use crate::notify::Origin;

/// Observable state of one range of one vector
#[derive(Debug)]
pub struct Snapshot<T> {
    /// A network attempt for this key is in flight
    pub loading: bool,
    /// When the last successful fetch settled
    pub last_succeeded_at: Option<Instant>,
    /// Latest published value
    pub value: Option<Arc<T>>,
    /// Where `value` came from
    pub origin: Option<Origin>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading,
            last_succeeded_at: self.last_succeeded_at,
            value: self.value.clone(),
            origin: self.origin,
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            loading: false,
            last_succeeded_at: None,
            value: None,
            origin: None,
        }
    }
}

impl<T> Snapshot<T> {
    /// No network attempt is in flight
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    /// The last success is younger than `ttl` at `now`
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.last_succeeded_at
            .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }
}

/// What [`FetchState::begin`] decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Begin {
    /// The caller now owns the network attempt
    Start,
    /// Another caller's attempt is in flight
    InFlight,
    /// The last success is within the TTL
    Fresh,
}

pub(crate) struct FetchState<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T: ResourceValue> FetchState<T> {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// Claims the key for a network attempt unless it is loading or fresh
    pub(crate) fn begin(&self, ttl: Duration) -> Begin {
        let now = Instant::now();
        let mut decision = Begin::Start;
        self.tx.send_if_modified(|state| {
            if state.loading {
                decision = Begin::InFlight;
                false
            } else if state.is_fresh(now, ttl) {
                decision = Begin::Fresh;
                false
            } else {
                state.loading = true;
                true
            }
        });
        decision
    }

    /// Publishes a delivered value
    ///
    /// Empty values only land when nothing has been seen yet, and a cached
    /// value never replaces one that came from the network.
    pub(crate) fn publish(&self, value: &Arc<T>, origin: Origin) {
        self.tx.send_if_modified(|state| {
            if origin == Origin::Cache && state.origin == Some(Origin::Network) {
                return false;
            }
            if state.value.is_some() && value.is_empty_value() {
                return false;
            }
            state.value = Some(Arc::clone(value));
            state.origin = Some(origin);
            true
        });
    }

    /// Releases the key after an attempt
    pub(crate) fn settle(&self, succeeded: bool) {
        self.tx.send_modify(|state| {
            state.loading = false;
            if succeeded {
                state.last_succeeded_at = Some(Instant::now());
            }
        });
    }

    pub(crate) fn value(&self) -> Option<Arc<T>> {
        self.tx.borrow().value.clone()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }
}

/// Settles a claimed key if the fetch future is dropped before it finishes
///
/// Without this a cancelled fetch would leave `loading` set forever and the
/// key could never be fetched again.
pub(crate) struct SettleGuard<'a, T: ResourceValue> {
    state: &'a FetchState<T>,
    armed: bool,
}

impl<'a, T: ResourceValue> SettleGuard<'a, T> {
    pub(crate) fn new(state: &'a FetchState<T>) -> Self {
        Self { state, armed: true }
    }

    pub(crate) fn settle(mut self, succeeded: bool) {
        self.armed = false;
        self.state.settle(succeeded);
    }
}

impl<T: ResourceValue> Drop for SettleGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.state.settle(false);
        }
    }
}
