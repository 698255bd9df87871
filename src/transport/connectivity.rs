// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Host-reported network connectivity

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports whether the host believes it has network access
///
/// Consulted once per request after the cache lookup. When it reports
/// offline, no network attempt is made.
pub trait Connectivity: Send + Sync + fmt::Debug {
    /// `true` when a network request may succeed
    fn is_online(&self) -> bool;
}

/// Connectivity probe for hosts with no offline signal
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Connectivity toggled by the host
///
/// Clones share the same flag, so the host keeps one clone and flips it from
/// its own network-change notifications.
///
/// ```rust
/// use vecscan::transport::{Connectivity, ConnectivityFlag};
///
/// let flag = ConnectivityFlag::online();
/// let probe = flag.clone();
/// flag.set_online(false);
/// assert!(!probe.is_online());
/// ```
#[derive(Debug, Clone)]
pub struct ConnectivityFlag(Arc<AtomicBool>);

impl ConnectivityFlag {
    /// A flag that starts online
    pub fn online() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// A flag that starts offline
    pub fn offline() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Update the reported state
    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Release);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::online()
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
