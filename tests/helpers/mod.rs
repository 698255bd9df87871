// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for vecscan integration tests
//!
//! Provides a scriptable network fetcher and an update recorder so delivery
//! behavior can be tested without a running server.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;
use vecscan::transport::{Connectivity, ConnectivityFlag, HttpResponse, NetworkFetcher};
use vecscan::{ApiClient, FetchError, Origin, StoreHandle, VecscanConfig};

/// Mock NetworkFetcher for testing delivery logic
///
/// Answers from a queue of scripted responses first, then with the current
/// body. Every call is counted and its URL recorded. A gated mock holds each
/// request until the [`Gate`] is opened, which keeps a fetch in flight for as
/// long as a test needs.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockFetcher::new(json!([1.0, 2.0]))
///     .then(Ok(HttpResponse::status(503)));
///
/// let client = client_with(mock.clone(), StoreHandle::memory());
/// ```
pub struct MockFetcher {
    script: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
    body: Mutex<Value>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    gate: Option<watch::Receiver<bool>>,
}

/// Releases requests held by a gated [`MockFetcher`]
pub struct Gate(watch::Sender<bool>);

impl Gate {
    /// Lets every held and future request through
    pub fn open(&self) {
        self.0.send_replace(true);
    }
}

impl MockFetcher {
    /// Create a mock that answers every request with `body`
    pub fn new(body: Value) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            body: Mutex::new(body),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Queue a one-off response, served before the default body
    pub fn then(self, response: Result<HttpResponse, FetchError>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Hold every request until the returned gate is opened
    pub fn gated(mut self) -> (Self, Gate) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        (self, Gate(tx))
    }

    /// Replace the default body, as if the server had new data
    pub fn set_body(&self, body: Value) {
        *self.body.lock().unwrap() = body;
    }

    /// Number of requests received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in order
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkFetcher for MockFetcher {
    async fn get(&self, url: &Url, _timeout: Duration) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }

        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return response;
        }
        Ok(HttpResponse::json(&self.body.lock().unwrap()))
    }
}

/// Shared log of deliveries made to an update sink
pub type Deliveries<T> = Arc<Mutex<Vec<(T, Origin)>>>;

/// An update sink that records what it receives
pub fn recorder<T>() -> (Deliveries<T>, impl Fn(&Arc<T>, Origin) + Send + Sync)
where
    T: Clone + Send + Sync,
{
    let seen: Deliveries<T> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |value: &Arc<T>, origin: Origin| {
        sink_seen
            .lock()
            .unwrap()
            .push((value.as_ref().clone(), origin));
    };
    (seen, sink)
}

/// A client over `network` and `store` that is always online
pub fn client_with(network: Arc<MockFetcher>, store: StoreHandle) -> ApiClient {
    client_with_connectivity(network, store, Arc::new(ConnectivityFlag::online()))
}

/// A client over `network` and `store` with the given connectivity probe
pub fn client_with_connectivity(
    network: Arc<MockFetcher>,
    store: StoreHandle,
    connectivity: Arc<dyn Connectivity>,
) -> ApiClient {
    ApiClient::with_parts(VecscanConfig::minimal(), store, network, connectivity)
}

/// Send library logs to the test output when `RUST_LOG` is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
