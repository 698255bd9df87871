// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

/// Example showing how a dashboard keeps a market cap chart current
///
/// This example shows how to:
/// 1. Build a client from `VECSCAN_*` environment variables
/// 2. Watch one range of a metric vector for updates
/// 3. Fetch it from several widgets at once without duplicate requests
/// 4. Refetch within and after the freshness window
///
/// Run with:
/// ```bash
/// VECSCAN_BASE_URL=https://bitview.space \
/// VECSCAN_CACHE_DIR=/tmp/vecscan \
/// RUST_LOG=vecscan=debug \
/// cargo run --example market_cap_dashboard
/// ```
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vecscan::{ApiClient, Origin, RangeQuery, VecId, VecscanConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = VecscanConfig::from_env().context("Invalid VECSCAN_* configuration")?;
    let client = ApiClient::new(config)
        .await
        .context("Failed to build client")?;

    let on_height = |height: &Arc<u64>, origin: Origin| {
        info!(height = **height, ?origin, "Last height");
    };
    client
        .get::<u64>("/api/last-height", Some(&on_height))
        .await
        .context("Failed to fetch last height")?;

    let registry = client.registry::<Vec<f64>>();
    let market_cap = registry.get_or_create(VecId::new("height", "market_cap"));
    let range = RangeQuery::default();

    let mut updates = market_cap.subscribe(range);
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            info!(
                loading = snapshot.loading,
                points = snapshot.value.as_ref().map(|v| v.len()),
                origin = ?snapshot.origin,
                "Market cap chart state"
            );
        }
    });

    // Three widgets asking at once share one request
    let widgets = (0..3).map(|_| market_cap.fetch(range));
    for result in futures::future::join_all(widgets).await {
        result.context("Market cap fetch failed")?;
    }

    let points = market_cap.settled(range).await;
    info!(
        points = points.as_ref().map(|v| v.len()),
        latest = points.as_ref().and_then(|v| v.last().copied()),
        "Market cap settled"
    );

    // Within the freshness window this never touches the network
    market_cap.fetch(range).await?;

    client.flush().await;
    watcher.abort();
    Ok(())
}
