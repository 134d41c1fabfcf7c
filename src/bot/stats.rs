//! Cache statistics endpoint.
//!
//! `GET /stats` returns every registered cache's counters as JSON,
//! `GET /health` answers `ok`.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::cache::{CacheRegistry, CacheStatsSnapshot};

/// Build the stats router.
pub fn router(registry: CacheRegistry) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(registry)
}

/// Serve the stats router until the task is dropped.
pub async fn serve(addr: SocketAddr, registry: CacheRegistry) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving cache stats on http://{}/stats", addr);
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn stats(State(registry): State<CacheRegistry>) -> Json<BTreeMap<String, CacheStatsSnapshot>> {
    Json(registry.snapshot())
}
