//! Health check handler.
//!
//! Liveness probe: returns 200 as long as the process can serve requests,
//! with the active snapshot's version and counts for operators. Does NOT
//! check upstreams — an unhealthy upstream is a 502 on its own routes, not
//! a dead gateway.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub snapshot_version: u64,
    pub issuers: usize,
    pub routes: usize,
}

/// Handler for GET /v1/health.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.snapshots.current();
    Json(HealthResponse {
        status: "ok",
        snapshot_version: snapshot.version,
        issuers: snapshot.trust.len(),
        routes: snapshot.routes.len(),
    })
}
