//! HTTP routes for the edge gateway.
//!
//! Defines the Axum router and application state.

use crate::admission::RateLimiter;
use crate::auth::Verifier;
use crate::config::Config;
use crate::handlers;
use crate::proxy::Forwarder;
use crate::snapshot::SnapshotHolder;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::http_metrics_middleware;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration.
    pub config: Config,

    /// Current gateway snapshot, swapped atomically on reload.
    pub snapshots: Arc<SnapshotHolder>,

    /// Token verifier.
    pub verifier: Verifier,

    /// Fixed-window rate limiter.
    pub limiter: RateLimiter,

    /// Upstream HTTP forwarder.
    pub forwarder: Forwarder,
}

/// Build the application routes.
///
/// - `/v1/health` — liveness with snapshot counts, public, unproxied
/// - `/metrics` — Prometheus metrics, public, unproxied
/// - everything else — the gateway pipeline (fallback)
/// - TraceLayer for request logging
/// - request timeout slightly above the upstream timeout so the upstream
///   deadline fires first and maps to 504
/// - HTTP metrics middleware as the outermost layer
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let request_timeout = Duration::from_secs(state.config.upstream_timeout_seconds + 5);

    let ops_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let gateway = Router::new()
        .fallback(handlers::gateway_handler)
        .with_state(state);

    ops_routes
        .merge(metrics_routes)
        .merge(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(http_metrics_middleware))
}
