//! Metrics definitions for the edge gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gw_` prefix for the gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: 3 values (operational endpoints plus one bucket for
//!   everything proxied)
//! - `reason`: 7 authentication failure categories
//! - `window`: 2 values (minute, hour)
//! - `service`: bounded by the snapshot's configured services
//! - `outcome`: 3 values (success, connect_error, timeout)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gw_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("gw_upstream_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
                30.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `gw_http_requests_total`, `gw_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status_code`
///
/// Applied as the outermost layer, so this captures every response
/// including framework-level errors (404, 405, 408).
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);

    histogram!("gw_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint
    )
    .record(duration.as_secs_f64());

    counter!("gw_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Collapse proxied paths into one label value. Upstream paths are
/// client-controlled and would otherwise explode cardinality.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/v1/health" => "/v1/health",
        "/metrics" => "/metrics",
        _ => "gateway",
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record an authentication failure by category.
///
/// Metric: `gw_auth_failures_total`
/// Labels: `reason`
pub fn record_auth_failure(reason: &'static str) {
    counter!("gw_auth_failures_total", "reason" => reason).increment(1);
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Record a rate-limit rejection.
///
/// Metric: `gw_rate_limit_rejections_total`
/// Labels: `window`
pub fn record_rate_limit_rejection(window: &'static str) {
    counter!("gw_rate_limit_rejections_total", "window" => window).increment(1);
}

/// Record a degraded admission (counter store unavailable, fail-open
/// admitted).
///
/// Metric: `gw_rate_limit_store_degraded_total`
pub fn record_store_degraded() {
    counter!("gw_rate_limit_store_degraded_total").increment(1);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record an upstream forward attempt.
///
/// Metric: `gw_upstream_requests_total`, `gw_upstream_request_duration_seconds`
/// Labels: `service`, `outcome` (success, connect_error, timeout)
pub fn record_upstream_request(service: &str, outcome: &'static str, duration: Duration) {
    histogram!("gw_upstream_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gw_upstream_requests_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// Snapshot Metrics
// ============================================================================

/// Record a snapshot reload attempt.
///
/// Metric: `gw_snapshot_reloads_total`
/// Labels: `outcome` (success, rejected)
pub fn record_snapshot_reload(outcome: &'static str) {
    counter!("gw_snapshot_reloads_total", "outcome" => outcome).increment(1);
}
