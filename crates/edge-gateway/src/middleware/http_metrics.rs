//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so it captures metrics for ALL responses,
//! including framework-level errors that occur before handlers run (404,
//! 405, 408 from the timeout layer).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Records method, normalized endpoint, status code, and duration for every
/// response.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status_code = response.status().as_u16();
    record_http_request(&method, &path, status_code, duration);

    response
}
