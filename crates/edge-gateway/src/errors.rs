//! Gateway error types.
//!
//! All request-path errors map to HTTP status codes via the `IntoResponse`
//! impl. Authentication failures are categorized for server-side logging but
//! surfaced to clients as one uniform 401 — clients never learn which check
//! failed.

use crate::admission::RateWindow;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Categorized authentication failure. Logged server-side only; every
/// variant maps to the same generic 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No credential was found in any enabled token source.
    MissingToken,
    /// Credential found but not structurally a JWT.
    Malformed,
    /// Key-selector claim matched no trust record.
    UnknownIssuer,
    /// Signature verification against the trust record failed.
    BadSignature,
    /// `exp` in the past beyond skew tolerance.
    Expired,
    /// `nbf` in the future beyond skew tolerance.
    NotYetValid,
    /// `exp - iat` exceeds the issuer's maximum lifetime.
    LifetimeExceeded,
}

impl AuthFailure {
    /// Label for logs and metrics. Bounded cardinality.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::Malformed => "malformed",
            AuthFailure::UnknownIssuer => "unknown_issuer",
            AuthFailure::BadSignature => "bad_signature",
            AuthFailure::Expired => "expired",
            AuthFailure::NotYetValid => "not_yet_valid",
            AuthFailure::LifetimeExceeded => "lifetime_exceeded",
        }
    }
}

/// Gateway error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 (uniform body, reason logged only)
/// - RateLimited: 429 with Retry-After
/// - NoRoute: 404
/// - UpstreamConnect: 502
/// - UpstreamTimeout: 504
/// - PayloadTooLarge: 413
/// - Internal: 500
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized: {}", .0.as_str())]
    Unauthorized(AuthFailure),

    #[error("Rate limit exceeded for {window} window")]
    RateLimited {
        window: RateWindow,
        retry_after_secs: i64,
    },

    #[error("No route matched the request path")]
    NoRoute,

    #[error("Upstream connection failed: {0}")]
    UpstreamConnect(String),

    #[error("Upstream request timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Request payload too large")]
    PayloadTooLarge,

    #[error("Internal gateway error")]
    Internal,
}

impl GatewayError {
    /// Returns the HTTP status code for this error (for metrics recording).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Unauthorized(_) => 401,
            GatewayError::RateLimited { .. } => 429,
            GatewayError::NoRoute => 404,
            GatewayError::UpstreamConnect(_) => 502,
            GatewayError::UpstreamTimeout(_) => 504,
            GatewayError::PayloadTooLarge => 413,
            GatewayError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::Unauthorized(failure) => {
                // Log the category server-side; the client body stays generic
                // so the gateway is not an oracle for which check failed.
                tracing::warn!(
                    target: "gw.auth",
                    reason = failure.as_str(),
                    "Request rejected: authentication failed"
                );
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "The request is not authorized".to_string(),
                )
            }
            GatewayError::RateLimited { window, .. } => {
                tracing::info!(
                    target: "gw.admission",
                    window = window.as_str(),
                    "Request rejected: rate limit exceeded"
                );
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "Too many requests. Please try again later.".to_string(),
                )
            }
            GatewayError::NoRoute => (
                StatusCode::NOT_FOUND,
                "NO_ROUTE",
                "No route matched the request path".to_string(),
            ),
            GatewayError::UpstreamConnect(reason) => {
                tracing::error!(target: "gw.proxy", reason = %reason, "Upstream connection failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "Upstream service unavailable".to_string(),
                )
            }
            GatewayError::UpstreamTimeout(reason) => {
                tracing::error!(target: "gw.proxy", reason = %reason, "Upstream request timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "UPSTREAM_TIMEOUT",
                    "Upstream service timed out".to_string(),
                )
            }
            GatewayError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request payload too large".to_string(),
            ),
            GatewayError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let retry_after = match &self {
            GatewayError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"edge-gateway\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        // Add Retry-After hint for 429 responses
        if let Some(secs) = retry_after {
            if let Ok(header_value) = secs.to_string().parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::Unauthorized(AuthFailure::Expired).status_code(),
            401
        );
        assert_eq!(
            GatewayError::RateLimited {
                window: RateWindow::Minute,
                retry_after_secs: 30
            }
            .status_code(),
            429
        );
        assert_eq!(GatewayError::NoRoute.status_code(), 404);
        assert_eq!(
            GatewayError::UpstreamConnect("refused".to_string()).status_code(),
            502
        );
        assert_eq!(
            GatewayError::UpstreamTimeout("deadline".to_string()).status_code(),
            504
        );
        assert_eq!(GatewayError::PayloadTooLarge.status_code(), 413);
        assert_eq!(GatewayError::Internal.status_code(), 500);
    }

    #[test]
    fn test_auth_failure_labels_are_stable() {
        assert_eq!(AuthFailure::MissingToken.as_str(), "missing_token");
        assert_eq!(AuthFailure::Malformed.as_str(), "malformed");
        assert_eq!(AuthFailure::UnknownIssuer.as_str(), "unknown_issuer");
        assert_eq!(AuthFailure::BadSignature.as_str(), "bad_signature");
        assert_eq!(AuthFailure::Expired.as_str(), "expired");
        assert_eq!(AuthFailure::NotYetValid.as_str(), "not_yet_valid");
        assert_eq!(AuthFailure::LifetimeExceeded.as_str(), "lifetime_exceeded");
    }

    #[tokio::test]
    async fn test_all_auth_failures_share_one_response() {
        // Every category must produce an identical client-visible response
        // so the gateway is not an oracle for which check failed.
        let failures = [
            AuthFailure::MissingToken,
            AuthFailure::Malformed,
            AuthFailure::UnknownIssuer,
            AuthFailure::BadSignature,
            AuthFailure::Expired,
            AuthFailure::NotYetValid,
            AuthFailure::LifetimeExceeded,
        ];

        let mut bodies = Vec::new();
        for failure in failures {
            let response = GatewayError::Unauthorized(failure).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().get("WWW-Authenticate").is_some());
            bodies.push(read_body_json(response.into_body()).await);
        }

        for body in &bodies {
            assert_eq!(body, bodies.first().unwrap());
        }
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let error = GatewayError::RateLimited {
            window: RateWindow::Minute,
            retry_after_secs: 42,
        };
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("Retry-After").unwrap().to_str().unwrap(),
            "42"
        );

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_no_route_response() {
        let response = GatewayError::NoRoute.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "NO_ROUTE");
    }

    #[tokio::test]
    async fn test_upstream_errors_hide_details() {
        let response =
            GatewayError::UpstreamConnect("connection refused 10.0.0.5:8000".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["message"], "Upstream service unavailable");
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
