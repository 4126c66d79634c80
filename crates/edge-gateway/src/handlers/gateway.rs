//! The gateway pipeline.
//!
//! Fallback handler for everything that is not an operational endpoint.
//! Each request runs the fixed stage order — CORS preflight short-circuit,
//! token extraction, verification, admission, routing, forwarding — and the
//! first failing stage produces the response. The snapshot `Arc` is cloned
//! once up front, so a concurrent reload never changes policy mid-request.

use crate::auth::{extract_token, AuthContext};
use crate::cors;
use crate::errors::GatewayError;
use crate::observability::metrics::{
    record_auth_failure, record_rate_limit_rejection, record_store_degraded,
    record_upstream_request,
};
use crate::proxy::ForwardContext;
use crate::routes::AppState;
use crate::snapshot::GatewaySnapshot;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Cap on buffered request and response bodies.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Fallback handler: the proxy pipeline.
pub async fn gateway_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let snapshot = state.snapshots.current();

    let origin = request
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    // Preflight to a routed path is answered at the edge, before
    // authentication — browsers cannot attach credentials to it. An OPTIONS
    // to an unrouted path goes through the normal pipeline.
    if let Some(cors_policy) = &snapshot.cors {
        if cors::is_preflight(request.method(), request.headers())
            && snapshot.routes.matches(request.uri().path()).is_some()
        {
            if let Some(origin) = &origin {
                return cors::preflight_response(cors_policy, origin);
            }
        }
    }

    let mut response = match run_pipeline(&state, &snapshot, request).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    };

    if let Some(cors_policy) = &snapshot.cors {
        cors::apply_response_headers(cors_policy, origin.as_deref(), &mut response);
    }

    response
}

async fn run_pipeline(
    state: &AppState,
    snapshot: &GatewaySnapshot,
    request: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(ToString::to_string);
    let client_ip = client_ip(&parts);

    // Authentication.
    let token =
        extract_token(&parts.headers, query.as_deref(), &snapshot.jwt).map_err(|failure| {
            record_auth_failure(failure.as_str());
            GatewayError::Unauthorized(failure)
        })?;

    let auth = state
        .verifier
        .verify(&token, &snapshot.trust, &snapshot.jwt)
        .map_err(|failure| {
            record_auth_failure(failure.as_str());
            GatewayError::Unauthorized(failure)
        })?;

    // Admission.
    if let Some(policy) = &snapshot.rate_limit {
        let admission = state
            .limiter
            .check(auth.rate_limit_identity(), policy)
            .await
            .map_err(|error| {
                if let GatewayError::RateLimited { window, .. } = &error {
                    record_rate_limit_rejection(window.as_str());
                }
                error
            })?;
        if admission.degraded {
            record_store_degraded();
        }
    }

    // Routing.
    let route_match = snapshot.routes.matches(&path).ok_or(GatewayError::NoRoute)?;

    // Buffer the request body; oversized bodies are rejected before any
    // upstream connection is made.
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge)?;

    let ctx = forward_context(&auth, client_ip);
    let service = route_match.route.service.clone();
    let start = Instant::now();

    let result = state
        .forwarder
        .forward(
            &route_match,
            method,
            &parts.headers,
            query.as_deref(),
            body_bytes,
            &ctx,
        )
        .await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(GatewayError::UpstreamTimeout(_)) => "timeout",
        Err(_) => "connect_error",
    };
    record_upstream_request(&service, outcome, start.elapsed());

    result
}

fn forward_context(auth: &AuthContext, client_ip: String) -> ForwardContext {
    ForwardContext {
        request_id: uuid::Uuid::new_v4().to_string(),
        client_ip,
        scheme: "http",
        subject: auth.subject.clone(),
        issuer: Some(auth.issuer.clone()),
    }
}

/// Client address from the connection, falling back to the first
/// `X-Forwarded-For` entry when the gateway itself sits behind a load
/// balancer.
fn client_ip(parts: &axum::http::request::Parts) -> String {
    if let Some(connect_info) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
