//! Route matching and upstream forwarding.
//!
//! Routes are compiled once per snapshot into a table ordered by descending
//! prefix length, so matching is a linear scan that stops at the first hit —
//! the longest matching prefix wins, and declaration order breaks ties
//! between equal-length prefixes.
//!
//! Prefixes match on segment boundaries: `/api/v1/employees` matches
//! `/api/v1/employees` and `/api/v1/employees/42` but never
//! `/api/v1/employees-archive`.

use crate::config::{ConfigError, RouteConfig, ServiceConfig};
use crate::errors::GatewayError;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Response};
use reqwest::Url;
use std::collections::HashMap;
use std::time::Duration;

/// One compiled route entry: a single path prefix bound to an upstream.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Route name, for logs and metrics.
    pub name: String,

    /// Normalized path prefix (no trailing slash except for `/`).
    pub prefix: String,

    /// Upstream service name.
    pub service: String,

    /// Parsed upstream base URL.
    pub upstream: Url,

    /// Strip the matched prefix before forwarding.
    pub strip_path: bool,
}

/// Result of matching a request path against the table.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a CompiledRoute,

    /// Path to send upstream (prefix stripped when the route says so).
    pub forward_path: String,
}

/// Compiled route table, ordered longest-prefix-first.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile services and routes into a match table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable upstream URLs. Reference and
    /// shape errors are caught earlier by snapshot validation.
    pub fn compile(
        services: &[ServiceConfig],
        routes: &[RouteConfig],
    ) -> Result<Self, ConfigError> {
        let mut upstreams: HashMap<&str, Url> = HashMap::with_capacity(services.len());
        for service in services {
            let url = Url::parse(&service.url).map_err(|e| ConfigError::InvalidUpstreamUrl {
                service: service.name.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUpstreamUrl {
                    service: service.name.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            upstreams.insert(service.name.as_str(), url);
        }

        let mut entries = Vec::new();
        for route in routes {
            let upstream = upstreams.get(route.service.as_str()).ok_or_else(|| {
                ConfigError::UnknownServiceRef {
                    route: route.name.clone(),
                    service: route.service.clone(),
                }
            })?;

            for path in &route.paths {
                entries.push(CompiledRoute {
                    name: route.name.clone(),
                    prefix: normalize_prefix(path),
                    service: route.service.clone(),
                    upstream: upstream.clone(),
                    strip_path: route.strip_path,
                });
            }
        }

        // Stable sort keeps declaration order within equal prefix lengths,
        // which is the documented tie-break.
        entries.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Ok(RouteTable { entries })
    }

    /// Match a request path. Returns the longest matching prefix entry.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<RouteMatch<'_>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| prefix_matches(&entry.prefix, path))?;

        let forward_path = if entry.strip_path {
            strip_prefix(&entry.prefix, path)
        } else {
            path.to_string()
        };

        Some(RouteMatch {
            route: entry,
            forward_path,
        })
    }

    /// Number of compiled entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_prefix(path: &str) -> String {
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}

/// Segment-boundary prefix test.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn strip_prefix(prefix: &str, path: &str) -> String {
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    }
}

// =============================================================================
// Forwarding
// =============================================================================

/// Hop-by-hop headers that never cross the proxy boundary, plus headers the
/// client owns (`host`, `content-length` are recomputed by the HTTP client).
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Identity headers injected toward upstream after verification. Any
/// client-supplied copies are dropped first so upstreams can trust them.
pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_AUTHENTICATED_SUBJECT: &str = "x-authenticated-subject";
pub const HEADER_AUTHENTICATED_ISSUER: &str = "x-authenticated-issuer";

/// Per-request context carried into the upstream request headers.
#[derive(Debug, Clone)]
pub struct ForwardContext {
    pub request_id: String,
    pub client_ip: String,
    pub scheme: &'static str,
    pub subject: Option<String>,
    pub issuer: Option<String>,
}

/// Upstream HTTP forwarder. One shared client with connection pooling and a
/// per-request timeout.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build a forwarder with the given upstream timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying client build error; fatal at startup.
    pub fn new(upstream_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(upstream_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Forwarder { client })
    }

    /// Forward a buffered request to the matched upstream and buffer the
    /// response back.
    ///
    /// # Errors
    ///
    /// - `GatewayError::UpstreamTimeout` when the upstream misses the deadline
    /// - `GatewayError::UpstreamConnect` for connection and transfer failures
    pub async fn forward(
        &self,
        route_match: &RouteMatch<'_>,
        method: Method,
        headers: &HeaderMap,
        query: Option<&str>,
        body: Bytes,
        ctx: &ForwardContext,
    ) -> Result<Response<Body>, GatewayError> {
        let url = target_url(route_match, query)?;
        let upstream_headers = build_upstream_headers(headers, ctx);

        tracing::debug!(
            target: "gw.proxy",
            request_id = %ctx.request_id,
            route = %route_match.route.name,
            service = %route_match.route.service,
            path = %route_match.forward_path,
            "Forwarding request upstream"
        );

        let upstream_response = self
            .client
            .request(method, url)
            .headers(upstream_headers)
            .body(body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        for name in STRIPPED_RESPONSE_HEADERS {
            response_headers.remove(*name);
        }

        let response_body = upstream_response
            .bytes()
            .await
            .map_err(|e| GatewayError::UpstreamConnect(e.to_string()))?;

        let mut response = Response::new(Body::from(response_body));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
        }
        Ok(response)
    }
}

fn classify_send_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::UpstreamTimeout(error.to_string())
    } else {
        GatewayError::UpstreamConnect(error.to_string())
    }
}

fn target_url(route_match: &RouteMatch<'_>, query: Option<&str>) -> Result<Url, GatewayError> {
    let mut url = route_match.route.upstream.clone();
    let base = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base}{}", route_match.forward_path));
    url.set_query(query);
    Ok(url)
}

/// Copy request headers upstream, dropping hop-by-hop headers and any
/// client-supplied identity headers, then inject the gateway's own.
fn build_upstream_headers(headers: &HeaderMap, ctx: &ForwardContext) -> HeaderMap {
    let mut out = headers.clone();
    for name in STRIPPED_REQUEST_HEADERS {
        out.remove(*name);
    }
    out.remove(HEADER_REQUEST_ID);
    out.remove(HEADER_AUTHENTICATED_SUBJECT);
    out.remove(HEADER_AUTHENTICATED_ISSUER);

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        out.insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
    }

    // Append to an existing X-Forwarded-For chain rather than replacing it.
    let forwarded_for = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {}", ctx.client_ip),
        None => ctx.client_ip.clone(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        out.insert(HeaderName::from_static("x-forwarded-for"), value);
    }
    out.insert(
        HeaderName::from_static("x-forwarded-proto"),
        HeaderValue::from_static(ctx.scheme),
    );

    if let Some(subject) = &ctx.subject {
        if let Ok(value) = HeaderValue::from_str(subject) {
            out.insert(
                HeaderName::from_static(HEADER_AUTHENTICATED_SUBJECT),
                value,
            );
        }
    }
    if let Some(issuer) = &ctx.issuer {
        if let Ok(value) = HeaderValue::from_str(issuer) {
            out.insert(HeaderName::from_static(HEADER_AUTHENTICATED_ISSUER), value);
        }
    }

    out
}
