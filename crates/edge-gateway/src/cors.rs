//! CORS enforcement.
//!
//! Preflight requests (`OPTIONS` with an `Origin` header) are answered at
//! the edge without authentication — browsers send them before they can
//! attach credentials. Disallowed origins still get a 204, just without any
//! CORS headers; the browser enforces the denial.

use crate::config::CorsPolicy;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Response, StatusCode};

/// Whether a request is a CORS preflight.
#[must_use]
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS && headers.contains_key("origin")
}

/// Whether the policy allows an origin: an exact entry or the `"*"`
/// wildcard.
#[must_use]
pub fn origin_allowed(policy: &CorsPolicy, origin: &str) -> bool {
    policy
        .allowed_origins
        .iter()
        .any(|allowed| allowed == "*" || allowed == origin)
}

/// Build the preflight response.
///
/// Always 204. CORS headers are attached only for allowed origins.
#[must_use]
pub fn preflight_response(policy: &CorsPolicy, origin: &str) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    if origin_allowed(policy, origin) {
        let headers = response.headers_mut();
        insert_allow_origin(policy, origin, headers);
        if let Ok(value) = HeaderValue::from_str(&policy.allowed_methods.join(", ")) {
            headers.insert("access-control-allow-methods", value);
        }
        if let Ok(value) = HeaderValue::from_str(&policy.allowed_headers.join(", ")) {
            headers.insert("access-control-allow-headers", value);
        }
    }

    response
}

/// Attach CORS headers to a non-preflight response when the request carried
/// an allowed origin.
pub fn apply_response_headers(
    policy: &CorsPolicy,
    origin: Option<&str>,
    response: &mut Response<Body>,
) {
    let Some(origin) = origin else {
        return;
    };
    if !origin_allowed(policy, origin) {
        return;
    }
    insert_allow_origin(policy, origin, response.headers_mut());
}

/// `Access-Control-Allow-Origin` plus its companions.
///
/// With credentials the origin must be echoed (the wildcard is invalid);
/// without, the wildcard is used when configured.
fn insert_allow_origin(policy: &CorsPolicy, origin: &str, headers: &mut HeaderMap) {
    let allow_origin = if !policy.allow_credentials && policy.allowed_origins.iter().any(|o| o == "*")
    {
        HeaderValue::from_static("*")
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => value,
            Err(_) => return,
        }
    };

    headers.insert("access-control-allow-origin", allow_origin);
    headers.insert("vary", HeaderValue::from_static("Origin"));
    if policy.allow_credentials {
        headers.insert(
            "access-control-allow-credentials",
            HeaderValue::from_static("true"),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn policy(origins: &[&str], credentials: bool) -> CorsPolicy {
        CorsPolicy {
            allowed_origins: origins.iter().map(ToString::to_string).collect(),
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["authorization".to_string(), "content-type".to_string()],
            allow_credentials: credentials,
        }
    }

    #[test]
    fn test_is_preflight() {
        let mut headers = HeaderMap::new();
        assert!(!is_preflight(&Method::OPTIONS, &headers));

        headers.insert("origin", HeaderValue::from_static("https://app.example.com"));
        assert!(is_preflight(&Method::OPTIONS, &headers));
        assert!(!is_preflight(&Method::GET, &headers));
    }

    #[test]
    fn test_origin_matching() {
        let exact = policy(&["https://app.example.com"], false);
        assert!(origin_allowed(&exact, "https://app.example.com"));
        assert!(!origin_allowed(&exact, "https://evil.example.com"));

        let wildcard = policy(&["*"], false);
        assert!(origin_allowed(&wildcard, "https://anything.example.com"));
    }

    #[test]
    fn test_preflight_allowed_origin() {
        let policy = policy(&["https://app.example.com"], false);
        let response = preflight_response(&policy, "https://app.example.com");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-methods")
                .unwrap(),
            "GET, POST"
        );
        assert_eq!(response.headers().get("vary").unwrap(), "Origin");
    }

    #[test]
    fn test_preflight_disallowed_origin_gets_bare_204() {
        let policy = policy(&["https://app.example.com"], false);
        let response = preflight_response(&policy, "https://evil.example.com");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
        assert!(response
            .headers()
            .get("access-control-allow-methods")
            .is_none());
    }

    #[test]
    fn test_wildcard_without_credentials_uses_star() {
        let policy = policy(&["*"], false);
        let response = preflight_response(&policy, "https://app.example.com");
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[test]
    fn test_credentials_echo_origin_and_set_flag() {
        let policy = policy(&["*"], true);
        let response = preflight_response(&policy, "https://app.example.com");

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-credentials")
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn test_apply_response_headers() {
        let policy = policy(&["https://app.example.com"], false);
        let mut response = Response::new(Body::empty());

        apply_response_headers(&policy, Some("https://app.example.com"), &mut response);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );
    }

    #[test]
    fn test_apply_response_headers_skips_disallowed() {
        let policy = policy(&["https://app.example.com"], false);
        let mut response = Response::new(Body::empty());

        apply_response_headers(&policy, Some("https://evil.example.com"), &mut response);
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());

        apply_response_headers(&policy, None, &mut response);
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
