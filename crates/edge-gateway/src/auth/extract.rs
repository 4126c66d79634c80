//! Token extraction.
//!
//! Checks the enabled token sources in fixed precedence order — header,
//! then query parameter, then cookie — and stops at the first credential
//! found. A credential that is present but unusable (for example an
//! `Authorization` header without the `Bearer` scheme) is a malformed
//! credential, not a missing one; later sources are not consulted.

use crate::config::{JwtPolicy, TokenSource};
use crate::errors::AuthFailure;
use axum::http::HeaderMap;

/// A credential pulled from the request, with its source for logging.
#[derive(Debug, Clone)]
pub struct ExtractedToken {
    pub value: String,
    pub source: TokenSource,
}

/// Extract a token per the policy's enabled sources.
///
/// # Errors
///
/// - `AuthFailure::Malformed` — an `Authorization` header was present but
///   did not carry a non-empty `Bearer` credential
/// - `AuthFailure::MissingToken` — no enabled source held a credential
pub fn extract_token(
    headers: &HeaderMap,
    query: Option<&str>,
    policy: &JwtPolicy,
) -> Result<ExtractedToken, AuthFailure> {
    if policy.source_enabled(TokenSource::Header) {
        if let Some(value) = headers.get("authorization") {
            let raw = value.to_str().map_err(|_| AuthFailure::Malformed)?;
            let token = parse_bearer(raw).ok_or(AuthFailure::Malformed)?;
            return Ok(ExtractedToken {
                value: token.to_string(),
                source: TokenSource::Header,
            });
        }
    }

    if policy.source_enabled(TokenSource::Query) {
        if let Some(token) = query.and_then(|q| query_param_value(q, &policy.query_param)) {
            if !token.is_empty() {
                return Ok(ExtractedToken {
                    value: token.to_string(),
                    source: TokenSource::Query,
                });
            }
        }
    }

    if policy.source_enabled(TokenSource::Cookie) {
        if let Some(token) = cookie_value(headers, &policy.cookie_name) {
            if !token.is_empty() {
                return Ok(ExtractedToken {
                    value: token.to_string(),
                    source: TokenSource::Cookie,
                });
            }
        }
    }

    Err(AuthFailure::MissingToken)
}

/// Parse `Bearer <token>` with a case-insensitive scheme. Returns `None`
/// for any other scheme or an empty credential.
fn parse_bearer(raw: &str) -> Option<&str> {
    let (scheme, rest) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// First value of `name` in a raw query string. JWTs are URL-safe, so no
/// percent-decoding is needed for the token itself.
fn query_param_value<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == name {
            Some(value)
        } else {
            None
        }
    })
}

/// First value of `name` across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key.trim() == name {
                Some(value.trim())
            } else {
                None
            }
        })
}
