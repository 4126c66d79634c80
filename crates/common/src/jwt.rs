//! JWT structural utilities shared across the gateway.
//!
//! This module provides the untrusted half of token verification:
//! - Size limits for DoS prevention
//! - Structural parsing into header / payload / signature segments
//! - Claim peeking WITHOUT signature verification (key selection only)
//! - Temporal claim checks with clock-skew tolerance
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned by [`parse_unverified`] is authenticated; peeked
//!   claims may only be used to select a verification key and MUST be
//!   discarded if signature verification later fails
//! - Error messages are intentionally generic to prevent information leakage

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// This limit prevents denial-of-service via oversized tokens. Typical JWTs
/// are 200-800 bytes; 8KB allows for bloated identity-provider claim sets
/// while rejecting abuse before any base64 or JSON work happens.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default clock skew tolerance for temporal claim checks (60 seconds).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Prevents misconfiguration that would weaken `exp`/`nbf` enforcement by
/// allowing an excessively large tolerance.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors from structural token parsing.
///
/// Messages are generic; the variant is for server-side categorization only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtParseError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token is not three base64url segments with JSON header and payload.
    #[error("The access token is invalid")]
    MalformedToken,
}

/// Errors from temporal claim checks.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalCheckError {
    /// `exp` is in the past, beyond skew tolerance.
    #[error("The access token is invalid or expired")]
    Expired,

    /// `nbf` is in the future, beyond skew tolerance.
    #[error("The access token is invalid or expired")]
    NotYetValid,
}

// =============================================================================
// Structural parsing
// =============================================================================

/// A structurally parsed, UNVERIFIED token.
///
/// Holds the decoded header and payload JSON. None of it is trusted until a
/// signature verification bound to a trust record succeeds.
#[derive(Clone)]
pub struct RawToken {
    header: serde_json::Value,
    payload: serde_json::Value,
}

impl RawToken {
    /// The decoded (unverified) header JSON.
    #[must_use]
    pub fn header(&self) -> &serde_json::Value {
        &self.header
    }

    /// The decoded (unverified) payload JSON.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Peek a string claim from the unverified payload.
    ///
    /// Returns `None` for missing, non-string, or empty values. Empty values
    /// are rejected so a vacuous claim can never select a trust record.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.payload
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

// Deliberately omits header/payload contents: unverified attacker-controlled
// JSON must not end up in logs via Debug formatting.
impl std::fmt::Debug for RawToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawToken")
            .field("header", &"[UNVERIFIED]")
            .field("payload", &"[UNVERIFIED]")
            .finish()
    }
}

/// Structurally parse a candidate token WITHOUT verifying anything.
///
/// Checks, in order:
/// 1. Size limit ([`MAX_JWT_SIZE_BYTES`]) before any decoding
/// 2. Exactly three non-empty dot-separated segments
/// 3. Header and payload decode as base64url and parse as JSON objects
/// 4. Signature segment decodes as base64url
///
/// This is a pure function with no side effects and no trust implications;
/// the result is only suitable for selecting a verification key.
///
/// # Errors
///
/// - `TokenTooLarge` — token exceeds the size limit
/// - `MalformedToken` — wrong segment count, bad base64, or non-JSON content
pub fn parse_unverified(token: &str) -> Result<RawToken, JwtParseError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtParseError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                (h, p, s)
            }
            _ => {
                tracing::debug!(target: "common.jwt", "Token rejected: invalid segment structure");
                return Err(JwtParseError::MalformedToken);
            }
        };

    let header = decode_json_segment(header_b64)?;
    let payload = decode_json_segment(payload_b64)?;

    // The signature is verified cryptographically later; here we only require
    // that it is well-formed base64url.
    URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token rejected: signature segment not base64url");
        JwtParseError::MalformedToken
    })?;

    if !header.is_object() || !payload.is_object() {
        tracing::debug!(target: "common.jwt", "Token rejected: header or payload is not a JSON object");
        return Err(JwtParseError::MalformedToken);
    }

    Ok(RawToken { header, payload })
}

fn decode_json_segment(segment: &str) -> Result<serde_json::Value, JwtParseError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token rejected: segment not base64url");
        JwtParseError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token rejected: segment not valid JSON");
        JwtParseError::MalformedToken
    })
}

// =============================================================================
// Temporal claim checks
// =============================================================================

/// Validate the `exp` (expiration) claim with clock-skew tolerance, against
/// an explicit `now` timestamp. Callers pass epoch seconds (typically
/// `chrono::Utc::now().timestamp()`); the explicit instant keeps boundary
/// conditions unit-testable without wall-clock dependence.
///
/// # Errors
///
/// Returns `TemporalCheckError::Expired` if `exp` is more than `clock_skew`
/// in the past.
pub fn validate_exp_at(exp: i64, clock_skew: Duration, now: i64) -> Result<(), TemporalCheckError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let skew_secs = clock_skew.as_secs() as i64;

    if exp < now - skew_secs {
        tracing::debug!(
            target: "common.jwt",
            exp = exp,
            now = now,
            skew_secs = skew_secs,
            "Token rejected: expired beyond skew tolerance"
        );
        return Err(TemporalCheckError::Expired);
    }

    Ok(())
}

/// Validate the `nbf` (not-before) claim with clock-skew tolerance, against
/// an explicit `now` timestamp.
///
/// # Errors
///
/// Returns `TemporalCheckError::NotYetValid` if `nbf` is more than
/// `clock_skew` in the future.
pub fn validate_nbf_at(nbf: i64, clock_skew: Duration, now: i64) -> Result<(), TemporalCheckError> {
    #[allow(clippy::cast_possible_wrap)]
    let skew_secs = clock_skew.as_secs() as i64;

    if nbf > now + skew_secs {
        tracing::debug!(
            target: "common.jwt",
            nbf = nbf,
            now = now,
            skew_secs = skew_secs,
            "Token rejected: not yet valid beyond skew tolerance"
        );
        return Err(TemporalCheckError::NotYetValid);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
