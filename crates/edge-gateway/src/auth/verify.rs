//! Token verification.
//!
//! Verification order is fixed and cheap-first:
//!
//! 1. structural parse (no crypto)
//! 2. trust record lookup via the key-selector claim
//! 3. signature check with the record's pinned algorithm
//! 4. temporal claims (`exp`, `nbf`) with bounded clock skew
//! 5. lifetime ceiling (`exp - iat`)
//!
//! The algorithm always comes from the trust record. A token whose header
//! names a different algorithm fails signature verification — the header is
//! attacker-controlled and never drives key interpretation.

use crate::auth::claims::{AuthContext, Claims};
use crate::auth::extract::ExtractedToken;
use crate::config::{JwtPolicy, VerifiableClaim};
use crate::errors::AuthFailure;
use crate::trust::{TrustRecord, TrustStore};
use common::jwt::{parse_unverified, validate_exp_at, validate_nbf_at};
use jsonwebtoken::Validation;
use std::time::Duration;

/// Stateless token verifier. Policy and trust records come from the request's
/// snapshot so a reload never changes a request mid-flight.
#[derive(Debug, Clone)]
pub struct Verifier {
    clock_skew: Duration,
}

impl Verifier {
    #[must_use]
    pub fn new(clock_skew: Duration) -> Self {
        Verifier { clock_skew }
    }

    /// Verify a token against the trust store and policy, using the current
    /// time.
    ///
    /// # Errors
    ///
    /// Returns the categorized `AuthFailure`; callers map every category to
    /// the same 401 response.
    pub fn verify(
        &self,
        token: &ExtractedToken,
        trust: &TrustStore,
        policy: &JwtPolicy,
    ) -> Result<AuthContext, AuthFailure> {
        self.verify_at(token, trust, policy, chrono::Utc::now().timestamp())
    }

    /// Verify with an explicit `now` for deterministic tests.
    ///
    /// # Errors
    ///
    /// See [`Verifier::verify`].
    pub fn verify_at(
        &self,
        token: &ExtractedToken,
        trust: &TrustStore,
        policy: &JwtPolicy,
        now: i64,
    ) -> Result<AuthContext, AuthFailure> {
        // Structural checks first; nothing here is trusted yet.
        let raw = parse_unverified(&token.value).map_err(|_| AuthFailure::Malformed)?;

        let selector = raw
            .claim_str(&policy.key_selector_claim)
            .ok_or(AuthFailure::UnknownIssuer)?;
        let record = trust.lookup(selector).ok_or(AuthFailure::UnknownIssuer)?;

        let claims = decode_and_check_signature(&token.value, record)?;

        // A token that expires before it becomes valid is internally
        // inconsistent, whatever the clock says.
        if let (Some(exp), Some(nbf)) = (claims.exp, claims.nbf) {
            if nbf >= exp {
                return Err(AuthFailure::Malformed);
            }
        }

        if policy.verifies(VerifiableClaim::Exp) {
            let exp = claims.exp.ok_or(AuthFailure::Expired)?;
            validate_exp_at(exp, self.clock_skew, now).map_err(|_| AuthFailure::Expired)?;
        }

        if policy.verifies(VerifiableClaim::Nbf) {
            if let Some(nbf) = claims.nbf {
                validate_nbf_at(nbf, self.clock_skew, now)
                    .map_err(|_| AuthFailure::NotYetValid)?;
            }
        }

        if let (Some(exp), Some(iat)) = (claims.exp, claims.iat) {
            // Both values are attacker-supplied; a span that overflows i64
            // exceeds any ceiling.
            let span = exp.checked_sub(iat);
            if span.map_or(true, |span| span > record.max_lifetime_seconds) {
                return Err(AuthFailure::LifetimeExceeded);
            }
        }

        tracing::debug!(
            target: "gw.auth",
            issuer = %record.issuer,
            source = token.source.as_str(),
            "Token verified"
        );

        Ok(AuthContext {
            issuer: record.issuer.clone(),
            subject: claims.sub,
            source: token.source,
        })
    }
}

/// Signature verification with the trust record's algorithm. Temporal and
/// audience checks are disabled here; the policy layer above owns them.
fn decode_and_check_signature(
    token: &str,
    record: &TrustRecord,
) -> Result<Claims, AuthFailure> {
    let mut validation = Validation::new(record.algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims::<&str>(&[]);

    // Any decode failure, including an algorithm mismatch between the token
    // header and the pinned record, is a bad signature.
    jsonwebtoken::decode::<Claims>(token, &record.decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthFailure::BadSignature)
}
