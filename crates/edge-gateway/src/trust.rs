//! Issuer trust store.
//!
//! Maps issuer identities to verification key material and per-issuer policy.
//! Built once from the declarative configuration into an immutable value;
//! reload replaces the whole store as part of the snapshot swap. There is no
//! partial-mutation API.
//!
//! # Security
//!
//! The algorithm is bound to the trust record at build time. Verification
//! always uses the record's algorithm, never the one named inside a token
//! header — this closes algorithm-confusion attacks.

use crate::config::{ConfigError, TrustRecordConfig};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::collections::HashMap;
use std::fmt;

/// A single issuer's trust record.
#[derive(Clone)]
pub struct TrustRecord {
    /// Issuer identity (e.g. a realm URL).
    pub issuer: String,

    /// Algorithm bound to this issuer.
    pub algorithm: Algorithm,

    /// Pre-parsed verification key.
    pub decoding_key: DecodingKey,

    /// Maximum allowed `exp - iat` for tokens from this issuer.
    pub max_lifetime_seconds: i64,
}

impl fmt::Debug for TrustRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustRecord")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("decoding_key", &"[KEY MATERIAL]")
            .field("max_lifetime_seconds", &self.max_lifetime_seconds)
            .finish()
    }
}

/// Immutable issuer → trust record mapping.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    records: HashMap<String, TrustRecord>,
}

impl TrustStore {
    /// Build the store from configuration records.
    ///
    /// `default_max_lifetime` applies to records without a per-issuer
    /// override.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateIssuer` — issuer identities must be globally
    ///   unique
    /// - `ConfigError::InvalidKeyMaterial` — key material that cannot be
    ///   parsed for the record's algorithm is fatal at load time, not at
    ///   request time
    pub fn from_records(
        records: &[TrustRecordConfig],
        default_max_lifetime: i64,
    ) -> Result<Self, ConfigError> {
        let mut map = HashMap::with_capacity(records.len());

        for record in records {
            let decoding_key = build_decoding_key(record.algorithm, &record.public_key)
                .map_err(|reason| ConfigError::InvalidKeyMaterial {
                    issuer: record.issuer.clone(),
                    reason,
                })?;

            let max_lifetime_seconds = match record.max_lifetime_seconds {
                Some(value) if value > 0 => value,
                Some(value) => {
                    return Err(ConfigError::InvalidKeyMaterial {
                        issuer: record.issuer.clone(),
                        reason: format!("max_lifetime_seconds must be positive, got {value}"),
                    })
                }
                None => default_max_lifetime,
            };

            let previous = map.insert(
                record.issuer.clone(),
                TrustRecord {
                    issuer: record.issuer.clone(),
                    algorithm: record.algorithm,
                    decoding_key,
                    max_lifetime_seconds,
                },
            );

            if previous.is_some() {
                return Err(ConfigError::DuplicateIssuer(record.issuer.clone()));
            }
        }

        Ok(TrustStore { records: map })
    }

    /// Look up the trust record for an issuer identity.
    ///
    /// `None` means the issuer is unknown; callers categorize that as an
    /// `UnknownIssuer` authentication failure.
    #[must_use]
    pub fn lookup(&self, issuer: &str) -> Option<&TrustRecord> {
        self.records.get(issuer)
    }

    /// Number of configured issuers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any issuers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse key material for the given algorithm.
///
/// PEM for asymmetric algorithms; the raw shared secret for HMAC.
fn build_decoding_key(algorithm: Algorithm, material: &str) -> Result<DecodingKey, String> {
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(material.as_bytes())
            .map_err(|e| format!("invalid RSA public key PEM: {e}")),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(material.as_bytes())
            .map_err(|e| format!("invalid EC public key PEM: {e}")),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(material.as_bytes())
            .map_err(|e| format!("invalid Ed25519 public key PEM: {e}")),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            if material.is_empty() {
                Err("shared secret must not be empty".to_string())
            } else {
                Ok(DecodingKey::from_secret(material.as_bytes()))
            }
        }
    }
}
