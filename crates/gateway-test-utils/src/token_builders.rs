//! Fluent builder for test JWTs.

use crate::crypto_fixtures::TestKeypair;
use chrono::Utc;
use serde_json::{Map, Value};

/// Builds claim sets for test tokens.
///
/// Defaults to a token issued now, valid for five minutes, from issuer
/// `svc-idp` with subject `user-1`. Every claim can be overridden or
/// removed.
///
/// ```rust
/// use gateway_test_utils::crypto_fixtures::TestKeypair;
/// use gateway_test_utils::token_builders::TestTokenBuilder;
///
/// let keypair = TestKeypair::rs256_primary();
/// let token = TestTokenBuilder::new().issuer("svc-idp").sign(&keypair);
/// assert_eq!(token.split('.').count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let mut claims = Map::new();
        claims.insert("iss".to_string(), Value::from("svc-idp"));
        claims.insert("sub".to_string(), Value::from("user-1"));
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(now + 300));
        TestTokenBuilder { claims }
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.claims.insert("iss".to_string(), Value::from(issuer));
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.claims.insert("sub".to_string(), Value::from(subject));
        self
    }

    pub fn issued_at(mut self, iat: i64) -> Self {
        self.claims.insert("iat".to_string(), Value::from(iat));
        self
    }

    pub fn expires_at(mut self, exp: i64) -> Self {
        self.claims.insert("exp".to_string(), Value::from(exp));
        self
    }

    pub fn not_before(mut self, nbf: i64) -> Self {
        self.claims.insert("nbf".to_string(), Value::from(nbf));
        self
    }

    /// Shift `exp` relative to now. Negative offsets produce expired tokens.
    pub fn expires_in_secs(self, secs: i64) -> Self {
        let exp = Utc::now().timestamp() + secs;
        self.expires_at(exp)
    }

    /// Set an arbitrary claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim entirely (e.g. drop `exp` to test required-claim
    /// enforcement).
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// The claim set as a JSON value.
    pub fn claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign the claims with the given keypair.
    pub fn sign(&self, keypair: &TestKeypair) -> String {
        keypair.sign(&self.claims)
    }

    /// Sign with HS256 using arbitrary secret bytes.
    pub fn sign_hs256(&self, secret: &[u8]) -> String {
        crate::crypto_fixtures::sign_hs256_with_secret(&self.claims, secret)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_standard_claims() {
        let claims = TestTokenBuilder::new().claims();
        assert_eq!(claims["iss"], "svc-idp");
        assert_eq!(claims["sub"], "user-1");
        assert!(claims["exp"].as_i64().unwrap() > claims["iat"].as_i64().unwrap());
    }

    #[test]
    fn test_without_claim_removes_it() {
        let claims = TestTokenBuilder::new().without_claim("exp").claims();
        assert!(claims.get("exp").is_none());
    }

    #[test]
    fn test_custom_claim() {
        let claims = TestTokenBuilder::new()
            .claim("department", Value::from("engineering"))
            .claims();
        assert_eq!(claims["department"], "engineering");
    }
}
