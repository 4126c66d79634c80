//! Verified claim types.

use crate::config::TokenSource;
use serde::Deserialize;
use std::fmt;

/// Registered claims the gateway inspects. Everything is optional at the
/// type level; the verification policy decides which ones are required.
#[derive(Clone, Deserialize)]
pub struct Claims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub nbf: Option<i64>,
    pub iat: Option<i64>,
}

/// Debug output keeps the subject out of logs.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Identity established by a successfully verified token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Issuer the token verified against.
    pub issuer: String,

    /// Subject claim, when present.
    pub subject: Option<String>,

    /// Where the credential was found.
    pub source: TokenSource,
}

impl AuthContext {
    /// Identity key for rate limiting: the subject when present, otherwise
    /// the issuer.
    #[must_use]
    pub fn rate_limit_identity(&self) -> &str {
        self.subject.as_deref().unwrap_or(&self.issuer)
    }
}
