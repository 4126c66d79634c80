//! Gateway configuration.
//!
//! Two layers:
//!
//! 1. Process configuration from environment variables ([`Config`]) — bind
//!    address, declarative config path, optional shared counter store.
//! 2. The declarative snapshot file ([`SnapshotFile`]) — services, routes,
//!    CORS policy, rate-limit policy, JWT policy, and issuer trust records.
//!    Loaded wholesale; validation failures are fatal at startup and reject
//!    a reload at runtime.
//!
//! Sensitive fields (Redis URL may carry credentials) are redacted in Debug
//! output.

use common::jwt::MAX_CLOCK_SKEW;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Default clock skew tolerance in seconds for temporal claim checks.
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 60;

/// Default upstream request timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

/// Default bounded timeout for shared counter-store calls, in milliseconds.
///
/// Kept short so an unhealthy store degrades admission control instead of
/// stalling the request path.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 500;

/// Process-level configuration, loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// Path to the declarative gateway configuration file (JSON).
    pub config_path: String,

    /// Optional Redis URL for the shared rate-limit counter store.
    /// When absent, counters are kept in process-local sharded memory.
    pub redis_url: Option<String>,

    /// Upstream request timeout in seconds.
    pub upstream_timeout_seconds: u64,

    /// Clock skew tolerance in seconds for `exp`/`nbf` validation.
    pub clock_skew_seconds: i64,

    /// Bounded timeout for shared counter-store calls, in milliseconds.
    pub store_timeout_ms: u64,
}

/// Custom Debug implementation that redacts the Redis URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("config_path", &self.config_path)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .finish()
    }
}

/// Configuration errors. All are fatal at startup; snapshot-related variants
/// also reject a runtime reload (the previous snapshot is retained).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid clock skew configuration: {0}")]
    InvalidClockSkew(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),

    #[error("Invalid counter store timeout configuration: {0}")]
    InvalidStoreTimeout(String),

    #[error("Failed to read gateway configuration at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse gateway configuration: {0}")]
    Parse(String),

    #[error("Duplicate service name: {0}")]
    DuplicateService(String),

    #[error("Invalid upstream URL for service {service}: {reason}")]
    InvalidUpstreamUrl { service: String, reason: String },

    #[error("Route {route} references unknown service: {service}")]
    UnknownServiceRef { route: String, service: String },

    #[error("Route {0} declares no path prefixes")]
    EmptyRoutePaths(String),

    #[error("Route {route} declares an invalid path prefix: {path}")]
    InvalidRoutePath { route: String, path: String },

    #[error("Duplicate issuer identity in trust records: {0}")]
    DuplicateIssuer(String),

    #[error("Invalid key material for issuer {issuer}: {reason}")]
    InvalidKeyMaterial { issuer: String, reason: String },

    #[error("Invalid rate limit configuration: {0}")]
    InvalidRateLimit(String),

    #[error("Invalid JWT policy: {0}")]
    InvalidJwtPolicy(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let config_path = vars
            .get("GW_CONFIG_PATH")
            .ok_or_else(|| ConfigError::MissingEnvVar("GW_CONFIG_PATH".to_string()))?
            .clone();

        let bind_address = vars
            .get("GW_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let redis_url = vars.get("GW_REDIS_URL").cloned().filter(|v| !v.is_empty());

        let upstream_timeout_seconds =
            if let Some(value_str) = vars.get("GW_UPSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidUpstreamTimeout(format!(
                        "GW_UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidUpstreamTimeout(
                        "GW_UPSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS
            };

        let clock_skew_seconds = if let Some(value_str) = vars.get("GW_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidClockSkew(format!(
                    "GW_CLOCK_SKEW_SECONDS must be a valid integer, got '{value_str}': {e}"
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidClockSkew(format!(
                    "GW_CLOCK_SKEW_SECONDS must be positive, got {value}"
                )));
            }

            #[allow(clippy::cast_possible_wrap)]
            let max = MAX_CLOCK_SKEW.as_secs() as i64;
            if value > max {
                return Err(ConfigError::InvalidClockSkew(format!(
                    "GW_CLOCK_SKEW_SECONDS must not exceed {max} seconds, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW_SECONDS
        };

        let store_timeout_ms = if let Some(value_str) = vars.get("GW_RATE_LIMIT_STORE_TIMEOUT_MS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidStoreTimeout(format!(
                    "GW_RATE_LIMIT_STORE_TIMEOUT_MS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidStoreTimeout(
                    "GW_RATE_LIMIT_STORE_TIMEOUT_MS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_STORE_TIMEOUT_MS
        };

        Ok(Config {
            bind_address,
            config_path,
            redis_url,
            upstream_timeout_seconds,
            clock_skew_seconds,
            store_timeout_ms,
        })
    }
}

// =============================================================================
// Declarative snapshot file
// =============================================================================

/// The whole declarative configuration file. Loaded and validated as one
/// unit; there is no partial-mutation API.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotFile {
    /// Upstream services, referenced by routes.
    pub services: Vec<ServiceConfig>,

    /// Routes, matched by longest path prefix (declaration order breaks ties).
    pub routes: Vec<RouteConfig>,

    /// Optional CORS policy. Absent means no CORS handling.
    #[serde(default)]
    pub cors: Option<CorsPolicy>,

    /// Optional rate-limit policy. Absent means admission control is off.
    #[serde(default)]
    pub rate_limit: Option<RateLimitPolicy>,

    /// JWT verification policy.
    pub jwt: JwtPolicy,

    /// Issuer trust records.
    pub trust: Vec<TrustRecordConfig>,
}

/// An upstream service: logical name plus network address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub url: String,
}

/// A route: path prefixes mapped to a service reference.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub paths: Vec<String>,
    pub service: String,

    /// Strip the matched prefix before forwarding.
    #[serde(default)]
    pub strip_path: bool,
}

/// CORS policy applied to all routes.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsPolicy {
    /// Allowed origins: exact values or the wildcard `"*"`.
    pub allowed_origins: Vec<String>,

    /// Methods advertised on preflight responses.
    pub allowed_methods: Vec<String>,

    /// Headers advertised on preflight responses.
    pub allowed_headers: Vec<String>,

    #[serde(default)]
    pub allow_credentials: bool,
}

/// Fixed-window rate-limit ceilings per identity.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitPolicy {
    pub per_minute: u64,
    pub per_hour: u64,

    /// Admit requests when the counter store is unreachable.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,
}

fn default_fail_open() -> bool {
    true
}

/// Which temporal claims the verifier enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifiableClaim {
    Exp,
    Nbf,
}

/// Where the gateway looks for a token, in fixed precedence order
/// (header > query > cookie) regardless of list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Header,
    Query,
    Cookie,
}

impl TokenSource {
    /// Label for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TokenSource::Header => "header",
            TokenSource::Query => "query",
            TokenSource::Cookie => "cookie",
        }
    }
}

/// JWT verification policy.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtPolicy {
    /// Claim used to select the trust record (default: issuer claim).
    #[serde(default = "default_key_selector_claim")]
    pub key_selector_claim: String,

    /// Temporal claims to enforce.
    #[serde(default = "default_claims_to_verify")]
    pub claims_to_verify: Vec<VerifiableClaim>,

    /// Default ceiling on `exp - iat`, overridable per trust record.
    pub maximum_lifetime_seconds: i64,

    /// Enabled token sources.
    #[serde(default = "default_token_sources")]
    pub token_sources: Vec<TokenSource>,

    /// Query parameter name checked when the query source is enabled.
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Cookie name checked when the cookie source is enabled.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_key_selector_claim() -> String {
    "iss".to_string()
}

fn default_claims_to_verify() -> Vec<VerifiableClaim> {
    vec![VerifiableClaim::Exp, VerifiableClaim::Nbf]
}

fn default_token_sources() -> Vec<TokenSource> {
    vec![TokenSource::Header, TokenSource::Query, TokenSource::Cookie]
}

fn default_query_param() -> String {
    "jwt".to_string()
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

impl JwtPolicy {
    /// Whether a token source is enabled.
    #[must_use]
    pub fn source_enabled(&self, source: TokenSource) -> bool {
        self.token_sources.contains(&source)
    }

    /// Whether a temporal claim is enforced.
    #[must_use]
    pub fn verifies(&self, claim: VerifiableClaim) -> bool {
        self.claims_to_verify.contains(&claim)
    }
}

/// A trust record: issuer identity bound to key material and policy.
#[derive(Debug, Clone, Deserialize)]
pub struct TrustRecordConfig {
    /// Issuer identity, globally unique (e.g. a realm URL).
    pub issuer: String,

    /// Signing algorithm bound to this issuer. Verification always uses this
    /// value, never the algorithm named inside a token header.
    pub algorithm: Algorithm,

    /// Public key material (PEM), or the shared secret for HMAC algorithms.
    pub public_key: String,

    /// Per-issuer override of the maximum token lifetime.
    #[serde(default)]
    pub max_lifetime_seconds: Option<i64>,
}

impl SnapshotFile {
    /// Parse the declarative configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed JSON, plus the structural
    /// validation errors from [`SnapshotFile::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: SnapshotFile =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    /// Structural validation: unique service names, resolvable service refs,
    /// non-empty absolute route prefixes, positive rate-limit ceilings, a
    /// positive lifetime ceiling. Key material is validated when the trust
    /// store is built.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut service_names = std::collections::HashSet::new();
        for service in &self.services {
            if !service_names.insert(service.name.as_str()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
        }

        for route in &self.routes {
            if !service_names.contains(route.service.as_str()) {
                return Err(ConfigError::UnknownServiceRef {
                    route: route.name.clone(),
                    service: route.service.clone(),
                });
            }
            if route.paths.is_empty() {
                return Err(ConfigError::EmptyRoutePaths(route.name.clone()));
            }
            for path in &route.paths {
                if !path.starts_with('/') {
                    return Err(ConfigError::InvalidRoutePath {
                        route: route.name.clone(),
                        path: path.clone(),
                    });
                }
            }
        }

        if let Some(policy) = &self.rate_limit {
            if policy.per_minute == 0 || policy.per_hour == 0 {
                return Err(ConfigError::InvalidRateLimit(
                    "rate limit ceilings must be greater than 0".to_string(),
                ));
            }
        }

        if self.jwt.maximum_lifetime_seconds <= 0 {
            return Err(ConfigError::InvalidJwtPolicy(
                "maximum_lifetime_seconds must be greater than 0".to_string(),
            ));
        }
        if self.jwt.key_selector_claim.is_empty() {
            return Err(ConfigError::InvalidJwtPolicy(
                "key_selector_claim must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "GW_CONFIG_PATH".to_string(),
            "/etc/gateway/gateway.json".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.config_path, "/etc/gateway/gateway.json");
        assert!(config.redis_url.is_none());
        assert_eq!(
            config.upstream_timeout_seconds,
            DEFAULT_UPSTREAM_TIMEOUT_SECONDS
        );
        assert_eq!(config.clock_skew_seconds, DEFAULT_CLOCK_SKEW_SECONDS);
        assert_eq!(config.store_timeout_ms, DEFAULT_STORE_TIMEOUT_MS);
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = base_vars();
        vars.insert("GW_BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert(
            "GW_REDIS_URL".to_string(),
            "redis://localhost:6379".to_string(),
        );
        vars.insert("GW_UPSTREAM_TIMEOUT_SECONDS".to_string(), "10".to_string());
        vars.insert("GW_CLOCK_SKEW_SECONDS".to_string(), "120".to_string());
        vars.insert(
            "GW_RATE_LIMIT_STORE_TIMEOUT_MS".to_string(),
            "250".to_string(),
        );

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.upstream_timeout_seconds, 10);
        assert_eq!(config.clock_skew_seconds, 120);
        assert_eq!(config.store_timeout_ms, 250);
    }

    #[test]
    fn test_from_vars_missing_config_path() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "GW_CONFIG_PATH"));
    }

    #[test]
    fn test_clock_skew_rejects_zero_and_negative() {
        for value in ["0", "-10"] {
            let mut vars = base_vars();
            vars.insert("GW_CLOCK_SKEW_SECONDS".to_string(), value.to_string());
            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidClockSkew(msg)) if msg.contains("must be positive"))
            );
        }
    }

    #[test]
    fn test_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("GW_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());
        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_clock_skew_accepts_max() {
        let mut vars = base_vars();
        vars.insert("GW_CLOCK_SKEW_SECONDS".to_string(), "600".to_string());
        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.clock_skew_seconds, 600);
    }

    #[test]
    fn test_upstream_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("GW_UPSTREAM_TIMEOUT_SECONDS".to_string(), "0".to_string());
        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidUpstreamTimeout(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_store_timeout_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert(
            "GW_RATE_LIMIT_STORE_TIMEOUT_MS".to_string(),
            "fast".to_string(),
        );
        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidStoreTimeout(msg)) if msg.contains("valid positive integer"))
        );
    }

    #[test]
    fn test_empty_redis_url_treated_as_absent() {
        let mut vars = base_vars();
        vars.insert("GW_REDIS_URL".to_string(), String::new());
        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_debug_redacts_redis_url() {
        let mut vars = base_vars();
        vars.insert(
            "GW_REDIS_URL".to_string(),
            "redis://:hunter2@localhost:6379".to_string(),
        );
        let config = Config::from_vars(&vars).expect("Config should load successfully");

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }

    // -------------------------------------------------------------------------
    // SnapshotFile
    // -------------------------------------------------------------------------

    fn minimal_snapshot_json() -> serde_json::Value {
        serde_json::json!({
            "services": [{"name": "employee-svc", "url": "http://employee-svc:8000"}],
            "routes": [{"name": "employees", "paths": ["/api/v1/employees"], "service": "employee-svc"}],
            "jwt": {"maximum_lifetime_seconds": 3600},
            "trust": []
        })
    }

    #[test]
    fn test_snapshot_file_parses_with_defaults() {
        let file = SnapshotFile::from_json(&minimal_snapshot_json().to_string()).unwrap();

        assert_eq!(file.jwt.key_selector_claim, "iss");
        assert_eq!(
            file.jwt.claims_to_verify,
            vec![VerifiableClaim::Exp, VerifiableClaim::Nbf]
        );
        assert_eq!(
            file.jwt.token_sources,
            vec![TokenSource::Header, TokenSource::Query, TokenSource::Cookie]
        );
        assert_eq!(file.jwt.query_param, "jwt");
        assert_eq!(file.jwt.cookie_name, "access_token");
        assert!(file.cors.is_none());
        assert!(file.rate_limit.is_none());
        assert!(!file.routes.first().unwrap().strip_path);
    }

    #[test]
    fn test_snapshot_file_rejects_unknown_service_ref() {
        let mut value = minimal_snapshot_json();
        value["routes"][0]["service"] = serde_json::json!("missing-svc");

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(
            result,
            Err(ConfigError::UnknownServiceRef { route, service })
                if route == "employees" && service == "missing-svc"
        ));
    }

    #[test]
    fn test_snapshot_file_rejects_duplicate_service() {
        let mut value = minimal_snapshot_json();
        value["services"] = serde_json::json!([
            {"name": "employee-svc", "url": "http://a:8000"},
            {"name": "employee-svc", "url": "http://b:8000"}
        ]);

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(result, Err(ConfigError::DuplicateService(name)) if name == "employee-svc"));
    }

    #[test]
    fn test_snapshot_file_rejects_empty_route_paths() {
        let mut value = minimal_snapshot_json();
        value["routes"][0]["paths"] = serde_json::json!([]);

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(result, Err(ConfigError::EmptyRoutePaths(name)) if name == "employees"));
    }

    #[test]
    fn test_snapshot_file_rejects_relative_route_path() {
        let mut value = minimal_snapshot_json();
        value["routes"][0]["paths"] = serde_json::json!(["api/v1/employees"]);

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(result, Err(ConfigError::InvalidRoutePath { .. })));
    }

    #[test]
    fn test_snapshot_file_rejects_zero_rate_limit() {
        let mut value = minimal_snapshot_json();
        value["rate_limit"] = serde_json::json!({"per_minute": 0, "per_hour": 100});

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(result, Err(ConfigError::InvalidRateLimit(_))));
    }

    #[test]
    fn test_snapshot_file_rejects_non_positive_lifetime() {
        let mut value = minimal_snapshot_json();
        value["jwt"]["maximum_lifetime_seconds"] = serde_json::json!(0);

        let result = SnapshotFile::from_json(&value.to_string());
        assert!(matches!(result, Err(ConfigError::InvalidJwtPolicy(_))));
    }

    #[test]
    fn test_snapshot_file_rejects_malformed_json() {
        let result = SnapshotFile::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rate_limit_fail_open_defaults_true() {
        let mut value = minimal_snapshot_json();
        value["rate_limit"] = serde_json::json!({"per_minute": 100, "per_hour": 1000});

        let file = SnapshotFile::from_json(&value.to_string()).unwrap();
        assert!(file.rate_limit.unwrap().fail_open);
    }

    #[test]
    fn test_trust_record_algorithm_parses() {
        let mut value = minimal_snapshot_json();
        value["trust"] = serde_json::json!([
            {"issuer": "svc-idp", "algorithm": "RS256", "public_key": "irrelevant"}
        ]);

        let file = SnapshotFile::from_json(&value.to_string()).unwrap();
        assert_eq!(file.trust.first().unwrap().algorithm, Algorithm::RS256);
    }
}
