//! Builders for gateway snapshot configuration documents.
//!
//! Produce the JSON document the gateway loads at startup, with sensible
//! test defaults: one service, one route covering `/api`, a trusted RS256
//! issuer named `svc-idp`, and a one-hour token lifetime cap.

use crate::crypto_fixtures::RSA_PUBLIC_KEY_PEM;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct TestSnapshotBuilder {
    services: Vec<Value>,
    routes: Vec<Value>,
    trust: Vec<Value>,
    cors: Option<Value>,
    rate_limit: Option<Value>,
    jwt: Value,
}

impl TestSnapshotBuilder {
    /// Empty snapshot with default JWT policy and no services, routes, or
    /// trusted issuers.
    pub fn new() -> Self {
        TestSnapshotBuilder {
            services: Vec::new(),
            routes: Vec::new(),
            trust: Vec::new(),
            cors: None,
            rate_limit: None,
            jwt: json!({
                "maximum_lifetime_seconds": 3600,
            }),
        }
    }

    /// Snapshot with one service at `upstream_url`, one route for `/api`,
    /// and the primary RS256 fixture key trusted under issuer `svc-idp`.
    pub fn single_service(upstream_url: &str) -> Self {
        Self::new()
            .service("api", upstream_url)
            .route("api-route", &["/api"], "api")
            .trusted_issuer("svc-idp", "RS256", RSA_PUBLIC_KEY_PEM)
    }

    pub fn service(mut self, name: &str, url: &str) -> Self {
        self.services.push(json!({ "name": name, "url": url }));
        self
    }

    pub fn route(mut self, name: &str, paths: &[&str], service: &str) -> Self {
        self.routes.push(json!({
            "name": name,
            "paths": paths,
            "service": service,
        }));
        self
    }

    pub fn route_with_strip(mut self, name: &str, paths: &[&str], service: &str) -> Self {
        self.routes.push(json!({
            "name": name,
            "paths": paths,
            "service": service,
            "strip_path": true,
        }));
        self
    }

    pub fn trusted_issuer(mut self, issuer: &str, algorithm: &str, public_key: &str) -> Self {
        self.trust.push(json!({
            "issuer": issuer,
            "algorithm": algorithm,
            "public_key": public_key,
        }));
        self
    }

    pub fn trusted_issuer_with_lifetime(
        mut self,
        issuer: &str,
        algorithm: &str,
        public_key: &str,
        max_lifetime_seconds: i64,
    ) -> Self {
        self.trust.push(json!({
            "issuer": issuer,
            "algorithm": algorithm,
            "public_key": public_key,
            "max_lifetime_seconds": max_lifetime_seconds,
        }));
        self
    }

    pub fn rate_limit(mut self, per_minute: u64, per_hour: u64) -> Self {
        self.rate_limit = Some(json!({
            "per_minute": per_minute,
            "per_hour": per_hour,
        }));
        self
    }

    pub fn rate_limit_fail_closed(mut self, per_minute: u64, per_hour: u64) -> Self {
        self.rate_limit = Some(json!({
            "per_minute": per_minute,
            "per_hour": per_hour,
            "fail_open": false,
        }));
        self
    }

    pub fn cors(mut self, allowed_origins: &[&str]) -> Self {
        self.cors = Some(json!({
            "allowed_origins": allowed_origins,
            "allowed_methods": ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"],
            "allowed_headers": ["authorization", "content-type"],
        }));
        self
    }

    pub fn cors_with_credentials(mut self, allowed_origins: &[&str]) -> Self {
        self.cors = Some(json!({
            "allowed_origins": allowed_origins,
            "allowed_methods": ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"],
            "allowed_headers": ["authorization", "content-type"],
            "allow_credentials": true,
        }));
        self
    }

    /// Replace the JWT policy wholesale.
    pub fn jwt_policy(mut self, policy: Value) -> Self {
        self.jwt = policy;
        self
    }

    /// Set a single JWT policy field, keeping the other defaults.
    pub fn jwt_field(mut self, name: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.jwt {
            map.insert(name.to_string(), value);
        }
        self
    }

    /// Render the snapshot document.
    pub fn build(&self) -> Value {
        let mut doc = json!({
            "services": self.services,
            "routes": self.routes,
            "trust": self.trust,
            "jwt": self.jwt,
        });
        if let Some(cors) = &self.cors {
            doc["cors"] = cors.clone();
        }
        if let Some(rate_limit) = &self.rate_limit {
            doc["rate_limit"] = rate_limit.clone();
        }
        doc
    }

    /// Render as a JSON string, as stored on disk.
    pub fn build_string(&self) -> String {
        serde_json::to_string_pretty(&self.build()).expect("snapshot should serialize")
    }
}

impl Default for TestSnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_service_defaults() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000").build();

        assert_eq!(doc["services"][0]["name"], "api");
        assert_eq!(doc["routes"][0]["paths"][0], "/api");
        assert_eq!(doc["trust"][0]["issuer"], "svc-idp");
        assert_eq!(doc["jwt"]["maximum_lifetime_seconds"], 3600);
        assert!(doc.get("cors").is_none());
    }

    #[test]
    fn test_rate_limit_and_cors_sections() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000")
            .rate_limit(100, 1000)
            .cors(&["https://app.example.com"])
            .build();

        assert_eq!(doc["rate_limit"]["per_minute"], 100);
        assert_eq!(doc["cors"]["allowed_origins"][0], "https://app.example.com");
    }
}
