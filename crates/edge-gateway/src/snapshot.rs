//! Compiled gateway snapshot and atomic swap.
//!
//! The declarative configuration file compiles into an immutable
//! [`GatewaySnapshot`]: pre-parsed trust records, a compiled route table, and
//! the JWT/CORS/rate-limit policies. Requests clone an `Arc` to the current
//! snapshot once at the start of the pipeline, so a concurrent reload never
//! changes behavior mid-request.
//!
//! Reload is all-or-nothing: a snapshot that fails to compile is rejected and
//! the last known good snapshot stays active.

use crate::config::{ConfigError, CorsPolicy, JwtPolicy, RateLimitPolicy, SnapshotFile};
use crate::proxy::RouteTable;
use crate::trust::TrustStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Immutable, fully-compiled gateway state.
#[derive(Debug, Clone)]
pub struct GatewaySnapshot {
    /// Issuer trust store with pre-parsed keys.
    pub trust: TrustStore,

    /// Compiled route table, ordered longest-prefix-first.
    pub routes: RouteTable,

    /// JWT verification policy.
    pub jwt: JwtPolicy,

    /// CORS policy, when configured.
    pub cors: Option<CorsPolicy>,

    /// Rate-limit policy, when configured.
    pub rate_limit: Option<RateLimitPolicy>,

    /// Monotonic version, incremented on each successful (re)load.
    pub version: u64,
}

impl GatewaySnapshot {
    /// Compile a parsed configuration file into runtime state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when key material cannot be parsed or routes
    /// cannot be compiled. Nothing is partially applied.
    pub fn compile(file: SnapshotFile, version: u64) -> Result<Self, ConfigError> {
        let trust = TrustStore::from_records(&file.trust, file.jwt.maximum_lifetime_seconds)?;
        let routes = RouteTable::compile(&file.services, &file.routes)?;

        Ok(GatewaySnapshot {
            trust,
            routes,
            jwt: file.jwt,
            cors: file.cors,
            rate_limit: file.rate_limit,
            version,
        })
    }
}

/// Holds the current snapshot and swaps it atomically on reload.
pub struct SnapshotHolder {
    current: RwLock<Arc<GatewaySnapshot>>,
    path: String,
    next_version: AtomicU64,
}

impl SnapshotHolder {
    /// Load the initial snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Any read, parse, or compile failure is returned; startup without a
    /// valid snapshot is fatal.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let snapshot = read_and_compile(path, 1)?;
        tracing::info!(
            target: "gw.snapshot",
            path = %path,
            issuers = snapshot.trust.len(),
            routes = snapshot.routes.len(),
            "Gateway snapshot loaded"
        );

        Ok(SnapshotHolder {
            current: RwLock::new(Arc::new(snapshot)),
            path: path.to_string(),
            next_version: AtomicU64::new(2),
        })
    }

    /// The current snapshot. Callers hold the returned `Arc` for the whole
    /// request so a concurrent swap cannot change their view.
    #[must_use]
    pub fn current(&self) -> Arc<GatewaySnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read and re-compile the configuration file, swapping the active
    /// snapshot on success.
    ///
    /// # Errors
    ///
    /// On failure the previous snapshot remains active and the error is
    /// returned for logging; the gateway never runs without a snapshot.
    pub fn reload(&self) -> Result<u64, ConfigError> {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        let snapshot = read_and_compile(&self.path, version)?;
        let issuers = snapshot.trust.len();
        let routes = snapshot.routes.len();

        let next = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }

        tracing::info!(
            target: "gw.snapshot",
            version,
            issuers,
            routes,
            "Gateway snapshot reloaded"
        );
        Ok(version)
    }
}

impl std::fmt::Debug for SnapshotHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHolder")
            .field("path", &self.path)
            .field("version", &self.current().version)
            .finish()
    }
}

fn read_and_compile(path: &str, version: u64) -> Result<GatewaySnapshot, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let file = SnapshotFile::from_json(&raw)?;
    GatewaySnapshot::compile(file, version)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gateway_test_utils::snapshot_builders::TestSnapshotBuilder;
    use std::io::Write;

    /// Unique snapshot file under the system temp dir, removed on drop.
    struct TempSnapshot(std::path::PathBuf);

    impl Drop for TempSnapshot {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn write_temp_snapshot(contents: &str) -> (TempSnapshot, String) {
        let path = std::env::temp_dir().join(format!(
            "gw-snapshot-{}-{}.json",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let display = path.display().to_string();
        (TempSnapshot(path), display)
    }

    #[test]
    fn test_load_compiles_snapshot() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000").build_string();
        let (_guard, path) = write_temp_snapshot(&doc);

        let holder = SnapshotHolder::load(&path).unwrap();
        let snapshot = holder.current();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.trust.len(), 1);
        assert!(snapshot.trust.lookup("svc-idp").is_some());
        assert_eq!(snapshot.routes.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let result = SnapshotHolder::load("/nonexistent/gateway.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000").build_string();
        let (_guard, path) = write_temp_snapshot(&doc);
        let holder = SnapshotHolder::load(&path).unwrap();

        let updated = TestSnapshotBuilder::single_service("http://127.0.0.1:9000")
            .service("billing", "http://127.0.0.1:9001")
            .route("billing-route", &["/api/billing"], "billing")
            .build_string();
        std::fs::write(&path, updated).unwrap();

        let version = holder.reload().unwrap();
        assert_eq!(version, 2);

        let snapshot = holder.current();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.routes.len(), 2);
    }

    #[test]
    fn test_failed_reload_retains_previous_snapshot() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000").build_string();
        let (_guard, path) = write_temp_snapshot(&doc);
        let holder = SnapshotHolder::load(&path).unwrap();

        std::fs::write(&path, "{broken").unwrap();
        let result = holder.reload();
        assert!(result.is_err());

        // Last known good stays active.
        let snapshot = holder.current();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.trust.lookup("svc-idp").is_some());
    }

    #[test]
    fn test_request_view_survives_concurrent_swap() {
        let doc = TestSnapshotBuilder::single_service("http://127.0.0.1:9000").build_string();
        let (_guard, path) = write_temp_snapshot(&doc);
        let holder = SnapshotHolder::load(&path).unwrap();

        let held = holder.current();

        let updated = TestSnapshotBuilder::new()
            .service("api", "http://127.0.0.1:9000")
            .route("api-route", &["/api"], "api")
            .build_string();
        std::fs::write(&path, updated).unwrap();
        holder.reload().unwrap();

        // The held view still has the original trust store even though the
        // active snapshot no longer trusts any issuer.
        assert!(held.trust.lookup("svc-idp").is_some());
        assert!(holder.current().trust.is_empty());
    }
}
