//! Shared test harness: spawns a real gateway on a random port against a
//! snapshot document, with the process-local counter store.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use anyhow::Result;
use edge_gateway::admission::{CounterStore, LocalCounterStore, RateLimiter};
use edge_gateway::auth::Verifier;
use edge_gateway::config::Config;
use edge_gateway::proxy::Forwarder;
use edge_gateway::routes::{self, AppState};
use edge_gateway::snapshot::SnapshotHolder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Global metrics handle for test servers (the Prometheus recorder can only
/// be installed once per process).
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            edge_gateway::observability::metrics::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// A running gateway instance bound to a random local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub snapshots: Arc<SnapshotHolder>,
    snapshot_path: PathBuf,
    _server_handle: JoinHandle<()>,
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.snapshot_path);
    }
}

impl TestGateway {
    /// Spawn a gateway with the default 30 second upstream timeout.
    pub async fn spawn(snapshot: &serde_json::Value) -> Result<Self> {
        Self::spawn_inner(snapshot, 30, Arc::new(LocalCounterStore::new())).await
    }

    /// Spawn a gateway with an explicit upstream timeout, for deadline
    /// tests.
    pub async fn spawn_with_upstream_timeout(
        snapshot: &serde_json::Value,
        upstream_timeout_secs: u64,
    ) -> Result<Self> {
        Self::spawn_inner(
            snapshot,
            upstream_timeout_secs,
            Arc::new(LocalCounterStore::new()),
        )
        .await
    }

    /// Spawn a gateway with a custom counter store, for store-outage tests.
    pub async fn spawn_with_store(
        snapshot: &serde_json::Value,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self> {
        Self::spawn_inner(snapshot, 30, store).await
    }

    async fn spawn_inner(
        snapshot: &serde_json::Value,
        upstream_timeout_secs: u64,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self> {
        let snapshot_path = std::env::temp_dir().join(format!(
            "gw-test-{}-{}.json",
            std::process::id(),
            uuid_suffix()
        ));
        std::fs::write(&snapshot_path, serde_json::to_string_pretty(snapshot)?)?;

        let vars = HashMap::from([
            (
                "GW_CONFIG_PATH".to_string(),
                snapshot_path.display().to_string(),
            ),
            ("GW_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "GW_UPSTREAM_TIMEOUT_SECONDS".to_string(),
                upstream_timeout_secs.to_string(),
            ),
        ]);
        let config =
            Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("config failed: {e}"))?;

        let snapshots = Arc::new(
            SnapshotHolder::load(&config.config_path)
                .map_err(|e| anyhow::anyhow!("snapshot load failed: {e}"))?,
        );

        let verifier = Verifier::new(Duration::from_secs(60));
        let limiter = RateLimiter::new(store);
        let forwarder = Forwarder::new(Duration::from_secs(upstream_timeout_secs))?;

        let state = Arc::new(AppState {
            config,
            snapshots: Arc::clone(&snapshots),
            verifier,
            limiter,
            forwarder,
        });

        let app = routes::build_routes(state, get_test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server_handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {e}");
            }
        });

        Ok(TestGateway {
            addr,
            snapshots,
            snapshot_path,
            _server_handle: server_handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Overwrite the snapshot file on disk (for reload tests).
    pub fn rewrite_snapshot(&self, snapshot: &serde_json::Value) -> Result<()> {
        std::fs::write(
            &self.snapshot_path,
            serde_json::to_string_pretty(snapshot)?,
        )?;
        Ok(())
    }
}

fn uuid_suffix() -> String {
    // Enough uniqueness for parallel test files without another dependency.
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client should build")
}
