//! Edge gateway entry point.
//!
//! Loads process configuration and the declarative snapshot, wires the
//! counter store (shared Redis or process-local), and serves the gateway
//! with graceful shutdown. SIGHUP triggers a snapshot reload; a reload that
//! fails validation is rejected and the last known good snapshot stays
//! active.

use edge_gateway::admission::{LocalCounterStore, RateLimiter, RedisCounterStore};
use edge_gateway::auth::Verifier;
use edge_gateway::config::Config;
use edge_gateway::observability::metrics::{init_metrics_recorder, record_snapshot_reload};
use edge_gateway::proxy::Forwarder;
use edge_gateway::routes::{self, AppState};
use edge_gateway::snapshot::SnapshotHolder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting edge gateway");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        config_path = %config.config_path,
        clock_skew_seconds = config.clock_skew_seconds,
        upstream_timeout_seconds = config.upstream_timeout_seconds,
        shared_counter_store = config.redis_url.is_some(),
        "Configuration loaded successfully"
    );

    // Initial snapshot load is fatal on any error.
    let snapshots = Arc::new(SnapshotHolder::load(&config.config_path).map_err(|e| {
        error!("Failed to load gateway snapshot: {}", e);
        e
    })?);

    // Counter store: shared Redis when configured, process-local otherwise.
    // A Redis that is unreachable at startup is a deployment error; transient
    // failures afterwards degrade per the rate-limit policy.
    let limiter = match &config.redis_url {
        Some(url) => {
            info!("Connecting to shared counter store...");
            let store = RedisCounterStore::connect(
                url,
                Duration::from_millis(config.store_timeout_ms),
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to counter store: {}", e);
                e
            })?;
            info!("Shared counter store connected");
            RateLimiter::new(Arc::new(store))
        }
        None => {
            info!("Using process-local counter store");
            RateLimiter::new(Arc::new(LocalCounterStore::new()))
        }
    };

    let verifier = Verifier::new(Duration::from_secs(config.clock_skew_seconds.unsigned_abs()));
    let forwarder = Forwarder::new(Duration::from_secs(config.upstream_timeout_seconds))
        .map_err(|e| {
            error!("Failed to build upstream client: {}", e);
            e
        })?;

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState {
        config,
        snapshots: Arc::clone(&snapshots),
        verifier,
        limiter,
        forwarder,
    });

    spawn_reload_task(snapshots);

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Edge gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Edge gateway shutdown complete");

    Ok(())
}

/// SIGHUP reloads the snapshot. Rejected reloads keep the previous snapshot
/// active and are logged with the validation error.
#[cfg(unix)]
fn spawn_reload_task(snapshots: Arc<SnapshotHolder>) {
    tokio::spawn(async move {
        let mut stream = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to listen for SIGHUP: {}", e);
                return;
            }
        };

        while stream.recv().await.is_some() {
            match snapshots.reload() {
                Ok(version) => {
                    record_snapshot_reload("success");
                    info!(version, "Snapshot reload applied");
                }
                Err(e) => {
                    record_snapshot_reload("rejected");
                    error!("Snapshot reload rejected, keeping previous snapshot: {}", e);
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_task(_snapshots: Arc<SnapshotHolder>) {}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    // Graceful shutdown drain period
    let drain_secs: u64 = std::env::var("GW_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (GW_DRAIN_SECONDS=0)");
    }
}
