//! kvscope - headless dashboard server
//!
//! Runs the store, the TTL ticker and the push client, and exposes the
//! state over a small JSON HTTP surface.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kvscope::api::create_router;
use kvscope::push::{HttpHealthCheck, PushClient, WsConnector};
use kvscope::{spawn_ttl_ticker, AppState, Config, ConnectionState, Store};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the store
/// 4. Start the TTL ticker and the push client
/// 5. Serve the HTTP surface until SIGINT/SIGTERM
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kvscope=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kvscope");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: api_url={}, ws_url={}, lru_capacity={}, port={}",
        config.api_url, config.ws_url, config.default_lru_capacity, config.server_port
    );

    let store = Store::from_config(&config).context("failed to initialize store")?;
    info!("Store initialized");

    let ticker = spawn_ttl_ticker(store.clone(), config.ttl_tick());
    let watcher = spawn_connection_logger(store.clone());

    let health = HttpHealthCheck::new(config.health_url(), config.health_poll_interval())
        .context("failed to build health client")?;
    let (push, push_task) = PushClient::new(&config, store.clone(), WsConnector, health).spawn();
    info!("Push client started");

    let app = create_router(AppState::with_push(store, push.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    push.shutdown();
    if let Err(err) = push_task.await {
        warn!(error = %err, "Push client task ended abnormally");
    }
    ticker.abort();
    watcher.abort();
    warn!("Background tasks stopped");

    info!("Server shutdown complete");
    Ok(())
}

/// Logs every connection state change of the push channel.
fn spawn_connection_logger(store: Store) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut states = store.watch(|s| (s.connection.state, s.connection.attempts));
        while let Some((state, attempts)) = states.changed().await {
            match state {
                ConnectionState::Disabled => {
                    warn!(attempts, "Push channel disabled; polling collector health")
                }
                _ => info!(?state, attempts, "Push channel state changed"),
            }
        }
    })
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
