//! kvstore - in-memory JSON key-value store served over HTTP

// Use jemalloc for better multi-threaded performance
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use kvstore::config::Config;
use kvstore::health::HealthState;
use kvstore::metrics::Metrics;
use kvstore::server::Server;
use kvstore::storage::MemoryStorage;
use std::sync::Arc;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.server.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path),
        None => info!("Using default configuration (set KVSTORE_* env vars to customize)"),
    }
    info!("Configuration: {:?}", config.server);

    // Build tokio runtime with configured worker threads
    let mut runtime_builder = Builder::new_multi_thread();
    if config.server.worker_threads > 0 {
        runtime_builder.worker_threads(config.server.worker_threads);
        info!("Using {} worker threads", config.server.worker_threads);
    }
    let runtime = runtime_builder.enable_all().build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let storage = Arc::new(MemoryStorage::with_memory_db(
        config.storage.initial_entries.clone(),
    ));
    info!(
        "Storage initialized with {} entries",
        config.storage.initial_entries.len()
    );

    let metrics = Arc::new(Metrics::new());
    let health = Arc::new(HealthState::new(
        config.server.server_env.clone(),
        config.metrics.enabled.then(|| Arc::clone(&metrics)),
    ));

    let server = Server::new(
        config.server.clone(),
        storage,
        metrics,
        health,
        cancel_token.clone(),
    );

    // Setup signal handlers
    let cancel_for_signal = cancel_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
            }
            _ = async {
                #[cfg(unix)]
                {
                    use tokio::signal::unix::{signal, SignalKind};
                    match signal(SignalKind::terminate()) {
                        Ok(mut sigterm) => sigterm.recv().await,
                        Err(e) => {
                            error!("Failed to install SIGTERM handler: {}", e);
                            std::future::pending::<Option<()>>().await
                        }
                    }
                }
                #[cfg(not(unix))]
                {
                    std::future::pending::<Option<()>>().await
                }
            } => {
                info!("Received SIGTERM, shutting down...");
            }
        }
        cancel_for_signal.cancel();
    });

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("kvstore stopped");
    Ok(())
}
