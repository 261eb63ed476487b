use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use topstories_core::{
    load_config, validate_config, CompletionPoller, HackerNewsClient, IngestRunner, LoggingConfig,
    MemoryCache, PollPolicy, StoryPipeline, Upstream, WorkerPoolQueue,
};
use topstories_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Interval between sweeps of expired cache entries and finished job records
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialised yet.
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("TOPSTORIES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let _log_guard = init_tracing(&config.logging);

    info!("Top stories server v{} starting", VERSION);
    info!("Configuration loaded from {:?}", config_path);
    info!("Upstream API: {}", config.upstream.base_url);

    // Wire the pipeline
    let upstream: Arc<dyn Upstream> = Arc::new(
        HackerNewsClient::new(&config.upstream).context("Failed to create upstream client")?,
    );
    let cache = Arc::new(MemoryCache::new());
    let runner = Arc::new(IngestRunner::new(
        upstream,
        cache.clone(),
        config.cache.ttl(),
    ));
    let queue = Arc::new(WorkerPoolQueue::new(config.queue.clone(), runner));
    info!(
        "Worker pool '{}' ready ({} workers, {} retries)",
        config.queue.name, config.queue.worker_count, config.queue.retry_attempts
    );

    let poller = CompletionPoller::new(queue.clone(), PollPolicy::from(&config.poller));
    let pipeline = Arc::new(StoryPipeline::new(
        queue.clone(),
        poller,
        cache.clone(),
        config.pipeline.clone(),
    ));

    let shutdown = CancellationToken::new();

    let housekeeping = tokio::spawn(housekeeping_loop(
        queue.clone(),
        cache.clone(),
        shutdown.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        pipeline,
        queue,
        cache,
        shutdown.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, cancelling in-flight requests");
            token.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    let _ = housekeeping.await;
    info!("Server stopped");

    Ok(())
}

/// Console logging, plus a daily rolling file when a log directory is configured.
///
/// The returned guard must be held for the life of the process so buffered
/// file output is flushed.
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "topstories.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    guard
}

/// Periodically drop expired cache entries and collect finished job records.
async fn housekeeping_loop(
    queue: Arc<WorkerPoolQueue>,
    cache: Arc<MemoryCache>,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Housekeeping loop stopped");
                return;
            }
            _ = interval.tick() => {
                let expired = cache.purge_expired();
                let collected = queue.purge_finished().await;
                debug!(
                    "Housekeeping: {} cache entries expired, {} job records collected",
                    expired, collected
                );
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
