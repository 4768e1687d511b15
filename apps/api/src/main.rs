mod config;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod report;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreKind};
use crate::jobs::lifecycle::JobLifecycle;
use crate::jobs::worker::{self, PoolConfig};
use crate::llm_client::LlmClient;
use crate::report::{AnthropicReportGenerator, ReportGenerator};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryBackend;
use crate::store::redis::RedisBackend;
use crate::store::{JobStore, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pathway API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize job store
    let backend: Arc<dyn StoreBackend> = match config.store {
        StoreKind::Redis => {
            info!("Job store: Redis (connection opened on first use)");
            Arc::new(RedisBackend::open(&config.redis_url, config.redis_tls_insecure)?)
        }
        StoreKind::Memory => {
            info!("Job store: in-memory (records are lost on restart)");
            Arc::new(MemoryBackend::new())
        }
    };
    let store = JobStore::new(backend, config.job_ttl);

    // Initialize LLM client and report generator
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_http_timeout,
        config.llm_max_attempts,
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator: Arc<dyn ReportGenerator> = Arc::new(AnthropicReportGenerator::new(llm));

    // Start generation workers
    let lifecycle = JobLifecycle::new(store.clone(), config.generation_timeout);
    let (dispatcher, pool) = worker::start(
        lifecycle,
        generator,
        &PoolConfig {
            concurrency: config.worker_concurrency,
            queue_capacity: config.job_queue_capacity,
        },
    );

    // Build router
    let app = build_router(AppState { store, dispatcher })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining worker pool");
    pool.shutdown(config.shutdown_grace).await;
    info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
