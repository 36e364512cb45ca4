mod auth;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use portfolio_site_core::cache::{FileCache, LocalCache, MemoryCache};
use portfolio_site_core::store::{DocumentStore, MemoryDocumentStore, OwnerRules, PgDocumentStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!(
        store = config.store_backend.as_str(),
        owner_rules = config.enforce_owner_rules,
        "Starting portfolio site API server"
    );

    let (store, pool) = open_store(&config).await?;

    let cache: Arc<dyn LocalCache> = match &config.cache_dir {
        Some(dir) => {
            let cache = FileCache::open(dir.clone())
                .map_err(|e| anyhow::anyhow!("Failed to open cache at {}: {e}", dir.display()))?;
            tracing::info!(dir = %dir.display(), "Using file cache");
            Arc::new(cache)
        }
        None => Arc::new(MemoryCache::new()),
    };

    let cors = middleware::cors::cors_layer(config.cors_origin.as_deref())
        .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGIN: {e}"))?;

    let state = state::AppState::new(store, cache, pool, config.clone());

    let app = routes::build_router(state)
        .layer(middleware::request_tracing::trace_layer())
        .layer(cors);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn open_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn DocumentStore>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; documents are lost on restart");
            let store = if config.enforce_owner_rules {
                MemoryDocumentStore::with_policy(OwnerRules)
            } else {
                MemoryDocumentStore::new()
            };
            Ok((Arc::new(store), None))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .min_connections(config.db_min_connections)
                .connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
            tracing::info!("Connected to PostgreSQL");

            let store = if config.enforce_owner_rules {
                PgDocumentStore::with_policy(pool.clone(), OwnerRules)
            } else {
                PgDocumentStore::new(pool.clone())
            };
            store
                .migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            tracing::info!("Database migrations applied");

            Ok((Arc::new(store), Some(pool)))
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
