//! # Taskboard API Server
//!
//! Serves the kanban REST API: signup/login, projects, tasks, and board
//! sync.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORAGE_BACKEND=memory cargo run -p taskboard-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use taskboard_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use taskboard_shared::{
    db::{migrations::run_migrations, pool::{close_pool, create_pool}},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match (config.storage, &config.database) {
        (StorageBackend::Postgres, Some(database)) => {
            let pool = create_pool(database.clone())
                .await
                .context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).await.context("Failed to run migrations")?;

            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        (StorageBackend::Postgres, None) => anyhow::bail!("PostgreSQL storage selected without DATABASE_URL"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    tracing::info!(
        storage = %config.storage,
        cors_origins = ?config.api.cors_origins,
        enforce_project_ownership = config.authz.enforce_project_ownership,
        "Configuration loaded"
    );

    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Installs the global subscriber; `LOG_FORMAT=json` selects JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
