use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsgate_api::config::ServerConfig;
use tsgate_api::registry::TenantStorageRegistry;
use tsgate_api::router::build_app_router;
use tsgate_api::session::{MemorySessionCache, RedisSessionCache, SessionCache, SessionStore};
use tsgate_api::state::AppState;
use tsgate_db::repositories::{TenantRepo, UserRepo};
use tsgate_tsdb::FileStoreOpener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tsgate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = tsgate_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    tsgate_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    tsgate_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let tenants = Arc::new(TenantRepo::new(pool.clone()));
    let users = Arc::new(UserRepo::new(pool.clone()));

    // --- Sessions ---
    let cache: Arc<dyn SessionCache> = match std::env::var("REDIS_URL") {
        Ok(url) if !url.is_empty() => {
            let cache = RedisSessionCache::connect(&url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Using Redis session cache");
            Arc::new(cache)
        }
        _ => {
            tracing::info!("Using in-process session cache");
            Arc::new(MemorySessionCache::new())
        }
    };

    // --- Tenant storage ---
    let registry = Arc::new(TenantStorageRegistry::new(
        config.tsdb.data_dir.clone(),
        config.tsdb.storage.clone(),
        Arc::new(FileStoreOpener),
    ));
    let opened = registry
        .open_existing(tenants.as_ref())
        .await
        .context("Failed to open tenant storage")?;
    tracing::info!(opened, data_dir = %registry.data_dir().display(), "Tenant stores opened");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tenants,
        users,
        sessions: SessionStore::new(cache),
        registry: Arc::clone(&registry),
    };

    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse::<std::net::IpAddr>().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    // Storage first, then the directory pool.
    tracing::info!("Server stopped accepting connections, cleaning up");

    let cleanup_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(cleanup_timeout, registry.close_all())
        .await
        .is_err()
    {
        tracing::error!(
            timeout_secs = config.shutdown_timeout_secs,
            "Timed out closing tenant stores"
        );
    }

    pool.close().await;
    tracing::info!("Database pool closed");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
