//! User Service
//!
//! Entry point for the user registration and authentication service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use user_service::config::Config;
use user_service::observability::init_tracing;
use user_service::repositories::{InMemoryUserStore, PgUserStore, UserStore};
use user_service::routes::{self, AppState};

use common::secret::ExposeSecret;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first; the log format depends on it
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(config.log_format, "user_service=debug,tower_http=debug");

    info!("Starting User Service");
    info!(
        bind_address = %config.bind_address,
        token_validity_days = config.token_validity_days,
        token_cache_ttl_seconds = config.token_cache_ttl.as_secs(),
        bcrypt_cost = config.bcrypt_cost,
        "Configuration loaded successfully"
    );

    let store = open_store(&config).await?;

    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    let bind_address = config.bind_address.clone();
    let drain_period = config.drain_period;

    let state = Arc::new(AppState::new(config, store));
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("User Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain_period))
    .await?;

    info!("User Service shutdown complete");

    Ok(())
}

/// Postgres when `DATABASE_URL` is set, in-memory otherwise.
async fn open_store(config: &Config) -> Result<Arc<dyn UserStore>, Box<dyn std::error::Error>> {
    let Some(database_url) = config.database_url.as_ref() else {
        warn!("DATABASE_URL not set, using in-memory store; records are lost on exit");
        return Ok(Arc::new(InMemoryUserStore::new()));
    };

    info!("Connecting to database...");
    let url = add_query_timeout(database_url.expose_secret(), 5);
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;
    info!("Database connection established");

    let store = PgUserStore::new(pool);
    store.migrate().await.map_err(|e| {
        error!("Failed to run migrations: {}", e);
        e
    })?;

    Ok(Arc::new(store))
}

/// Listens for SIGINT/SIGTERM, then waits out the drain period.
async fn shutdown_signal(drain_period: Duration) {
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

    if drain_period.is_zero() {
        info!("Skipping drain period (DRAIN_SECONDS=0)");
    } else {
        warn!("Draining connections for {} seconds...", drain_period.as_secs());
        tokio::time::sleep(drain_period).await;
        info!("Drain period complete");
    }
}

/// Adds statement_timeout to the database URL so queries cannot hang.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}
