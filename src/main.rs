//! Marketplace Auth Server
//!
//! Issues login challenges to wallet addresses, verifies the signed
//! challenges and hands out session tokens.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::Duration;
use tokio::signal;

use marketplace_auth_server::auth::{
    run_nonce_sweeper, AuthService, InMemoryUserDirectory, JwtSessionIssuer, NonceStore,
    PgUserDirectory, UserDirectory,
};
use marketplace_auth_server::config::Config;
use marketplace_auth_server::db;
use marketplace_auth_server::middleware::{run_rate_limiter_cleanup, RateLimiter};
use marketplace_auth_server::routes;
use marketplace_auth_server::state::AppState;
use marketplace_auth_server::time_source::SystemTimeSourceDefault;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting auth server");

    let users: Arc<dyn UserDirectory> = match &config.database_url {
        Some(database_url) => {
            tracing::info!(
                "Connecting to database at {}",
                config.database_url_masked().unwrap_or_default()
            );
            let pool = db::connect(database_url, config.db_max_connections)
                .await
                .context("Failed to initialize database")?;
            Arc::new(PgUserDirectory::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory only");
            Arc::new(InMemoryUserDirectory::new())
        }
    };

    // One nonce store per process, never persisted
    let nonce_store = Arc::new(NonceStore::with_ttl(
        Duration::seconds(config.auth_nonce_ttl_seconds),
        Arc::new(SystemTimeSourceDefault),
    ));

    let session_issuer = Arc::new(JwtSessionIssuer::new(
        config.jwt_secret.clone(),
        config.refresh_token_secret.clone(),
        config.jwt_access_token_ttl_seconds,
        config.refresh_token_ttl_days,
    ));

    let auth_service = Arc::new(AuthService::new(
        nonce_store.clone(),
        users,
        session_issuer.clone(),
    ));

    // Memory bound only; expiry is enforced when a nonce is consumed
    let sweep_period = StdDuration::from_secs(config.nonce_sweep_interval_seconds);
    tokio::spawn(async move {
        tracing::info!(period_secs = sweep_period.as_secs(), "Nonce sweeper task started");
        run_nonce_sweeper(nonce_store, sweep_period).await;
    });

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        run_rate_limiter_cleanup(cleanup_limiter, StdDuration::from_secs(60)).await;
    });

    let app_state = AppState::new(auth_service, session_issuer, rate_limiter);
    let app = routes::app_router(app_state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid HOST/PORT")?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    // Peer addresses key the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
