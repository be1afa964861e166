//! Postgres access for the user directory
//!
//! Only the `users` table lives here. Nonces never touch the database.

use std::time::{Duration, Instant};

use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] MigrateError),

    #[error("Database health check failed: {0}")]
    HealthCheck(#[source] sqlx::Error),
}

/// Open a pool and bring the schema up to date
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(DbError::Connect)?;

    tracing::info!(max_connections, "Database pool ready");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database schema is up to date");

    Ok(pool)
}

/// Round-trip a trivial query, returning how long it took
pub async fn ping(pool: &PgPool) -> Result<Duration, DbError> {
    let started = Instant::now();

    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DbError::HealthCheck)?;

    Ok(started.elapsed())
}
