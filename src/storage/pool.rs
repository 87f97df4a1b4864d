//! # Database Connection Pool Management

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::Instrument;

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};

/// Type alias for the database connection pool
pub type DbPool = PgPool;

/// Create a connection pool and, when enabled, apply embedded migrations.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true)
        .connect(&config.url)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, url = %config.redacted_url(), "Failed to create database pool");
            Error::database(
                err,
                format!("Failed to connect to database: {}", config.redacted_url()),
            )
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_ms = config.connect_timeout().as_millis() as u64,
        "Database connection pool created"
    );

    if config.auto_migrate {
        tracing::info!("Auto-migration enabled, running database migrations");
        run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Apply the migrations embedded from `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|err| {
        tracing::error!(error = %err, "Database migration failed");
        Error::internal(format!("Database migration failed: {}", err))
    })
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .instrument(crate::db_span!("check_connection"))
        .await
        .map_err(|err| Error::database(err, "Database connectivity check failed"))?;
    Ok(())
}
