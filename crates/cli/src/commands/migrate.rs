//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! copperleaf-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DELIVERY_DATABASE_URL` - `PostgreSQL` connection string for the
//!   delivery database (`DATABASE_URL` is accepted as a fallback)
//!
//! Migration files live in `crates/delivery/migrations/`.

use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run delivery database migrations.
///
/// # Errors
///
/// Returns a `MigrationError` if the database URL is missing, the
/// connection fails, or a migration fails to apply.
pub async fn delivery() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DELIVERY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("DELIVERY_DATABASE_URL"))?;

    tracing::info!("Connecting to delivery database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running delivery migrations...");
    sqlx::migrate!("../delivery/migrations").run(&pool).await?;

    tracing::info!("Delivery migrations complete!");
    Ok(())
}
