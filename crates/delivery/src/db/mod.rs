//! Database operations for the delivery `PostgreSQL`.
//!
//! # Database: `copperleaf_delivery`
//!
//! ## Tables (schema `delivery`)
//!
//! - `products` - Downloadable products
//! - `product_files` - Ordered file lists per product (optionally scoped to
//!   a price variant)
//! - `bundle_items` - Bundle membership (bundle product -> constituent)
//! - `orders` - Purchase transactions
//! - `order_items` - Purchased lines
//!
//! # Migrations
//!
//! Migrations are stored in `crates/delivery/migrations/` and run via:
//! ```bash
//! cargo run -p copperleaf-cli -- migrate
//! ```
//!
//! Queries use runtime binding (`sqlx::query`) rather than the `query!`
//! macros so the workspace builds without a live database.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod catalog;
pub mod orders;

pub use catalog::{CatalogRepository, ProductFile};
pub use orders::OrderRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored value could not be mapped back into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
