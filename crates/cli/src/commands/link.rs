//! Mint signed download links from the command line.
//!
//! # Usage
//!
//! ```bash
//! copperleaf-cli link --order 101 --product 10 --price-id 2 --file-key 0
//! ```
//!
//! Loads the order, signs a download request bound to its buyer, and
//! prints the resulting URL. The server will still run the full access
//! evaluation when the link is used; minting does not bypass it.
//!
//! # Environment Variables
//!
//! Uses the delivery server's configuration: `DELIVERY_DATABASE_URL`,
//! `DELIVERY_BASE_URL`, `DELIVERY_SIGNING_SECRET`, `DELIVERY_FILES_DIR`,
//! and optionally `DELIVERY_LINK_TTL_SECS`.

use secrecy::ExposeSecret;
use thiserror::Error;

use copperleaf_core::download::{DownloadRequest, DownloadRequestError, OrderStore as _, StoreError};
use copperleaf_core::{FileKey, OrderId, PriceVariantId, ProductId};
use copperleaf_delivery::config::{ConfigError, DeliveryConfig};
use copperleaf_delivery::db::{self, OrderRepository};
use copperleaf_delivery::signed_url;

/// Errors that can occur while minting a link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Delivery configuration failed to load.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Pool(#[from] sqlx::Error),

    /// Order lookup failed.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),

    /// No order with the given ID.
    #[error("Order not found: {0}")]
    OrderNotFound(i32),

    /// The request descriptor could not be built.
    #[error("Invalid request: {0}")]
    Request(#[from] DownloadRequestError),

    /// The configured base URL did not parse.
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Mint a signed download link for an order.
///
/// # Errors
///
/// Returns a `LinkError` if configuration is incomplete, the order does
/// not exist, or the URL cannot be built.
pub async fn mint(
    order_id: i32,
    product_id: i32,
    price_id: Option<i32>,
    file_key: u32,
    ttl_secs: Option<i64>,
) -> Result<(), LinkError> {
    dotenvy::dotenv().ok();

    let config = DeliveryConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    let order = OrderRepository::new(&pool)
        .find_order(OrderId::new(order_id))
        .await?
        .ok_or(LinkError::OrderNotFound(order_id))?;

    let product_id = ProductId::new(product_id);
    let price_variant_id = price_id.map(PriceVariantId::new);

    // A missing direct line is not fatal: the product may be reachable
    // through a bundle on this order. The server decides when the link
    // is used.
    if order.find_item(product_id, price_variant_id).is_none() {
        tracing::warn!(
            order_id = %order.id,
            product_id = %product_id,
            "order has no direct line for this product; bundle access may still apply"
        );
    }

    let ttl = ttl_secs.map_or(config.link_ttl, chrono::Duration::seconds);
    let expires_at = chrono::Utc::now() + ttl;

    let request = DownloadRequest::new(
        order.id,
        order.email.clone(),
        product_id,
        price_variant_id,
        FileKey::new(file_key),
        expires_at,
        order.purchase_key.clone(),
        signed_url::fresh_nonce(),
    )?;

    let url = signed_url::signed_download_url(
        &config.base_url,
        &request,
        config.signing_secret.expose_secret().as_bytes(),
    )?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order {} ({}) - {}", order.id, order.email, order.status);
        for item in &order.items {
            println!(
                "  line {}: product {} x{} - {}",
                item.id, item.product_id, item.quantity, item.total
            );
        }
        println!("Link expires at {}", expires_at.to_rfc3339());
        println!("{url}");
    }

    Ok(())
}
