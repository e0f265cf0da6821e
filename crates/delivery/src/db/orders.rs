//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use copperleaf_core::download::{OrderStore, StoreError};
use copperleaf_core::{
    CurrencyCode, Email, ItemStatus, Order, OrderId, OrderItem, OrderItemId, OrderStatus,
    PriceVariantId, Price, ProductId, PurchaseKey,
};

use super::RepositoryError;

/// Repository for order reads.
///
/// The delivery server never writes orders; checkout lives elsewhere.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status, email,
    /// or purchase key does not parse.
    pub async fn load_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, status, email, purchase_key, placed_at
            FROM delivery.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        let email: Email = row.try_get("email")?;

        let purchase_key: String = row.try_get("purchase_key")?;
        let purchase_key = PurchaseKey::parse(&purchase_key).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid purchase key in database: {e}"))
        })?;

        let placed_at: DateTime<Utc> = row.try_get("placed_at")?;

        let items = self.find_items(id).await?;

        Ok(Some(Order {
            id,
            status,
            email,
            purchase_key,
            items,
            placed_at,
        }))
    }

    /// Line items of an order, in insertion order.
    async fn find_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, product_id, price_variant_id, status, quantity, total, currency
            FROM delivery.order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                let status = status
                    .parse::<ItemStatus>()
                    .map_err(RepositoryError::DataCorruption)?;

                let quantity: i32 = row.try_get("quantity")?;
                let quantity = u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "negative quantity on order item: {quantity}"
                    ))
                })?;

                let amount: Decimal = row.try_get("total")?;
                let currency: String = row.try_get("currency")?;
                let currency = currency
                    .parse::<CurrencyCode>()
                    .map_err(RepositoryError::DataCorruption)?;

                Ok(OrderItem {
                    id: row.try_get::<OrderItemId, _>("id")?,
                    product_id: row.try_get::<ProductId, _>("product_id")?,
                    price_variant_id: row.try_get::<Option<PriceVariantId>, _>("price_variant_id")?,
                    status,
                    quantity,
                    total: Price::new(amount, currency),
                })
            })
            .collect()
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.load_order(id).await.map_err(|e| StoreError(e.to_string()))
    }
}
