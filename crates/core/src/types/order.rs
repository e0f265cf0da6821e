//! Order and line-item models.
//!
//! The core only ever reads orders; mutation lives with the order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{OrderId, OrderItemId, PriceVariantId, ProductId};
use super::price::Price;
use super::purchase_key::PurchaseKey;
use super::status::{ItemStatus, OrderStatus};

/// A purchase transaction containing one or more line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Buyer email at time of purchase.
    pub email: Email,
    /// Opaque key issued at checkout, folded into signed download tokens.
    pub purchase_key: PurchaseKey,
    pub items: Vec<OrderItem>,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Find the line item matching a product and, when requested, an exact
    /// price variant.
    ///
    /// A `price_variant_id` of `None` matches only items purchased without
    /// a variant; `Some` matches only that exact variant. There is no
    /// fallback to "any variant of the product".
    #[must_use]
    pub fn find_item(
        &self,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
    ) -> Option<&OrderItem> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id && item.price_variant_id == price_variant_id)
    }
}

/// One purchased line within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    /// `None` for single-price products.
    pub price_variant_id: Option<PriceVariantId>,
    /// Overrides the order status when not [`ItemStatus::Inherit`].
    pub status: ItemStatus,
    pub quantity: u32,
    pub total: Price,
}

impl OrderItem {
    /// The status that governs this item, resolving [`ItemStatus::Inherit`]
    /// against the order's overall status.
    #[must_use]
    pub fn effective_status(&self, order_status: OrderStatus) -> ItemStatus {
        match self.status {
            ItemStatus::Inherit => match order_status {
                // Processing orders have been paid; their items are live.
                OrderStatus::Complete
                | OrderStatus::Processing
                | OrderStatus::PartiallyRefunded => ItemStatus::Complete,
                OrderStatus::Refunded => ItemStatus::Refunded,
                OrderStatus::Pending | OrderStatus::Failed | OrderStatus::Abandoned => {
                    ItemStatus::Pending
                }
            },
            explicit => explicit,
        }
    }
}
