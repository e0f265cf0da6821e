//! Order-store seam.

use std::future::Future;

use crate::types::{Order, OrderId};

/// Error surfaced by an order store.
///
/// Callers must collapse this to a plain deny: on the wire, an unreachable
/// store and a missing order are indistinguishable.
#[derive(thiserror::Error, Debug)]
#[error("order store error: {0}")]
pub struct StoreError(pub String);

/// Source of orders for access evaluation.
///
/// The core never performs the lookup itself; the delivery server backs
/// this with `PostgreSQL`, tests with in-memory fixtures.
pub trait OrderStore: Send + Sync {
    /// Load an order by ID.
    fn find_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;
}
