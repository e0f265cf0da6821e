//! The access evaluator: does this order still grant these files?
//!
//! Access is a two-level check. The order's overall status gates first (an
//! order that never finalized grants nothing, whatever its items claim),
//! then the specific line item's own status decides. Getting the second
//! level wrong is the classic bug: a partial refund leaves the order
//! looking complete while one line is dead.

use std::collections::HashSet;

use crate::types::{ItemStatus, Order, OrderItem, OrderStatus, PriceVariantId, ProductId};

use super::catalog::Catalog;
use super::policy::{AccessPolicy, PolicyContext, PolicyDecision};

/// Why access was denied.
///
/// Logged internally via `tracing`, never sent to clients: every deny is
/// the same 403 so the reason cannot be used to probe for valid order IDs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The request could not be reconstructed from its wire form.
    #[error("malformed request")]
    MalformedRequest,
    /// The token expired.
    #[error("token expired")]
    ExpiredToken,
    /// The token signature did not match.
    #[error("signature mismatch")]
    SignatureMismatch,
    /// No order with the referenced ID (or the store was unreachable,
    /// which callers must collapse to the same reason).
    #[error("order not found")]
    OrderNotFound,
    /// No line item matches the product and exact price variant.
    #[error("no matching order item")]
    ItemNotFound,
    /// The order's overall status denies downloads.
    #[error("order status {0} denies downloads")]
    OrderNotDeliverable(OrderStatus),
    /// Every matching line item's status denies downloads.
    #[error("item status {0} denies downloads")]
    ItemNotDeliverable(ItemStatus),
    /// A configured policy vetoed the request.
    #[error("denied by policy {0}")]
    Policy(String),
    /// The file key does not index a real file.
    #[error("file key out of range")]
    FileNotFound,
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Site-wide access settings, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Order statuses that deny downloads outright, regardless of item
    /// status.
    pub denying_order_statuses: HashSet<OrderStatus>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            denying_order_statuses: HashSet::from([
                OrderStatus::Pending,
                OrderStatus::Failed,
                OrderStatus::Abandoned,
            ]),
        }
    }
}

/// Decides whether an order grants access to a product's files.
///
/// Stateless per call: safe to share across request handlers.
pub struct AccessEvaluator {
    config: AccessConfig,
    policies: Vec<Box<dyn AccessPolicy>>,
}

impl AccessEvaluator {
    #[must_use]
    pub fn new(config: AccessConfig) -> Self {
        Self {
            config,
            policies: Vec::new(),
        }
    }

    /// Append a policy to the chain. Policies run in registration order;
    /// any deny wins.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn AccessPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    /// Evaluate access with a reason code for logging.
    #[must_use]
    pub fn evaluate(
        &self,
        order: &Order,
        catalog: &dyn Catalog,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
    ) -> AccessDecision {
        let candidates = candidate_items(order, catalog, product_id, price_variant_id);

        if candidates.is_empty() {
            return AccessDecision::Denied(DenyReason::ItemNotFound);
        }

        // Order-level gate first: a non-finalized order grants nothing,
        // even when an item claims to be complete.
        if self.config.denying_order_statuses.contains(&order.status) {
            return AccessDecision::Denied(DenyReason::OrderNotDeliverable(order.status));
        }

        // Item-level gate: the first candidate whose own status is live
        // carries the request. A refunded line stays dead inside an
        // otherwise-complete order.
        let mut last_item_status = ItemStatus::Pending;
        let mut granting: Option<&OrderItem> = None;
        for &item in &candidates {
            let status = item.effective_status(order.status);
            if status == ItemStatus::Complete {
                granting = Some(item);
                break;
            }
            last_item_status = status;
        }

        let Some(item) = granting else {
            return AccessDecision::Denied(DenyReason::ItemNotDeliverable(last_item_status));
        };

        // Configured policies, in order; any deny wins.
        let ctx = PolicyContext {
            order,
            item,
            product_id,
            price_variant_id,
        };
        for policy in &self.policies {
            if policy.evaluate(&ctx) == PolicyDecision::Deny {
                return AccessDecision::Denied(DenyReason::Policy(policy.name().to_owned()));
            }
        }

        AccessDecision::Granted
    }

    /// Evaluate access as a plain boolean.
    #[must_use]
    pub fn grants_access(
        &self,
        order: &Order,
        catalog: &dyn Catalog,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
    ) -> bool {
        self.evaluate(order, catalog, product_id, price_variant_id)
            .is_granted()
    }
}

/// Line items that could carry a request: the exact direct match, plus any
/// bundle line whose contents include the product.
///
/// The exact-variant rule applies to the direct path only - the requested
/// variant must equal the purchased line's variant, with no fallback. On
/// the bundle path the purchased variant merely priced the bundle; access
/// to a sub-product is decided by the catalog's contents list alone. An
/// unrelated line elsewhere in the order never unlocks a bundled product.
fn candidate_items<'a>(
    order: &'a Order,
    catalog: &dyn Catalog,
    product_id: ProductId,
    price_variant_id: Option<PriceVariantId>,
) -> Vec<&'a OrderItem> {
    let mut candidates: Vec<&OrderItem> = Vec::new();

    if let Some(direct) = order.find_item(product_id, price_variant_id) {
        candidates.push(direct);
    }

    for item in &order.items {
        if item.product_id == product_id {
            continue;
        }
        let is_containing_bundle = catalog
            .bundle_contents(item.product_id)
            .is_some_and(|contents| contents.contains(&product_id));
        if is_containing_bundle {
            candidates.push(item);
        }
    }

    candidates
}

impl std::fmt::Debug for AccessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEvaluator")
            .field("config", &self.config)
            .field(
                "policies",
                &self.policies.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
