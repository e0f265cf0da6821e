//! Ordered access-policy predicates.
//!
//! Deployments extend the base order/item gates with an explicit, ordered
//! list of predicates instead of runtime hook rewiring. Each policy sees the
//! line item that would grant access and votes allow, deny, or abstain;
//! policies run in registration order and any deny wins.

use crate::types::{Order, OrderItem, PriceVariantId, ProductId};

/// A single policy's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Explicitly in favor. Does not override a later deny.
    Allow,
    /// Veto: access is denied regardless of other policies.
    Deny,
    /// No opinion.
    Abstain,
}

/// What a policy gets to look at.
///
/// `item` is the line item that passed the base gates - for bundled
/// products that is the bundle line, not the sub-product.
#[derive(Debug)]
pub struct PolicyContext<'a> {
    pub order: &'a Order,
    pub item: &'a OrderItem,
    /// The product whose files were requested.
    pub product_id: ProductId,
    pub price_variant_id: Option<PriceVariantId>,
}

/// An access-policy predicate.
pub trait AccessPolicy: Send + Sync {
    /// Stable name, used in deny logs.
    fn name(&self) -> &str;

    /// Vote on the request.
    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision;
}

/// Adapter turning a closure into an [`AccessPolicy`].
pub struct PolicyFn<F> {
    name: String,
    f: F,
}

impl<F> PolicyFn<F>
where
    F: Fn(&PolicyContext<'_>) -> PolicyDecision + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> AccessPolicy for PolicyFn<F>
where
    F: Fn(&PolicyContext<'_>) -> PolicyDecision + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> PolicyDecision {
        (self.f)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_fn_adapts_closure() {
        let policy = PolicyFn::new("always-deny", |_ctx: &PolicyContext<'_>| {
            PolicyDecision::Deny
        });
        assert_eq!(policy.name(), "always-deny");
    }
}
