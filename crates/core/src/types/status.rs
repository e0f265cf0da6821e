//! Status enums for orders and order items.
//!
//! Statuses are stored as `snake_case` text in Postgres and round-trip
//! through `Display`/`FromStr`. Which statuses deny downloads is a policy
//! decision carried by `AccessConfig`, not by the enums themselves.

use serde::{Deserialize, Serialize};

/// Overall order status.
///
/// An order moves `pending -> processing -> complete`, and may later move
/// to `refunded` or `partially_refunded`. `failed` and `abandoned` are
/// terminal states for orders that never finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Refunded,
    PartiallyRefunded,
    Failed,
    Abandoned,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Refunded => "refunded",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "complete" => Ok(Self::Complete),
            "refunded" => Ok(Self::Refunded),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "failed" => Ok(Self::Failed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Per-line-item status.
///
/// `Inherit` defers to the order's overall status; the other variants
/// override it. A partial refund leaves the order `partially_refunded`
/// while marking only the refunded line `refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Inherit,
    Pending,
    Complete,
    Refunded,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inherit => "inherit",
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inherit" => Ok(Self::Inherit),
            "pending" => Ok(Self::Pending),
            "complete" => Ok(Self::Complete),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid item status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Complete,
            OrderStatus::Refunded,
            OrderStatus::PartiallyRefunded,
            OrderStatus::Failed,
            OrderStatus::Abandoned,
        ] {
            let parsed = OrderStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_item_status_roundtrip() {
        for status in [
            ItemStatus::Inherit,
            ItemStatus::Pending,
            ItemStatus::Complete,
            ItemStatus::Refunded,
        ] {
            let parsed = ItemStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!(OrderStatus::from_str("publish").is_err());
        assert!(ItemStatus::from_str("").is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PartiallyRefunded).unwrap();
        assert_eq!(json, "\"partially_refunded\"");
    }
}
