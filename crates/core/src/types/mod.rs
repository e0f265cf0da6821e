//! Core types for Copperleaf.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod purchase_key;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem};
pub use price::{CurrencyCode, Price};
pub use purchase_key::{PurchaseKey, PurchaseKeyError};
pub use status::*;
