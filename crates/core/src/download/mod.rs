//! Signed download tokens and access evaluation.
//!
//! A download link is authorized in two independent steps:
//!
//! 1. **Token check** ([`token`]): the URL's query parameters reconstruct a
//!    [`DownloadRequest`]; its HMAC-SHA256 signature is re-derived from the
//!    signing secret and compared in constant time, and the embedded expiry
//!    is checked against the clock. This proves the link was minted by us
//!    and has not been tampered with.
//! 2. **Access check ([`access`])**: the referenced order is loaded and the
//!    evaluator decides whether the specific line item still grants access
//!    (order-level gate first, then item-level status, then any configured
//!    policies).
//!
//! Both steps are pure functions of their inputs; all I/O (order lookup,
//! catalog lookup, file streaming) stays with the caller. Every failure
//! mode collapses to a plain deny so the response cannot be used as an
//! oracle for valid order IDs or catalog shape.

pub mod access;
pub mod catalog;
pub mod clock;
pub mod policy;
pub mod request;
pub mod secret;
pub mod store;
pub mod token;

pub use access::{AccessConfig, AccessDecision, AccessEvaluator, DenyReason};
pub use catalog::{Catalog, StaticCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use policy::{AccessPolicy, PolicyContext, PolicyDecision, PolicyFn};
pub use request::{DownloadRequest, DownloadRequestError};
pub use secret::{SecretProvider, StaticSecret};
pub use store::{OrderStore, StoreError};
pub use token::{SignedToken, TokenError};
