//! Copperleaf Core - Shared types and the download-access domain.
//!
//! This crate provides the types and pure logic used across all Copperleaf
//! components:
//! - `delivery` - Signed-URL download server
//! - `cli` - Command-line tools for migrations and link minting
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and pure functions - no I/O,
//! no database access, no HTTP. Token signing and access evaluation are
//! deterministic functions of their inputs plus a clock and a secret, so
//! they are safe to call from any number of request handlers without
//! coordination.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, prices, and the
//!   order model
//! - [`download`] - Signed download tokens and the access evaluator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod download;
pub mod types;

pub use types::*;
