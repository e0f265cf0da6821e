//! Integration tests for Copperleaf.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p copperleaf-cli -- migrate
//!
//! # Start the delivery server
//! cargo run -p copperleaf-delivery
//!
//! # Run integration tests (ignored by default)
//! cargo test -p copperleaf-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `download_flow` - End-to-end signed link verification against a
//!   running delivery server and database
//!
//! Tests are `#[ignore]`d because they need a live server, a seeded
//! database, and `DELIVERY_SIGNING_SECRET` matching the server's.
