//! HTTP route handlers for the delivery server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /download       - Verify a signed link and stream the file
//! GET  /health         - Liveness check (wired in main)
//! GET  /health/ready   - Readiness check (wired in main)
//! ```

pub mod download;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the main application router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/download", get(download::download))
}
