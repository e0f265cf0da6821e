//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every access failure -
//! whatever actually went wrong - maps to the same 403 response so the
//! download endpoint cannot be used as an oracle for valid order IDs,
//! purchased products, or catalog shape. The real reason is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use copperleaf_core::download::DenyReason;

use crate::db::RepositoryError;

/// Application-level error type for the delivery server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed outside the access decision path.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Access denied. Carries the internal reason for logging only.
    #[error("Access denied: {0}")]
    AccessDenied(DenyReason),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build the uniform denial for a reason, logging it first.
    ///
    /// `tracing::info` rather than `warn`: expired links and stale
    /// bookmarks are routine traffic, not incidents.
    #[must_use]
    pub fn deny(reason: DenyReason) -> Self {
        tracing::info!(reason = %reason, "download denied");
        Self::AccessDenied(reason)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
        };

        // Don't expose internal error details to clients. Every denial is
        // byte-identical on purpose.
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error",
            Self::AccessDenied(_) => "Access denied",
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
