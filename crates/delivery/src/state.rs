//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use copperleaf_core::download::{
    AccessConfig, AccessEvaluator, Clock, SecretProvider, StaticSecret, SystemClock,
};

use crate::config::DeliveryConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DeliveryConfig,
    pool: PgPool,
    evaluator: AccessEvaluator,
    secret: StaticSecret,
    clock: SystemClock,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The evaluator is built once here; per-deployment policies would be
    /// appended at this point.
    #[must_use]
    pub fn new(config: DeliveryConfig, pool: PgPool) -> Self {
        let evaluator = AccessEvaluator::new(AccessConfig::default());
        let secret = StaticSecret::new(config.signing_secret.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                evaluator,
                secret,
                clock: SystemClock,
            }),
        }
    }

    /// Get a reference to the delivery configuration.
    #[must_use]
    pub fn config(&self) -> &DeliveryConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the access evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.inner.evaluator
    }

    /// Get a reference to the signing-secret provider.
    #[must_use]
    pub fn secret(&self) -> &dyn SecretProvider {
        &self.inner.secret
    }

    /// Get a reference to the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        &self.inner.clock
    }
}
