//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::CachedPlanCatalog;
use crate::services::billing::{BillingClient, BillingError};
use crate::services::postal_code::{PostalCodeClient, PostalCodeError};

/// Error building the outbound service clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("billing client: {0}")]
    Billing(#[from] BillingError),
    #[error("postal code client: {0}")]
    PostalCode(#[from] PostalCodeError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    billing: BillingClient,
    postal_codes: PostalCodeClient,
    plans: CachedPlanCatalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let billing = BillingClient::new(&config.billing)?;
        let postal_codes = PostalCodeClient::new(config.postal_code_api_url.clone())?;
        let plans = CachedPlanCatalog::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                billing,
                postal_codes,
                plans,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the billing provider client.
    #[must_use]
    pub fn billing(&self) -> &BillingClient {
        &self.inner.billing
    }

    /// Get a reference to the CEP lookup client.
    #[must_use]
    pub fn postal_codes(&self) -> &PostalCodeClient {
        &self.inner.postal_codes
    }

    /// Get a reference to the cached plan catalog.
    #[must_use]
    pub fn plans(&self) -> &CachedPlanCatalog {
        &self.inner.plans
    }
}
