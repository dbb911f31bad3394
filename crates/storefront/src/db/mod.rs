//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `petbox`
//!
//! ## Tables
//!
//! - `customer` - Customers, unique by phone
//! - `address` - Delivery addresses
//! - `pet` - Pet profiles
//! - `product` - Sellable products
//! - `coupon` - Discount coupons
//! - `setting` - Key/value JSON settings (`plan_products`)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p petbox-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Services depend on the [`CustomerStore`], [`CouponStore`] and
//! [`ProductCatalog`] traits. The `PostgreSQL` repositories implement them for
//! production; [`memory::MemoryStore`] implements them for tests.

pub mod coupons;
pub mod customers;
pub mod memory;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use petbox_core::CustomerId;

use crate::models::{
    Coupon, CouponCode, Customer, CustomerLookup, NewOnboarding, OnboardingRecord, PlanConfig,
};

pub use coupons::CouponRepository;
pub use customers::CustomerRepository;
pub use products::{CachedPlanCatalog, ProductRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate coupon code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Customer lookups and the onboarding write.
#[allow(async_fn_in_trait)]
pub trait CustomerStore: Send + Sync {
    /// First customer matching `lookup`, by creation order.
    async fn find_customer(
        &self,
        lookup: &CustomerLookup,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Write customer (if new), address and pet atomically.
    ///
    /// A new customer whose phone already exists reuses the existing row.
    async fn create_onboarding(
        &self,
        onboarding: &NewOnboarding,
    ) -> Result<OnboardingRecord, RepositoryError>;

    /// Record the billing provider id on a customer.
    async fn set_billing_customer_id(
        &self,
        id: CustomerId,
        billing_customer_id: &str,
    ) -> Result<(), RepositoryError>;
}

/// Coupon lookups.
#[allow(async_fn_in_trait)]
pub trait CouponStore: Send + Sync {
    /// Coupon with exactly this (normalized) code.
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>, RepositoryError>;
}

/// Plan configuration.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog: Send + Sync {
    /// Products currently linked to the plan page. Inactive or missing
    /// products leave their slot empty.
    async fn plan_config(&self) -> Result<PlanConfig, RepositoryError>;
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
