//! CLI command implementations.

pub mod coupon;
pub mod migrate;
pub mod plan;
pub mod product;
pub mod seed;

use petbox_core::ProductId;
use petbox_storefront::db::{self, RepositoryError};
use petbox_storefront::models::NewCouponError;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Coupon definition rejected.
    #[error("Invalid coupon: {0}")]
    InvalidCoupon(#[from] NewCouponError),

    /// Product id does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product cannot back the requested plan slot.
    #[error("Product {id} cannot be linked as {slot}: {reason}")]
    PlanMismatch {
        id: ProductId,
        slot: String,
        reason: &'static str,
    },

    /// Seed file could not be read.
    #[error("Seed file error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for the catalog format.
    #[error("Seed file format error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed file failed validation.
    #[error("{0} validation errors found")]
    InvalidSeed(usize),
}

/// Connect to the storefront database.
///
/// Reads `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
