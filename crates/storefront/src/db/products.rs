//! Product repository and the cached plan catalog.
//!
//! The plan page reads the `plan_products` setting, which names the product
//! behind each plan slot. [`CachedPlanCatalog`] keeps the resolved
//! [`PlanConfig`] in memory for one minute.

use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, instrument};
use uuid::Uuid;

use petbox_core::{BillingCycle, Money, ProductId, ProductType};

use super::{ProductCatalog, RepositoryError};
use crate::models::{PlanConfig, PlanLinks, Product};

/// Settings key holding the plan product ids.
pub const PLAN_PRODUCTS_KEY: &str = "plan_products";

const PLAN_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    product_type: ProductType,
    price: Decimal,
    billing_cycle: Option<BillingCycle>,
    active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            product_type: row.product_type,
            price: Money::new(row.price),
            billing_cycle: row.billing_cycle,
            active: row.active,
        }
    }
}

/// Repository for product and plan settings.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including
    /// when the billing cycle does not match the product type.
    pub async fn create(
        &self,
        name: &str,
        product_type: ProductType,
        price: Money,
        billing_cycle: Option<BillingCycle>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO petbox.product (name, product_type, price, billing_cycle)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, product_type, price, billing_cycle, active
            ",
        )
        .bind(name)
        .bind(product_type)
        .bind(price.amount())
        .bind(billing_cycle)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// List all products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, product_type, price, billing_cycle, active
            FROM petbox.product
            ORDER BY created_at
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, product_type, price, billing_cycle, active
            FROM petbox.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Read the `plan_products` setting. A missing row means no links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON is malformed.
    pub async fn plan_links(&self) -> Result<PlanLinks, RepositoryError> {
        let value: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT value FROM petbox.setting WHERE key = $1")
                .bind(PLAN_PRODUCTS_KEY)
                .fetch_optional(self.pool)
                .await?;

        value.map_or_else(
            || Ok(PlanLinks::default()),
            |v| {
                serde_json::from_value(v).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid {PLAN_PRODUCTS_KEY}: {e}"))
                })
            },
        )
    }

    /// Replace the `plan_products` setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn link_plans(&self, links: &PlanLinks) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO petbox.setting (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            ",
        )
        .bind(PLAN_PRODUCTS_KEY)
        .bind(Json(links))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resolve the plan links into active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the setting is malformed.
    pub async fn load_plan_config(&self) -> Result<PlanConfig, RepositoryError> {
        let links = self.plan_links().await?;
        let ids: Vec<Uuid> = [
            links.monthly_product_id,
            links.annual_product_id,
            links.one_time_product_id,
        ]
        .into_iter()
        .flatten()
        .map(|id| id.as_uuid())
        .collect();

        if ids.is_empty() {
            return Ok(PlanConfig::default());
        }

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, product_type, price, billing_cycle, active
            FROM petbox.product
            WHERE id = ANY($1) AND active
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let products: Vec<Product> = rows.into_iter().map(Product::from).collect();
        Ok(resolve_plans(&links, &products))
    }
}

/// Place `products` into the slots named by `links`.
#[must_use]
pub fn resolve_plans(links: &PlanLinks, products: &[Product]) -> PlanConfig {
    let find = |id: Option<ProductId>| {
        id.and_then(|id| products.iter().find(|p| p.id == id && p.active).cloned())
    };

    PlanConfig {
        monthly: find(links.monthly_product_id),
        annual: find(links.annual_product_id),
        one_time: find(links.one_time_product_id),
    }
}

/// [`ProductCatalog`] over `PostgreSQL` with a short-lived in-memory cache.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct CachedPlanCatalog {
    pool: PgPool,
    cache: Cache<&'static str, PlanConfig>,
}

impl CachedPlanCatalog {
    /// Create a catalog backed by `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(PLAN_CACHE_TTL)
            .build();
        Self { pool, cache }
    }
}

impl ProductCatalog for CachedPlanCatalog {
    #[instrument(skip(self))]
    async fn plan_config(&self) -> Result<PlanConfig, RepositoryError> {
        if let Some(config) = self.cache.get(PLAN_PRODUCTS_KEY).await {
            debug!("Cache hit for plan config");
            return Ok(config);
        }

        let config = ProductRepository::new(&self.pool)
            .load_plan_config()
            .await?;
        self.cache.insert(PLAN_PRODUCTS_KEY, config.clone()).await;
        Ok(config)
    }
}

impl ProductCatalog for ProductRepository<'_> {
    async fn plan_config(&self) -> Result<PlanConfig, RepositoryError> {
        self.load_plan_config().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(product_type: ProductType, cents: i64, active: bool) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Box".to_owned(),
            product_type,
            price: Money::from_cents(cents),
            billing_cycle: None,
            active,
        }
    }

    #[test]
    fn test_resolve_plans_fills_linked_slots() {
        let monthly = product(ProductType::Subscription, 4990, true);
        let one_time = product(ProductType::OneTime, 8990, true);
        let links = PlanLinks {
            monthly_product_id: Some(monthly.id),
            annual_product_id: None,
            one_time_product_id: Some(one_time.id),
        };

        let config = resolve_plans(&links, &[monthly.clone(), one_time.clone()]);
        assert_eq!(config.monthly, Some(monthly));
        assert_eq!(config.annual, None);
        assert_eq!(config.one_time, Some(one_time));
    }

    #[test]
    fn test_resolve_plans_skips_inactive_and_unknown() {
        let inactive = product(ProductType::Subscription, 4990, false);
        let links = PlanLinks {
            monthly_product_id: Some(inactive.id),
            annual_product_id: Some(ProductId::generate()),
            one_time_product_id: None,
        };

        assert_eq!(resolve_plans(&links, &[inactive]), PlanConfig::default());
    }
}
