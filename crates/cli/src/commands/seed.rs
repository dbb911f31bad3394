//! Seed the catalog from a YAML file.
//!
//! Reads products and coupons, validates the whole file before touching the
//! database, then inserts them. Coupons whose code already exists are
//! skipped, and products marked `link: true` become the plan configuration.
//!
//! ```yaml
//! products:
//!   - name: Plano Mensal
//!     plan: monthly
//!     price: "49.90"
//!     link: true
//! coupons:
//!   - code: BEMVINDO10
//!     discount_type: percentage
//!     discount_value: "10"
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use petbox_core::{DiscountType, Money};
use petbox_storefront::db::{CouponRepository, ProductRepository, RepositoryError};
use petbox_storefront::models::{CouponCode, NewCoupon, PlanLinks, PlanSelection};

use super::{CommandError, connect};

/// Seed file contents.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub coupons: Vec<CouponSeed>,
}

/// One product to insert.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub plan: PlanSelection,
    pub price: Money,
    /// Use this product for its plan slot.
    #[serde(default)]
    pub link: bool,
}

/// One coupon to insert.
#[derive(Debug, Deserialize)]
pub struct CouponSeed {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub max_uses: Option<i32>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl CouponSeed {
    fn to_new_coupon(&self) -> Result<NewCoupon, CommandError> {
        Ok(NewCoupon::new(
            &self.code,
            self.discount_type,
            self.discount_value,
            self.max_uses,
            self.valid_until,
        )?)
    }
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub products: usize,
    pub coupons: usize,
    pub coupons_skipped: usize,
    pub plans_linked: usize,
}

/// Check a catalog, returning one message per problem.
pub fn validate(catalog: &Catalog) -> Vec<String> {
    let mut errors = Vec::new();

    let mut linked = HashSet::new();
    for (i, product) in catalog.products.iter().enumerate() {
        if product.name.trim().is_empty() {
            errors.push(format!("products[{i}]: name is required"));
        }
        if product.price <= Money::ZERO {
            errors.push(format!("products[{i}]: price must be positive"));
        }
        if product.link && !linked.insert(product.plan) {
            errors.push(format!(
                "products[{i}]: more than one product linked as {}",
                product.plan
            ));
        }
    }

    let mut codes = HashSet::new();
    for (i, coupon) in catalog.coupons.iter().enumerate() {
        if let Err(e) = coupon.to_new_coupon() {
            errors.push(format!("coupons[{i}]: {e}"));
        }
        if let Some(code) = CouponCode::normalize(&coupon.code)
            && !codes.insert(code.clone())
        {
            errors.push(format!("coupons[{i}]: duplicate code {code}"));
        }
    }

    errors
}

/// Seed the catalog in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;
    info!(
        products = catalog.products.len(),
        coupons = catalog.coupons.len(),
        "Parsed catalog"
    );

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    let pool = connect().await?;
    let products = ProductRepository::new(&pool);
    let coupons = CouponRepository::new(&pool);
    let mut summary = SeedSummary::default();

    let mut links = products.plan_links().await?;
    for seed in &catalog.products {
        let product = products
            .create(
                seed.name.trim(),
                seed.plan.product_type(),
                seed.price,
                seed.plan.billing_cycle(),
            )
            .await?;
        summary.products += 1;

        if seed.link {
            let slot = match seed.plan {
                PlanSelection::Monthly => &mut links.monthly_product_id,
                PlanSelection::Annual => &mut links.annual_product_id,
                PlanSelection::OneTime => &mut links.one_time_product_id,
            };
            *slot = Some(product.id);
            summary.plans_linked += 1;
        }
    }
    if summary.plans_linked > 0 {
        products.link_plans(&links).await?;
    }

    for seed in &catalog.coupons {
        match coupons.create(&seed.to_new_coupon()?).await {
            Ok(_) => summary.coupons += 1,
            Err(RepositoryError::Conflict(_)) => {
                info!(code = %seed.code, "Coupon already exists, skipping");
                summary.coupons_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.products);
    info!("  Plans linked: {}", summary.plans_linked);
    info!("  Coupons inserted: {}", summary.coupons);
    info!("  Coupons skipped (already exist): {}", summary.coupons_skipped);

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog: Catalog =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        assert_eq!(catalog.products.len(), 3);
        assert_eq!(catalog.coupons.len(), 3);
        assert!(validate(&catalog).is_empty());

        let monthly = catalog.products.first().unwrap();
        assert_eq!(monthly.plan, PlanSelection::Monthly);
        assert_eq!(monthly.price, Money::from_cents(4990));
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let yaml = r#"
products:
  - name: " "
    plan: monthly
    price: "0"
    link: true
  - name: Outro Mensal
    plan: monthly
    price: "59.90"
    link: true
coupons:
  - code: save10
    discount_type: percentage
    discount_value: "150"
  - code: " SAVE10 "
    discount_type: fixed
    discount_value: "10"
"#;
        let catalog: Catalog = serde_yaml::from_str(yaml).unwrap();
        let errors = validate(&catalog);

        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("name is required")));
        assert!(errors.iter().any(|e| e.contains("more than one product linked")));
        assert!(errors.iter().any(|e| e.contains("cannot exceed 100")));
        assert!(errors.iter().any(|e| e.contains("duplicate code SAVE10")));
    }

    #[test]
    fn test_unknown_plan_is_a_parse_error() {
        let yaml = "products:\n  - name: X\n    plan: weekly\n    price: \"1\"\n";
        assert!(serde_yaml::from_str::<Catalog>(yaml).is_err());
    }
}
