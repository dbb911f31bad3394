//! Product management commands.
//!
//! # Usage
//!
//! ```bash
//! petbox-cli product create "Plano Mensal" --plan monthly --price 49.90
//! petbox-cli product list
//! ```
//!
//! The plan kind decides both the product type and the billing cycle, so a
//! product can never carry a cycle that contradicts its type.

use petbox_core::Money;
use petbox_storefront::db::ProductRepository;
use petbox_storefront::models::PlanSelection;

use super::{CommandError, connect};

/// Create a product for the given plan kind.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn create(name: &str, plan: PlanSelection, price: Money) -> Result<(), CommandError> {
    let pool = connect().await?;
    let product = ProductRepository::new(&pool)
        .create(name.trim(), plan.product_type(), price, plan.billing_cycle())
        .await?;

    tracing::info!(
        "Product created: {} ({}, {}), ID: {}",
        product.name,
        plan,
        product.price,
        product.id
    );
    tracing::info!("Link it with: petbox-cli plan link --{} {}", plan_flag(plan), product.id);
    Ok(())
}

/// List all products.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool).list().await?;

    tracing::info!("{} product(s)", products.len());
    for product in products {
        tracing::info!(
            "  {}  {:<24} {:<12} {:<8} {:>12} {}",
            product.id,
            product.name,
            product.product_type.to_string(),
            product
                .billing_cycle
                .map_or_else(|| "-".to_owned(), |cycle| cycle.to_string()),
            product.price.to_string(),
            if product.active { "active" } else { "inactive" }
        );
    }
    Ok(())
}

/// `plan link` flag naming this plan slot.
pub const fn plan_flag(plan: PlanSelection) -> &'static str {
    match plan {
        PlanSelection::Monthly => "monthly",
        PlanSelection::Annual => "annual",
        PlanSelection::OneTime => "one-time",
    }
}
