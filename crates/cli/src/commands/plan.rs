//! Plan configuration commands.
//!
//! # Usage
//!
//! ```bash
//! petbox-cli plan link --monthly <product-id> --annual <product-id>
//! petbox-cli plan show
//! ```
//!
//! Slots not named on the command line keep their current product. The
//! storefront caches the plan configuration for up to a minute.

use petbox_core::ProductId;
use petbox_storefront::db::ProductRepository;
use petbox_storefront::models::{PlanLinks, PlanSelection, Product};

use super::product::plan_flag;
use super::{CommandError, connect};

/// Why `product` cannot back the `plan` slot, if it cannot.
pub fn slot_mismatch(product: &Product, plan: PlanSelection) -> Option<&'static str> {
    if !product.active {
        Some("product is inactive")
    } else if product.product_type != plan.product_type() {
        Some("wrong product type")
    } else if product.billing_cycle != plan.billing_cycle() {
        Some("wrong billing cycle")
    } else {
        None
    }
}

/// Point plan slots at products.
///
/// # Errors
///
/// Returns an error if a product does not exist, does not fit its slot, or
/// the database fails.
pub async fn link(
    monthly: Option<ProductId>,
    annual: Option<ProductId>,
    one_time: Option<ProductId>,
) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let requested = [
        (PlanSelection::Monthly, monthly),
        (PlanSelection::Annual, annual),
        (PlanSelection::OneTime, one_time),
    ];
    for (plan, id) in requested {
        let Some(id) = id else { continue };
        let product = repo
            .get_by_id(id)
            .await?
            .ok_or(CommandError::ProductNotFound(id))?;
        if let Some(reason) = slot_mismatch(&product, plan) {
            return Err(CommandError::PlanMismatch {
                id,
                slot: plan_flag(plan).to_owned(),
                reason,
            });
        }
    }

    let current = repo.plan_links().await?;
    let links = PlanLinks {
        monthly_product_id: monthly.or(current.monthly_product_id),
        annual_product_id: annual.or(current.annual_product_id),
        one_time_product_id: one_time.or(current.one_time_product_id),
    };
    repo.link_plans(&links).await?;

    tracing::info!("Plan configuration updated");
    show_with(&repo).await
}

/// Print the resolved plan configuration.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn show() -> Result<(), CommandError> {
    let pool = connect().await?;
    show_with(&ProductRepository::new(&pool)).await
}

async fn show_with(repo: &ProductRepository<'_>) -> Result<(), CommandError> {
    let plans = repo.load_plan_config().await?;

    for plan in [
        PlanSelection::Monthly,
        PlanSelection::Annual,
        PlanSelection::OneTime,
    ] {
        match plans.product_for(plan) {
            Some(product) => tracing::info!(
                "  {:<9} {} ({}) {}",
                plan_flag(plan),
                product.name,
                product.price,
                product.id
            ),
            None => tracing::info!(
                "  {:<9} not configured, storefront shows the default price",
                plan_flag(plan)
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use petbox_core::{BillingCycle, Money, ProductType};

    use super::*;

    fn product(product_type: ProductType, billing_cycle: Option<BillingCycle>) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Box".to_owned(),
            product_type,
            price: Money::from_cents(4990),
            billing_cycle,
            active: true,
        }
    }

    #[test]
    fn test_matching_slots() {
        let monthly = product(ProductType::Subscription, Some(BillingCycle::Monthly));
        assert_eq!(slot_mismatch(&monthly, PlanSelection::Monthly), None);

        let one_time = product(ProductType::OneTime, None);
        assert_eq!(slot_mismatch(&one_time, PlanSelection::OneTime), None);
    }

    #[test]
    fn test_mismatched_slots() {
        let monthly = product(ProductType::Subscription, Some(BillingCycle::Monthly));
        assert_eq!(
            slot_mismatch(&monthly, PlanSelection::Annual),
            Some("wrong billing cycle")
        );
        assert_eq!(
            slot_mismatch(&monthly, PlanSelection::OneTime),
            Some("wrong product type")
        );

        let mut inactive = product(ProductType::OneTime, None);
        inactive.active = false;
        assert_eq!(
            slot_mismatch(&inactive, PlanSelection::OneTime),
            Some("product is inactive")
        );
    }
}
