//! Integration tests for PetBox.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process flow tests (no services needed)
//! cargo test -p petbox-integration-tests
//!
//! # HTTP tests against a running storefront with a migrated, seeded database
//! STOREFRONT_URL=http://localhost:3000 cargo test -p petbox-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `onboarding_flow` - Wizard through order handoff over the in-memory store
//! - `checkout_pricing` - Plan pricing and coupon rules
//! - `storefront_http` - JSON API over HTTP (ignored by default)

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use petbox_core::{BillingCycle, CouponId, DiscountType, Money, ProductId, ProductType};
use petbox_storefront::db::memory::MemoryStore;
use petbox_storefront::models::{Coupon, PlanConfig, Product};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// An active subscription product.
#[must_use]
pub fn subscription(name: &str, cents: i64, cycle: BillingCycle) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        product_type: ProductType::Subscription,
        price: Money::from_cents(cents),
        billing_cycle: Some(cycle),
        active: true,
    }
}

/// An active, unlimited coupon without expiry.
#[must_use]
pub fn coupon(code: &str, discount_type: DiscountType, value: Decimal) -> Coupon {
    Coupon {
        id: CouponId::generate(),
        code: code.to_owned(),
        discount_type,
        discount_value: value,
        max_uses: None,
        uses_count: 0,
        valid_until: None,
        active: true,
    }
}

/// A coupon that expired yesterday.
#[must_use]
pub fn expired(mut coupon: Coupon) -> Coupon {
    coupon.valid_until = Some(Utc::now() - Duration::days(1));
    coupon
}

/// Store with the monthly (49.90) and annual (479.00) plans and no one-time box.
#[must_use]
pub fn catalog_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set_plans(PlanConfig {
        monthly: Some(subscription("Plano Mensal", 4990, BillingCycle::Monthly)),
        annual: Some(subscription("Plano Anual", 47_900, BillingCycle::Annual)),
        one_time: None,
    });
    store
}
