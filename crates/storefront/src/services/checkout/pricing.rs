//! Price computation.
//!
//! All arithmetic is exact decimal; see [`petbox_core::Money`] for display
//! rounding.

use rust_decimal::Decimal;

use petbox_core::{DiscountType, Money};

use crate::models::{Coupon, PlanConfig, PlanSelection, Product};

/// Product backing `selection`, if one is configured.
#[must_use]
pub const fn select_product(plans: &PlanConfig, selection: PlanSelection) -> Option<&Product> {
    plans.product_for(selection)
}

/// Gross price for `selection`, or `fallback` when no product is configured.
#[must_use]
pub fn gross_price(plans: &PlanConfig, selection: PlanSelection, fallback: Money) -> Money {
    select_product(plans, selection).map_or(fallback, |product| product.price)
}

/// Discount `coupon` grants on `gross`. Never exceeds `gross`.
#[must_use]
pub fn compute_discount(gross: Money, coupon: &Coupon) -> Money {
    let discount = match coupon.discount_type {
        DiscountType::Percentage => gross.percent(coupon.discount_value),
        DiscountType::Fixed => Money::new(coupon.discount_value),
    };
    discount.clamp(Money::ZERO, gross.max(Money::ZERO))
}

/// `gross - discount`, never negative.
#[must_use]
pub fn final_price(gross: Money, discount: Money) -> Money {
    gross.saturating_sub(discount)
}

/// Discount for an optional coupon.
#[must_use]
pub fn discount_for(gross: Money, coupon: Option<&Coupon>) -> Money {
    coupon.map_or(Money::ZERO, |c| compute_discount(gross, c))
}

/// Percentage a discount represents of `gross`, for display.
#[must_use]
pub fn discount_ratio(gross: Money, discount: Money) -> Decimal {
    if gross.amount().is_zero() {
        return Decimal::ZERO;
    }
    discount.amount() * Decimal::ONE_HUNDRED / gross.amount()
}
