//! Coupon management commands.
//!
//! # Usage
//!
//! ```bash
//! petbox-cli coupon create SAVE10 -t percentage -v 10 --max-uses 100
//! petbox-cli coupon create FRETE -t fixed -v 15.00 --valid-until 2026-12-31T23:59:59Z
//! petbox-cli coupon list
//! petbox-cli coupon deactivate SAVE10
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use petbox_core::DiscountType;
use petbox_storefront::db::{CouponRepository, RepositoryError};
use petbox_storefront::models::{CouponCode, NewCoupon, NewCouponError};

use super::{CommandError, connect};

/// Create a coupon. The code is stored trimmed and uppercased.
///
/// # Errors
///
/// Returns an error if the definition is invalid, the code is taken or the
/// database fails.
pub async fn create(
    code: &str,
    discount_type: DiscountType,
    discount_value: Decimal,
    max_uses: Option<i32>,
    valid_until: Option<DateTime<Utc>>,
) -> Result<(), CommandError> {
    let coupon = NewCoupon::new(code, discount_type, discount_value, max_uses, valid_until)?;

    let pool = connect().await?;
    let created = CouponRepository::new(&pool).create(&coupon).await?;

    tracing::info!(
        "Coupon created: {} ({} {}), ID: {}",
        created.code,
        created.discount_type,
        created.discount_value,
        created.id
    );
    Ok(())
}

/// List all coupons with their usage.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let coupons = CouponRepository::new(&pool).list().await?;
    let now = Utc::now();

    tracing::info!("{} coupon(s)", coupons.len());
    for coupon in coupons {
        let uses = coupon.max_uses.map_or_else(
            || coupon.uses_count.to_string(),
            |max| format!("{}/{max}", coupon.uses_count),
        );
        let until = coupon
            .valid_until
            .map_or_else(|| "-".to_owned(), |until| until.to_rfc3339());
        tracing::info!(
            "  {:<16} {:<10} {:>8}  uses {:<9} until {:<25} {}",
            coupon.code,
            coupon.discount_type.to_string(),
            coupon.discount_value.to_string(),
            uses,
            until,
            if coupon.is_redeemable(now) {
                "redeemable"
            } else {
                "not redeemable"
            }
        );
    }
    Ok(())
}

/// Deactivate a coupon by code.
///
/// # Errors
///
/// Returns an error if no coupon has this code or the database fails.
pub async fn deactivate(code: &str) -> Result<(), CommandError> {
    let code = CouponCode::normalize(code).ok_or(NewCouponError::EmptyCode)?;

    let pool = connect().await?;
    match CouponRepository::new(&pool).deactivate(&code).await {
        Ok(()) => {
            tracing::info!("Coupon deactivated: {code}");
            Ok(())
        }
        Err(RepositoryError::NotFound) => {
            tracing::warn!("No coupon with code {code}");
            Err(RepositoryError::NotFound.into())
        }
        Err(e) => Err(e.into()),
    }
}
