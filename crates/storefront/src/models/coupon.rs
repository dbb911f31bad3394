//! Discount coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use petbox_core::{CouponId, DiscountType};

/// A normalized coupon code: trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalize raw input. Returns `None` for blank input.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coupon row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub uses_count: i32,
    pub valid_until: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Coupon {
    /// Whether `valid_until` lies before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Whether the usage limit has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.uses_count >= max)
    }

    /// Whether the coupon can be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired(now) && !self.is_exhausted()
    }
}

/// Insert payload for a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Why a coupon definition was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NewCouponError {
    #[error("coupon code is required")]
    EmptyCode,
    #[error("discount value must be positive")]
    NonPositiveValue,
    #[error("percentage discount cannot exceed 100")]
    PercentageTooLarge,
    #[error("max uses must be positive")]
    NonPositiveMaxUses,
}

impl NewCoupon {
    /// Validate a coupon definition.
    ///
    /// # Errors
    ///
    /// Returns `NewCouponError` when the code is blank, the value is not
    /// positive, a percentage exceeds 100 or `max_uses` is not positive.
    pub fn new(
        code: &str,
        discount_type: DiscountType,
        discount_value: Decimal,
        max_uses: Option<i32>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Self, NewCouponError> {
        let code = CouponCode::normalize(code).ok_or(NewCouponError::EmptyCode)?;
        if discount_value <= Decimal::ZERO {
            return Err(NewCouponError::NonPositiveValue);
        }
        if discount_type == DiscountType::Percentage && discount_value > Decimal::ONE_HUNDRED {
            return Err(NewCouponError::PercentageTooLarge);
        }
        if max_uses.is_some_and(|max| max <= 0) {
            return Err(NewCouponError::NonPositiveMaxUses);
        }

        Ok(Self {
            code,
            discount_type,
            discount_value,
            max_uses,
            valid_until,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon() -> Coupon {
        Coupon {
            id: CouponId::generate(),
            code: "SAVE10".to_owned(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(10, 0),
            max_uses: Some(5),
            uses_count: 0,
            valid_until: None,
            active: true,
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(CouponCode::normalize(" save10 ").unwrap().as_str(), "SAVE10");
        assert!(CouponCode::normalize("   ").is_none());
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let mut c = coupon();
        c.valid_until = Some(now);
        assert!(!c.is_expired(now));
        c.valid_until = Some(now - Duration::seconds(1));
        assert!(c.is_expired(now));
    }

    #[test]
    fn test_exhausted_at_limit() {
        let mut c = coupon();
        c.uses_count = 5;
        assert!(c.is_exhausted());
        assert!(!c.is_redeemable(Utc::now()));
        c.max_uses = None;
        assert!(!c.is_exhausted());
    }

    #[test]
    fn test_new_coupon_validation() {
        let pct = DiscountType::Percentage;
        assert_eq!(
            NewCoupon::new(" ", pct, Decimal::TEN, None, None).unwrap_err(),
            NewCouponError::EmptyCode
        );
        assert_eq!(
            NewCoupon::new("X", pct, Decimal::new(101, 0), None, None).unwrap_err(),
            NewCouponError::PercentageTooLarge
        );
        assert_eq!(
            NewCoupon::new("X", DiscountType::Fixed, Decimal::ZERO, None, None).unwrap_err(),
            NewCouponError::NonPositiveValue
        );
        assert_eq!(
            NewCoupon::new("X", pct, Decimal::TEN, Some(0), None).unwrap_err(),
            NewCouponError::NonPositiveMaxUses
        );
        let ok = NewCoupon::new("bem-vindo", pct, Decimal::TEN, Some(100), None).unwrap();
        assert_eq!(ok.code.as_str(), "BEM-VINDO");
    }
}
