//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use petbox_core::{CouponId, DiscountType};

use super::{CouponStore, RepositoryError, conflict_on_unique};
use crate::models::{Coupon, CouponCode, NewCoupon};

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
    max_uses: Option<i32>,
    uses_count: i32,
    valid_until: Option<DateTime<Utc>>,
    active: bool,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            max_uses: row.max_uses,
            uses_count: row.uses_count,
            valid_until: row.valid_until,
            active: row.active,
        }
    }
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            INSERT INTO petbox.coupon
                (code, discount_type, discount_value, max_uses, valid_until)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, code, discount_type, discount_value, max_uses, uses_count,
                      valid_until, active
            ",
        )
        .bind(coupon.code.as_str())
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_uses)
        .bind(coupon.valid_until)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))?;

        Ok(row.into())
    }

    /// List all coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_type, discount_value, max_uses, uses_count,
                   valid_until, active
            FROM petbox.coupon
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Coupon::from).collect())
    }

    /// Deactivate a coupon by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this code.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, code: &CouponCode) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE petbox.coupon SET active = FALSE WHERE code = $1")
            .bind(code.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl CouponStore for CouponRepository<'_> {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_type, discount_value, max_uses, uses_count,
                   valid_until, active
            FROM petbox.coupon
            WHERE code = $1
            ",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }
}
