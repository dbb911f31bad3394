//! Plan selection, coupons and the order handoff.
//!
//! [`CheckoutSession`] is the per-visitor state kept in the session;
//! [`CheckoutService`] validates coupons against a [`CouponStore`], prices the
//! selection and assembles the [`OrderContext`] for the payment page.

mod error;
pub mod pricing;

pub use error::{CouponError, CouponRejection};
pub use pricing::{compute_discount, final_price, select_product};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use petbox_core::{BillingCycle, Money, ProductId, ProductType};

use crate::config::CheckoutConfig;
use crate::db::{CouponStore, ProductCatalog, RepositoryError};
use crate::models::{
    Coupon, CouponCode, OnboardingCompletion, OrderContext, PetProfile, PlanConfig, PlanSelection,
};

/// Coupon field state: `none → validating → applied | error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CouponState {
    #[default]
    None,
    Validating { code: String },
    Applied { coupon: Coupon },
    Error { code: String, message: String },
}

impl CouponState {
    /// Start validating `code`.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::AlreadyApplied` while a coupon is applied.
    pub fn begin(&mut self, code: &str) -> Result<(), CouponError> {
        if matches!(self, Self::Applied { .. }) {
            return Err(CouponError::AlreadyApplied);
        }
        *self = Self::Validating {
            code: code.to_owned(),
        };
        Ok(())
    }

    /// Finish a validation started with [`CouponState::begin`].
    pub fn resolve(&mut self, result: &Result<Coupon, CouponError>) {
        let Self::Validating { code } = self else {
            return;
        };
        *self = match result {
            Ok(coupon) => Self::Applied {
                coupon: coupon.clone(),
            },
            Err(e) => Self::Error {
                code: std::mem::take(code),
                message: e.user_message().to_owned(),
            },
        };
    }

    /// Remove the applied coupon or clear an error.
    pub fn remove(&mut self) {
        *self = Self::None;
    }

    /// The applied coupon, if any.
    #[must_use]
    pub const fn applied(&self) -> Option<&Coupon> {
        match self {
            Self::Applied { coupon } => Some(coupon),
            _ => None,
        }
    }
}

/// Per-visitor checkout state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub selection: PlanSelection,
    pub coupon: CouponState,
    pub pet: Option<PetProfile>,
}

/// Priced view of the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub selection: PlanSelection,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_type: ProductType,
    pub billing_cycle: Option<BillingCycle>,
    /// True when no product is configured and the default price applies.
    pub fallback_price: bool,
    pub gross: Money,
    pub discount: Money,
    pub final_price: Money,
    pub discount_percent: Decimal,
    pub coupon_code: Option<String>,
    pub gross_display: String,
    pub discount_display: String,
    pub final_display: String,
}

/// Check a coupon against its redeemability rules at `now`.
///
/// Order: inactive, expired, exhausted. The first failing rule wins.
///
/// # Errors
///
/// Returns the first `CouponRejection` that applies.
pub fn check_coupon(coupon: &Coupon, now: DateTime<Utc>) -> Result<(), CouponRejection> {
    if !coupon.active {
        return Err(CouponRejection::Inactive);
    }
    if coupon.is_expired(now) {
        return Err(CouponRejection::Expired);
    }
    if coupon.is_exhausted() {
        return Err(CouponRejection::Exhausted);
    }
    Ok(())
}

/// Checkout operations over a coupon store and a product catalog.
pub struct CheckoutService<'a, C, P> {
    coupons: &'a C,
    catalog: &'a P,
    config: &'a CheckoutConfig,
}

impl<'a, C, P> CheckoutService<'a, C, P>
where
    C: CouponStore,
    P: ProductCatalog,
{
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(coupons: &'a C, catalog: &'a P, config: &'a CheckoutConfig) -> Self {
        Self {
            coupons,
            catalog,
            config,
        }
    }

    /// Current plan configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog cannot be read.
    pub async fn plans(&self) -> Result<PlanConfig, RepositoryError> {
        self.catalog.plan_config().await
    }

    /// Look up a coupon by code and check that it can be redeemed.
    ///
    /// The code is trimmed and uppercased first; a blank code is not found.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Rejected` with the failing rule, or
    /// `CouponError::Lookup` if the store fails.
    #[instrument(skip(self, now))]
    pub async fn validate_coupon(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        let code = CouponCode::normalize(raw_code).ok_or(CouponRejection::NotFound)?;
        let coupon = self
            .coupons
            .find_coupon(&code)
            .await
            .map_err(CouponError::Lookup)?
            .ok_or(CouponRejection::NotFound)?;

        check_coupon(&coupon, now)?;
        debug!(coupon_id = %coupon.id, "Coupon valid");
        Ok(coupon)
    }

    /// Apply a coupon to the session. The coupon state records the outcome
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::AlreadyApplied` if a coupon is applied (state
    /// unchanged), otherwise the error from [`Self::validate_coupon`].
    pub async fn apply_coupon(
        &self,
        session: &mut CheckoutSession,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponError> {
        session.coupon.begin(raw_code.trim())?;
        let result = self.validate_coupon(raw_code, now).await;
        session.coupon.resolve(&result);
        result
    }

    /// Price the session's selection.
    #[must_use]
    pub fn quote(&self, plans: &PlanConfig, session: &CheckoutSession) -> Quote {
        let selection = session.selection;
        let product = select_product(plans, selection);
        let gross = pricing::gross_price(plans, selection, self.config.default_plan_price);
        let coupon = session.coupon.applied();
        let discount = pricing::discount_for(gross, coupon);
        let final_price = final_price(gross, discount);

        Quote {
            selection,
            product_id: product.map(|p| p.id),
            product_name: product.map_or_else(
                || selection.fallback_name().to_owned(),
                |p| p.name.clone(),
            ),
            product_type: product.map_or(selection.product_type(), |p| p.product_type),
            billing_cycle: product.map_or(selection.billing_cycle(), |p| p.billing_cycle),
            fallback_price: product.is_none(),
            gross,
            discount,
            final_price,
            discount_percent: pricing::discount_ratio(gross, discount),
            coupon_code: coupon.map(|c| c.code.clone()),
            gross_display: gross.display(),
            discount_display: discount.display(),
            final_display: final_price.display(),
        }
    }

    /// Assemble the order context handed to the payment page.
    ///
    /// With coupon re-validation enabled the applied coupon is checked again;
    /// if it no longer passes, the coupon state moves to `error`.
    ///
    /// # Errors
    ///
    /// Returns the `CouponError` from re-validation.
    pub async fn order_context(
        &self,
        plans: &PlanConfig,
        session: &mut CheckoutSession,
        completion: &OnboardingCompletion,
        now: DateTime<Utc>,
    ) -> Result<OrderContext, CouponError> {
        let stale_code = session
            .coupon
            .applied()
            .filter(|_| self.config.revalidate_coupon)
            .map(|c| c.code.clone());
        if let Some(code) = stale_code {
            if let Err(e) = self.validate_coupon(&code, now).await {
                warn!(coupon = %code, error = %e, "Applied coupon no longer valid");
                session.coupon = CouponState::Error {
                    code,
                    message: e.user_message().to_owned(),
                };
                return Err(e);
            }
        }

        let quote = self.quote(plans, session);
        Ok(OrderContext {
            customer_id: completion.customer_id,
            customer_name: completion.customer_name.clone(),
            customer_email: completion.customer_email.clone(),
            customer_document: completion.customer_document.clone(),
            customer_phone: completion.customer_phone.clone(),
            billing_customer_id: completion.billing_customer_id.clone(),
            pet_id: completion.pet_id,
            product_id: quote.product_id,
            product_type: quote.product_type,
            product_name: quote.product_name,
            product_value: quote.gross,
            billing_cycle: quote.billing_cycle,
            coupon_id: session.coupon.applied().map(|c| c.id),
            discount_amount: quote.discount,
            final_price: quote.final_price,
        })
    }
}
