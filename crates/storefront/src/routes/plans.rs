//! Plan listing handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use petbox_core::{BillingCycle, Money, ProductId};

use crate::db::CouponRepository;
use crate::error::Result;
use crate::models::PlanSelection;
use crate::services::checkout::{CheckoutService, CheckoutSession};
use crate::state::AppState;

const SELECTIONS: [PlanSelection; 3] = [
    PlanSelection::Monthly,
    PlanSelection::Annual,
    PlanSelection::OneTime,
];

/// One purchasable option.
#[derive(Debug, Serialize)]
pub struct PlanOption {
    pub selection: PlanSelection,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub billing_cycle: Option<BillingCycle>,
    pub price: Money,
    pub price_display: String,
    /// False when no product is linked and the default price is shown.
    pub configured: bool,
}

/// Plan options response.
#[derive(Debug, Serialize)]
pub struct PlansView {
    pub plans: Vec<PlanOption>,
}

/// List the plan options with their prices.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<PlansView>> {
    let coupons = CouponRepository::new(state.pool());
    let service = CheckoutService::new(&coupons, state.plans(), &state.config().checkout);
    let plans = service.plans().await?;

    let options = SELECTIONS
        .into_iter()
        .map(|selection| {
            let quote = service.quote(
                &plans,
                &CheckoutSession {
                    selection,
                    ..CheckoutSession::default()
                },
            );
            PlanOption {
                selection,
                product_id: quote.product_id,
                name: quote.product_name,
                billing_cycle: quote.billing_cycle,
                price: quote.gross,
                price_display: quote.gross_display,
                configured: !quote.fallback_price,
            }
        })
        .collect();

    Ok(Json(PlansView { plans: options }))
}
