//! Checkout route handlers.
//!
//! The checkout state lives in the session under `checkout`; every handler
//! loads it, runs one operation and writes it back.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::CouponRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{
    OnboardingCompletion, OrderContext, PetProfile, PetProfileForm, PlanSelection, session,
    session_keys,
};
use crate::services::checkout::{CheckoutService, CheckoutSession, CouponState, Quote};
use crate::state::AppState;

const MISSING_PET: &str = "preencha o perfil do pet";

/// Checkout snapshot returned by every checkout handler.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub selection: PlanSelection,
    pub coupon: CouponState,
    pub pet: Option<PetProfile>,
    pub quote: Quote,
}

/// Plan selection form.
#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub selection: PlanSelection,
}

/// Coupon form.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// Allergy toggle form.
#[derive(Debug, Deserialize)]
pub struct AllergyForm {
    pub item: String,
}

async fn load_checkout(session: &Session) -> Result<CheckoutSession> {
    Ok(session::load(session, session_keys::CHECKOUT).await?)
}

async fn store_checkout(session: &Session, checkout: &CheckoutSession) -> Result<()> {
    Ok(session::store(session, session_keys::CHECKOUT, checkout).await?)
}

/// Price the checkout and build the response.
async fn render(state: &AppState, checkout: CheckoutSession) -> Result<Json<CheckoutView>> {
    let coupons = CouponRepository::new(state.pool());
    let service = CheckoutService::new(&coupons, state.plans(), &state.config().checkout);
    let plans = service.plans().await?;
    let quote = service.quote(&plans, &checkout);

    Ok(Json(CheckoutView {
        selection: checkout.selection,
        coupon: checkout.coupon,
        pet: checkout.pet,
        quote,
    }))
}

/// Current checkout state.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let checkout = load_checkout(&session).await?;
    render(&state, checkout).await
}

/// Select a plan.
#[instrument(skip(state, session))]
pub async fn select_plan(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PlanForm>,
) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    checkout.selection = form.selection;
    store_checkout(&session, &checkout).await?;
    render(&state, checkout).await
}

/// Save the pet profile.
#[instrument(skip(state, session, form))]
pub async fn save_pet(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PetProfileForm>,
) -> Result<Json<CheckoutView>> {
    let profile = PetProfile::from_form(form)?;
    let mut checkout = load_checkout(&session).await?;
    checkout.pet = Some(profile);
    store_checkout(&session, &checkout).await?;
    render(&state, checkout).await
}

/// Toggle one allergy on the saved pet profile.
#[instrument(skip(state, session))]
pub async fn toggle_allergy(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AllergyForm>,
) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    let pet = checkout
        .pet
        .as_mut()
        .ok_or_else(|| AppError::BadRequest(MISSING_PET.to_string()))?;
    pet.allergies.toggle(&form.item);
    store_checkout(&session, &checkout).await?;
    render(&state, checkout).await
}

/// Apply a coupon code.
///
/// The coupon state is saved even when the code is rejected, so the error
/// stays visible until the visitor edits or removes it.
#[instrument(skip(state, session, form))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CouponForm>,
) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    let coupons = CouponRepository::new(state.pool());
    let service = CheckoutService::new(&coupons, state.plans(), &state.config().checkout);

    let result = service
        .apply_coupon(&mut checkout, &form.code, Utc::now())
        .await;
    store_checkout(&session, &checkout).await?;

    let coupon = result?;
    add_breadcrumb("checkout", "Coupon applied", Some(&[("code", coupon.code.as_str())]));
    render(&state, checkout).await
}

/// Remove the applied coupon.
#[instrument(skip(state, session))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutView>> {
    let mut checkout = load_checkout(&session).await?;
    checkout.coupon.remove();
    store_checkout(&session, &checkout).await?;
    render(&state, checkout).await
}

/// Order context for the payment page. Requires a completed onboarding.
#[instrument(skip(state, session))]
pub async fn order(State(state): State<AppState>, session: Session) -> Result<Json<OrderContext>> {
    let completion = session
        .get::<OnboardingCompletion>(session_keys::ONBOARDING_COMPLETION)
        .await?
        .ok_or_else(|| AppError::NotFound("Cadastro".to_string()))?;
    order_for(&state, &session, &completion).await.map(Json)
}

/// Build the order context for `completion` from the session's checkout.
pub(crate) async fn order_for(
    state: &AppState,
    session: &Session,
    completion: &OnboardingCompletion,
) -> Result<OrderContext> {
    let mut checkout = load_checkout(session).await?;
    let coupons = CouponRepository::new(state.pool());
    let service = CheckoutService::new(&coupons, state.plans(), &state.config().checkout);
    let plans = service.plans().await?;

    let result = service
        .order_context(&plans, &mut checkout, completion, Utc::now())
        .await;
    if result.is_err() {
        store_checkout(session, &checkout).await?;
    }
    Ok(result?)
}
