//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database ping)
//!
//! # Plans
//! GET  /api/plans                  - Plan options with display prices
//!
//! # Checkout
//! GET    /api/checkout             - Selection, coupon state and quote
//! PUT    /api/checkout/plan        - Select monthly/annual/one_time
//! PUT    /api/checkout/pet         - Save the pet profile
//! POST   /api/checkout/pet/allergies - Toggle one allergy
//! POST   /api/checkout/coupon      - Apply a coupon (rate limited)
//! DELETE /api/checkout/coupon      - Remove the applied coupon
//! GET    /api/checkout/order       - Order context for the payment page
//!
//! # Onboarding
//! GET  /api/onboarding             - Wizard snapshot
//! POST /api/onboarding/check       - Identification (rate limited)
//! POST /api/onboarding/register    - Personal data
//! POST /api/onboarding/back        - Previous step
//! POST /api/onboarding/postal-code - CEP autofill (rate limited)
//! POST /api/onboarding/submit      - Persist and hand off to payment
//! ```

pub mod checkout;
pub mod health;
pub mod onboarding;
pub mod plans;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, lookup_rate_limiter};
use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let lookups = Router::new()
        .route("/coupon", post(checkout::apply_coupon))
        .layer(lookup_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/plan", put(checkout::select_plan))
        .route("/pet", put(checkout::save_pet))
        .route("/pet/allergies", post(checkout::toggle_allergy))
        .route("/coupon", axum::routing::delete(checkout::remove_coupon))
        .route("/order", get(checkout::order))
        .merge(lookups)
}

/// Create the onboarding routes router.
pub fn onboarding_routes() -> Router<AppState> {
    let lookups = Router::new()
        .route("/check", post(onboarding::check))
        .route("/postal-code", post(onboarding::postal_code))
        .layer(lookup_rate_limiter());

    Router::new()
        .route("/", get(onboarding::show))
        .route("/register", post(onboarding::register))
        .route("/back", post(onboarding::back))
        .route("/submit", post(onboarding::submit))
        .merge(lookups)
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/plans", get(plans::index))
        .nest("/checkout", checkout_routes())
        .nest("/onboarding", onboarding_routes())
        .layer(api_rate_limiter());

    Router::new()
        .nest("/health", health_routes())
        .nest("/api", api)
}
