//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `onboarding` - Identification, registration and address steps
//! - `checkout` - Plan pricing, coupons and the order handoff
//! - `billing` - Customer registration with the billing provider
//! - `postal_code` - CEP autofill
//! - `fakes` - In-process providers for tests and local runs

pub mod billing;
pub mod checkout;
pub mod fakes;
pub mod onboarding;
pub mod postal_code;
