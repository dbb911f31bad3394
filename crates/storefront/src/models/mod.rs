//! Domain models for the storefront.
//!
//! Records mirror rows in the `petbox` schema; `New*` structs are insert
//! payloads. Session-scoped state lives in [`session`].

pub mod address;
pub mod coupon;
pub mod customer;
pub mod onboarding;
pub mod order;
pub mod pet;
pub mod product;
pub mod session;

pub use address::{Address, NewAddress};
pub use coupon::{Coupon, CouponCode, NewCoupon, NewCouponError};
pub use customer::{Customer, CustomerLookup, NewCustomer};
pub use onboarding::{CustomerRef, NewOnboarding, OnboardingCompletion, OnboardingRecord};
pub use order::OrderContext;
pub use pet::{AllergySelection, NewPet, Pet, PetProfile, PetProfileError, PetProfileForm};
pub use product::{PlanConfig, PlanLinks, PlanSelection, Product};
pub use session::keys as session_keys;
