//! PetBox storefront library.
//!
//! Checkout pricing, coupon validation and the customer onboarding wizard,
//! plus the axum routes that expose them. The binary in `main.rs` wires
//! these together; the CLI and the integration tests use the library
//! directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
