//! PetBox Core - Shared types library.
//!
//! This crate provides common types used across all PetBox components:
//! - `storefront` - Customer-facing checkout and onboarding service
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, contact identifiers and enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
