//! Core types for PetBox.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod money;
pub mod status;

pub use contact::{ContactError, Cpf, Phone, PostalCode, digits_only};
pub use id::*;
pub use money::Money;
pub use status::*;
