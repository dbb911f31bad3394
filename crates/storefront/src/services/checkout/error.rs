//! Coupon error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::RepositoryError;

/// Why a coupon cannot be redeemed. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    #[error("coupon not found")]
    NotFound,
    #[error("coupon inactive")]
    Inactive,
    #[error("coupon expired")]
    Expired,
    #[error("coupon usage limit reached")]
    Exhausted,
}

impl CouponRejection {
    /// Message shown to the visitor.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::NotFound => "Cupom não encontrado",
            Self::Inactive => "Cupom inativo",
            Self::Expired => "Cupom expirado",
            Self::Exhausted => "Cupom esgotado",
        }
    }
}

/// Errors that can occur when applying a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The coupon exists but cannot be redeemed, or does not exist.
    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    /// A coupon is already applied; remove it first.
    #[error("a coupon is already applied")]
    AlreadyApplied,

    /// The coupon could not be read.
    #[error("coupon lookup failed: {0}")]
    Lookup(#[source] RepositoryError),
}

impl CouponError {
    /// Message shown to the visitor.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.user_message(),
            Self::AlreadyApplied => "Já existe um cupom aplicado",
            Self::Lookup(_) => "Não foi possível validar o cupom. Tente novamente.",
        }
    }
}
