//! Enumerations shared by the catalog, coupon and pet records.
//!
//! The storefront UI speaks its own short-code vocabulary (`P/M/G` sizes,
//! `boy/girl` genders); the database stores the normalized names. `FromStr`
//! accepts both so form input and stored values parse the same way.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Billing cadence of a subscription product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.billing_cycle", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Annual,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensal" => Ok(Self::Monthly),
            "annual" | "yearly" | "anual" => Ok(Self::Annual),
            _ => Err(ParseEnumError::new("billing cycle", s)),
        }
    }
}

/// Whether a product is billed recurrently or once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.product_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Subscription,
    OneTime,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscription => write!(f, "subscription"),
            Self::OneTime => write!(f, "one_time"),
        }
    }
}

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.discount_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Value is a percentage of the gross price (0-100).
    Percentage,
    /// Value is an amount in reais, capped at the gross price.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => write!(f, "percentage"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Ok(Self::Percentage),
            "fixed" | "fixed_amount" | "amount" => Ok(Self::Fixed),
            _ => Err(ParseEnumError::new("discount type", s)),
        }
    }
}

/// Pet species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.pet_species", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Dog,
    Cat,
}

impl std::str::FromStr for Species {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dog" | "cachorro" | "cao" | "cão" => Ok(Self::Dog),
            "cat" | "gato" => Ok(Self::Cat),
            _ => Err(ParseEnumError::new("species", s)),
        }
    }
}

/// Pet size, stored as `small/medium/large`.
///
/// The UI codes are the Brazilian clothing sizes `P`, `M` and `G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.pet_size", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl std::str::FromStr for PetSize {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p" | "small" => Ok(Self::Small),
            "m" | "medium" => Ok(Self::Medium),
            "g" | "large" => Ok(Self::Large),
            _ => Err(ParseEnumError::new("pet size", s)),
        }
    }
}

/// Pet gender, stored as `male/female`; the UI sends `boy/girl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "petbox.pet_gender", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PetGender {
    Male,
    Female,
}

impl std::str::FromStr for PetGender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "boy" | "male" | "macho" => Ok(Self::Male),
            "girl" | "female" | "femea" | "fêmea" => Ok(Self::Female),
            _ => Err(ParseEnumError::new("pet gender", s)),
        }
    }
}
