//! Delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petbox_core::{AddressId, CustomerId, PostalCode};

/// An address row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    /// Two-letter state code (UF).
    pub state: String,
    pub postal_code: PostalCode,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an address. The customer id is supplied at insert
/// time because it may not exist yet when the payload is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: PostalCode,
    pub is_default: bool,
}
