//! Customer records and lookup keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petbox_core::{Cpf, CustomerId, Phone};

/// A customer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: Phone,
    pub document: Option<Cpf>,
    /// Customer id at the billing provider, once registered there.
    pub billing_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Phone,
    pub document: Option<Cpf>,
}

/// How an existing customer is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerLookup {
    Phone(Phone),
    Document(Cpf),
}

impl CustomerLookup {
    /// Build a lookup from the identification step inputs.
    ///
    /// Phone wins when both are present. Returns `None` when neither input
    /// contains any digit.
    #[must_use]
    pub fn from_identification(phone: &str, document: &str) -> Option<Self> {
        if let Ok(phone) = Phone::parse(phone) {
            return Some(Self::Phone(phone));
        }
        Cpf::parse(document).ok().map(Self::Document)
    }

    /// Column name used for the lookup, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Phone(_) => "phone",
            Self::Document(_) => "document",
        }
    }

    /// Whether `customer` matches this lookup key.
    #[must_use]
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            Self::Phone(phone) => &customer.phone == phone,
            Self::Document(cpf) => customer.document.as_ref() == Some(cpf),
        }
    }
}
