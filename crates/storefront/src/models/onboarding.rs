//! Payloads exchanged between the onboarding wizard and the customer store.

use serde::{Deserialize, Serialize};

use petbox_core::{AddressId, Cpf, CustomerId, PetId, Phone};

use super::{NewAddress, NewCustomer, NewPet};

/// Customer side of a submission: reuse a known row or create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    Existing(CustomerId),
    New(NewCustomer),
}

/// Everything written in the onboarding transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOnboarding {
    pub customer: CustomerRef,
    pub address: NewAddress,
    pub pet: NewPet,
}

/// Ids produced by the onboarding transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingRecord {
    pub customer_id: CustomerId,
    /// False when an existing row was reused, including a concurrent insert
    /// of the same phone number.
    pub customer_created: bool,
    pub billing_customer_id: Option<String>,
    pub address_id: AddressId,
    pub pet_id: PetId,
}

/// Bundle handed to the checkout once onboarding completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingCompletion {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_document: Option<Cpf>,
    pub customer_phone: Phone,
    pub billing_customer_id: Option<String>,
    pub pet_id: PetId,
}
