//! In-process stand-ins for the external services.
//!
//! Used by tests that exercise onboarding without network access.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use petbox_core::{CustomerId, PostalCode};

use super::billing::{BillingCustomer, BillingError, BillingProvider};
use super::postal_code::{PostalAddress, PostalCodeError, PostalCodeResolver};

/// Billing provider that hands out sequential ids and records every call.
#[derive(Default)]
pub struct FakeBilling {
    calls: Mutex<Vec<CustomerId>>,
    fail: bool,
}

impl FakeBilling {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Customer ids passed to `create_customer`, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<CustomerId> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BillingProvider for FakeBilling {
    async fn create_customer(
        &self,
        customer: &BillingCustomer<'_>,
    ) -> Result<String, BillingError> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.push(customer.id);
        if self.fail {
            return Err(BillingError::Api {
                status: 503,
                message: "unavailable".to_owned(),
            });
        }
        Ok(format!("cus_{:04}", calls.len()))
    }
}

/// Postal code resolver backed by a fixed table.
#[derive(Default)]
pub struct FakePostalCodes {
    addresses: HashMap<String, PostalAddress>,
    fail: bool,
}

impl FakePostalCodes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver whose every lookup fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Register an address for `code` (digits only).
    #[must_use]
    pub fn with(mut self, code: &str, address: PostalAddress) -> Self {
        self.addresses.insert(code.to_owned(), address);
        self
    }
}

impl PostalCodeResolver for FakePostalCodes {
    async fn resolve(
        &self,
        code: &PostalCode,
    ) -> Result<Option<PostalAddress>, PostalCodeError> {
        if self.fail {
            return Err(PostalCodeError::Api { status: 500 });
        }
        Ok(self.addresses.get(code.as_str()).cloned())
    }
}
