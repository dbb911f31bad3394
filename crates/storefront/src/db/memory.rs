//! In-memory implementation of the store traits.
//!
//! Used by unit and integration tests in place of `PostgreSQL`. The
//! onboarding write is staged and only applied once every insert succeeded,
//! mirroring the transaction in [`super::CustomerRepository`]. Individual
//! operations can be made to fail with [`MemoryStore::fail_at`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use petbox_core::{AddressId, CustomerId, PetId};

use super::{CouponStore, CustomerStore, ProductCatalog, RepositoryError};
use crate::models::{
    Address, Coupon, CouponCode, Customer, CustomerLookup, CustomerRef, NewOnboarding,
    OnboardingRecord, Pet, PlanConfig,
};

/// Operation that should fail on the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CustomerLookup,
    CustomerInsert,
    AddressInsert,
    PetInsert,
    BillingUpdate,
    CouponLookup,
    PlanConfig,
}

#[derive(Default)]
struct State {
    customers: Vec<Customer>,
    addresses: Vec<Address>,
    pets: Vec<Pet>,
    coupons: Vec<Coupon>,
    plans: PlanConfig,
    fail_at: Option<FailPoint>,
}

impl State {
    /// Consume the armed failure if it matches `point`.
    fn trip(&mut self, point: FailPoint) -> Result<(), RepositoryError> {
        if self.fail_at == Some(point) {
            self.fail_at = None;
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a customer.
    pub fn insert_customer(&self, customer: Customer) {
        self.state().customers.push(customer);
    }

    /// Seed a coupon.
    pub fn insert_coupon(&self, coupon: Coupon) {
        self.state().coupons.push(coupon);
    }

    /// Replace the plan configuration.
    pub fn set_plans(&self, plans: PlanConfig) {
        self.state().plans = plans;
    }

    /// Make the next call of `point` fail with a database error.
    pub fn fail_at(&self, point: FailPoint) {
        self.state().fail_at = Some(point);
    }

    /// All customers, in insertion order.
    #[must_use]
    pub fn customers(&self) -> Vec<Customer> {
        self.state().customers.clone()
    }

    /// All addresses, in insertion order.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.state().addresses.clone()
    }

    /// All pets, in insertion order.
    #[must_use]
    pub fn pets(&self) -> Vec<Pet> {
        self.state().pets.clone()
    }
}

impl CustomerStore for MemoryStore {
    async fn find_customer(
        &self,
        lookup: &CustomerLookup,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut state = self.state();
        state.trip(FailPoint::CustomerLookup)?;
        Ok(state
            .customers
            .iter()
            .filter(|c| lookup.matches(c))
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn create_onboarding(
        &self,
        onboarding: &NewOnboarding,
    ) -> Result<OnboardingRecord, RepositoryError> {
        let mut state = self.state();
        let now = Utc::now();

        let mut new_customer = None;
        let (customer_id, billing_customer_id, customer_created) = match &onboarding.customer {
            CustomerRef::Existing(id) => {
                let existing = state
                    .customers
                    .iter()
                    .find(|c| c.id == *id)
                    .ok_or(RepositoryError::NotFound)?;
                (*id, existing.billing_customer_id.clone(), false)
            }
            CustomerRef::New(customer) => {
                state.trip(FailPoint::CustomerInsert)?;
                if let Some(existing) = state.customers.iter().find(|c| c.phone == customer.phone) {
                    (existing.id, existing.billing_customer_id.clone(), false)
                } else {
                    let created = Customer {
                        id: CustomerId::generate(),
                        name: customer.name.clone(),
                        email: customer.email.clone(),
                        phone: customer.phone.clone(),
                        document: customer.document.clone(),
                        billing_customer_id: None,
                        created_at: now,
                    };
                    let id = created.id;
                    new_customer = Some(created);
                    (id, None, true)
                }
            }
        };

        state.trip(FailPoint::AddressInsert)?;
        let a = &onboarding.address;
        let address = Address {
            id: AddressId::generate(),
            customer_id,
            street: a.street.clone(),
            number: a.number.clone(),
            complement: a.complement.clone(),
            neighborhood: a.neighborhood.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
            is_default: a.is_default,
            created_at: now,
        };

        state.trip(FailPoint::PetInsert)?;
        let p = &onboarding.pet;
        let pet = Pet {
            id: PetId::generate(),
            customer_id,
            name: p.name.clone(),
            species: p.species,
            breed: p.breed.clone(),
            size: p.size,
            gender: p.gender,
            birth_date: p.birth_date,
            allergies: p.allergies.clone(),
            created_at: now,
        };

        // Commit.
        let record = OnboardingRecord {
            customer_id,
            customer_created,
            billing_customer_id,
            address_id: address.id,
            pet_id: pet.id,
        };
        if let Some(customer) = new_customer {
            state.customers.push(customer);
        }
        state.addresses.push(address);
        state.pets.push(pet);

        Ok(record)
    }

    async fn set_billing_customer_id(
        &self,
        id: CustomerId,
        billing_customer_id: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.trip(FailPoint::BillingUpdate)?;
        let customer = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        customer.billing_customer_id = Some(billing_customer_id.to_owned());
        Ok(())
    }
}

impl CouponStore for MemoryStore {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Option<Coupon>, RepositoryError> {
        let mut state = self.state();
        state.trip(FailPoint::CouponLookup)?;
        Ok(state
            .coupons
            .iter()
            .find(|c| c.code == code.as_str())
            .cloned())
    }
}

impl ProductCatalog for MemoryStore {
    async fn plan_config(&self) -> Result<PlanConfig, RepositoryError> {
        let mut state = self.state();
        state.trip(FailPoint::PlanConfig)?;
        Ok(state.plans.clone())
    }
}
