//! Customer onboarding.
//!
//! [`OnboardingWizard`] holds the per-visitor state machine;
//! [`OnboardingService`] runs the steps that touch the customer store and
//! the billing provider.

mod error;
pub mod wizard;

pub use error::OnboardingError;
pub use wizard::{
    AddressInput, ExistingCustomer, IdentificationInput, OnboardingForm, OnboardingStep,
    OnboardingWizard, PersonalDataInput, PostalRequest, Submission,
};

use tracing::{info, instrument, warn};

use petbox_core::{Cpf, CustomerId};

use crate::db::CustomerStore;
use crate::models::{Customer, CustomerLookup, NewCustomer, OnboardingCompletion, PetProfile};
use crate::services::billing::{BillingCustomer, BillingProvider};
use crate::services::postal_code::{PostalCodeResolver, resolve_quietly};

/// Onboarding operations over a customer store and a billing provider.
pub struct OnboardingService<'a, S, B> {
    store: &'a S,
    billing: &'a B,
}

impl<'a, S, B> OnboardingService<'a, S, B>
where
    S: CustomerStore,
    B: BillingProvider,
{
    /// Create a new onboarding service.
    #[must_use]
    pub const fn new(store: &'a S, billing: &'a B) -> Self {
        Self { store, billing }
    }

    /// Look up an existing customer.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Lookup` if the store fails.
    #[instrument(skip(self, lookup), fields(lookup = lookup.kind()))]
    pub async fn find_customer(
        &self,
        lookup: &CustomerLookup,
    ) -> Result<Option<Customer>, OnboardingError> {
        self.store
            .find_customer(lookup)
            .await
            .map_err(OnboardingError::Lookup)
    }

    /// Run the identification step: look the visitor up and advance.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Validation` without phone or CPF,
    /// `OnboardingError::InvalidStep` outside the check step and
    /// `OnboardingError::Lookup` if the store fails. The wizard is unchanged
    /// on error.
    pub async fn check(
        &self,
        wizard: &mut OnboardingWizard,
        input: &IdentificationInput,
    ) -> Result<Option<Customer>, OnboardingError> {
        let lookup = wizard.lookup_for(input)?;
        let found = self.find_customer(&lookup).await?;
        wizard.apply_check(input, found.as_ref());
        Ok(found)
    }

    /// Final submission: persist customer, address and pet, then register
    /// the customer with the billing provider if needed.
    ///
    /// The billing call happens after the write commits and never fails the
    /// onboarding.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Validation` or `OnboardingError::InvalidStep`
    /// for bad input, and `OnboardingError::Persistence` if the write failed,
    /// in which case nothing was stored.
    #[instrument(skip_all)]
    pub async fn create_onboarding(
        &self,
        wizard: &mut OnboardingWizard,
        address: &AddressInput,
        pet: &PetProfile,
    ) -> Result<OnboardingCompletion, OnboardingError> {
        let submission = wizard.prepare_submission(address, pet)?;

        let record = self
            .store
            .create_onboarding(&submission.onboarding)
            .await
            .map_err(OnboardingError::Persistence)?;

        let known_billing_id = submission
            .existing
            .and_then(|existing| existing.billing_customer_id)
            .or(record.billing_customer_id);
        let billing_customer_id = match known_billing_id {
            Some(id) => Some(id),
            None => {
                self.register_billing(record.customer_id, &submission.contact)
                    .await
            }
        };

        info!(
            customer_id = %record.customer_id,
            pet_id = %record.pet_id,
            customer_created = record.customer_created,
            has_billing_customer = billing_customer_id.is_some(),
            "Onboarding completed"
        );

        let contact = submission.contact;
        Ok(OnboardingCompletion {
            customer_id: record.customer_id,
            customer_name: contact.name,
            customer_email: contact.email,
            customer_document: contact.document,
            customer_phone: contact.phone,
            billing_customer_id,
            pet_id: record.pet_id,
        })
    }

    /// Create the billing customer and record its id. Failures are logged.
    async fn register_billing(&self, id: CustomerId, contact: &NewCustomer) -> Option<String> {
        let request = BillingCustomer {
            id,
            name: &contact.name,
            email: &contact.email,
            phone: contact.phone.as_str(),
            document: contact.document.as_ref().map(Cpf::as_str),
        };

        let billing_id = match self.billing.create_customer(&request).await {
            Ok(billing_id) => billing_id,
            Err(e) => {
                warn!(customer_id = %id, error = %e, "Billing customer creation failed");
                return None;
            }
        };

        if let Err(e) = self.store.set_billing_customer_id(id, &billing_id).await {
            warn!(customer_id = %id, error = %e, "Failed to record billing customer id");
        }
        Some(billing_id)
    }
}

/// Run a postal code autofill for the wizard.
///
/// Returns whether the form changed. Lookup failures and stale responses
/// leave the form untouched. Staleness is judged against `wizard` itself;
/// callers sharing the wizard between requests must reload it before
/// applying the response.
///
/// # Errors
///
/// Returns `OnboardingError::InvalidStep` outside the address step.
pub async fn autofill_postal_code<R>(
    resolver: &R,
    wizard: &mut OnboardingWizard,
    raw: &str,
) -> Result<bool, OnboardingError>
where
    R: PostalCodeResolver,
{
    let Some(request) = wizard.set_postal_code(raw)? else {
        return Ok(false);
    };
    let Some(address) = resolve_quietly(resolver, &request.postal_code).await else {
        return Ok(false);
    };
    Ok(wizard.apply_postal_address(&request, &address))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use petbox_core::{PetGender, PetSize, Phone, Species};

    use super::*;
    use crate::db::memory::{FailPoint, MemoryStore};
    use crate::models::AllergySelection;
    use crate::services::fakes::{FakeBilling, FakePostalCodes};
    use crate::services::postal_code::PostalAddress;

    fn pet() -> PetProfile {
        PetProfile {
            name: "Mel".to_owned(),
            species: Species::Cat,
            breed: Some("SRD".to_owned()),
            size: PetSize::Small,
            gender: PetGender::Female,
            birth_date: None,
            allergies: AllergySelection::from_items(["Frango"]),
        }
    }

    fn address() -> AddressInput {
        AddressInput {
            street: "Rua das Flores".to_owned(),
            number: "42".to_owned(),
            city: "Curitiba".to_owned(),
            state: "PR".to_owned(),
            postal_code: "80010-000".to_owned(),
            ..AddressInput::default()
        }
    }

    fn seeded_customer(billing: Option<&str>) -> Customer {
        Customer {
            id: CustomerId::generate(),
            name: "Bruno Alves".to_owned(),
            email: "bruno@example.com".to_owned(),
            phone: Phone::parse("41999990000").unwrap(),
            document: Some(Cpf::parse("11122233344").unwrap()),
            billing_customer_id: billing.map(str::to_owned),
            created_at: Utc::now() - Duration::days(30),
        }
    }

    async fn walk_to_address<S: CustomerStore, B: BillingProvider>(
        service: &OnboardingService<'_, S, B>,
        phone: &str,
    ) -> OnboardingWizard {
        let mut wizard = OnboardingWizard::new();
        service
            .check(
                &mut wizard,
                &IdentificationInput {
                    phone: phone.to_owned(),
                    document: String::new(),
                },
            )
            .await
            .unwrap();
        let form = wizard.form().clone();
        wizard
            .register(&PersonalDataInput {
                name: if form.name.is_empty() {
                    "Joana Reis".to_owned()
                } else {
                    form.name
                },
                email: if form.email.is_empty() {
                    "joana@example.com".to_owned()
                } else {
                    form.email
                },
                phone: form.phone,
                document: form.document,
            })
            .unwrap();
        wizard
    }

    #[tokio::test]
    async fn test_new_customer_creates_everything_once() {
        let store = MemoryStore::new();
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "41988887777").await;
        let completion = service
            .create_onboarding(&mut wizard, &address(), &pet())
            .await
            .unwrap();

        let customers = store.customers();
        assert_eq!(customers.len(), 1);
        assert_eq!(store.addresses().len(), 1);
        assert_eq!(store.pets().len(), 1);
        assert_eq!(store.addresses()[0].customer_id, customers[0].id);
        assert_eq!(store.pets()[0].customer_id, customers[0].id);
        assert_eq!(completion.customer_id, customers[0].id);
        assert_eq!(completion.pet_id, store.pets()[0].id);

        assert_eq!(billing.calls(), vec![customers[0].id]);
        assert_eq!(completion.billing_customer_id.as_deref(), Some("cus_0001"));
        assert_eq!(
            customers[0].billing_customer_id.as_deref(),
            Some("cus_0001")
        );
    }

    #[tokio::test]
    async fn test_existing_customer_is_reused() {
        let store = MemoryStore::new();
        let existing = seeded_customer(Some("cus_existing"));
        store.insert_customer(existing.clone());
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "(41) 99999-0000").await;
        assert_eq!(wizard.form().name, "Bruno Alves");

        let completion = service
            .create_onboarding(&mut wizard, &address(), &pet())
            .await
            .unwrap();

        assert_eq!(store.customers().len(), 1);
        assert_eq!(completion.customer_id, existing.id);
        assert_eq!(store.pets()[0].customer_id, existing.id);
        assert!(billing.calls().is_empty());
        assert_eq!(
            completion.billing_customer_id.as_deref(),
            Some("cus_existing")
        );
    }

    #[tokio::test]
    async fn test_existing_customer_without_billing_gets_one() {
        let store = MemoryStore::new();
        let existing = seeded_customer(None);
        store.insert_customer(existing.clone());
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "41999990000").await;
        service
            .create_onboarding(&mut wizard, &address(), &pet())
            .await
            .unwrap();

        assert_eq!(billing.calls(), vec![existing.id]);
        assert_eq!(
            store.customers()[0].billing_customer_id.as_deref(),
            Some("cus_0001")
        );
    }

    #[tokio::test]
    async fn test_billing_failure_is_not_fatal() {
        let store = MemoryStore::new();
        let billing = FakeBilling::failing();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "41988887777").await;
        let completion = service
            .create_onboarding(&mut wizard, &address(), &pet())
            .await
            .unwrap();

        assert_eq!(completion.billing_customer_id, None);
        assert_eq!(store.customers()[0].billing_customer_id, None);
        assert_eq!(store.pets().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_stores_nothing() {
        let store = MemoryStore::new();
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "41988887777").await;
        store.fail_at(FailPoint::PetInsert);
        let err = service
            .create_onboarding(&mut wizard, &address(), &pet())
            .await
            .unwrap_err();

        assert!(matches!(err, OnboardingError::Persistence(_)));
        assert!(store.customers().is_empty());
        assert!(store.addresses().is_empty());
        assert!(billing.calls().is_empty());
        assert_eq!(wizard.step(), OnboardingStep::Address);
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_advance() {
        let store = MemoryStore::new();
        store.fail_at(FailPoint::CustomerLookup);
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = OnboardingWizard::new();
        let err = service
            .check(
                &mut wizard,
                &IdentificationInput {
                    phone: "41988887777".to_owned(),
                    document: String::new(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OnboardingError::Lookup(_)));
        assert_eq!(wizard, OnboardingWizard::new());
    }

    #[tokio::test]
    async fn test_allergy_sentinel_not_persisted() {
        let store = MemoryStore::new();
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut profile = pet();
        profile.allergies.toggle("Nenhuma");
        let mut wizard = walk_to_address(&service, "41988887777").await;
        service
            .create_onboarding(&mut wizard, &address(), &profile)
            .await
            .unwrap();

        assert!(store.pets()[0].allergies.is_empty());
    }

    #[tokio::test]
    async fn test_autofill_fills_address() {
        let store = MemoryStore::new();
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);
        let postal = FakePostalCodes::new().with(
            "80010000",
            PostalAddress {
                street: "Rua XV de Novembro".to_owned(),
                neighborhood: "Centro".to_owned(),
                city: "Curitiba".to_owned(),
                state: "PR".to_owned(),
            },
        );

        let mut wizard = walk_to_address(&service, "41988887777").await;
        let partial = autofill_postal_code(&postal, &mut wizard, "8001").await;
        assert!(!partial.unwrap());
        let complete = autofill_postal_code(&postal, &mut wizard, "80010-000").await;
        assert!(complete.unwrap());
        assert_eq!(wizard.form().street, "Rua XV de Novembro");
    }

    #[tokio::test]
    async fn test_autofill_failure_leaves_fields() {
        let store = MemoryStore::new();
        let billing = FakeBilling::new();
        let service = OnboardingService::new(&store, &billing);

        let mut wizard = walk_to_address(&service, "41988887777").await;
        let postal = FakePostalCodes::failing();
        let changed = autofill_postal_code(&postal, &mut wizard, "80010000")
            .await
            .unwrap();

        assert!(!changed);
        assert!(wizard.form().street.is_empty());
        assert_eq!(wizard.form().postal_code, "80010000");
    }
}
