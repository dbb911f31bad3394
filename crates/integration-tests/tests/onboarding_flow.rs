//! Onboarding wizard through the order handoff, over the in-memory store.
//!
//! These tests drive the same service calls the HTTP handlers make, with
//! the fake billing provider and postal code resolver.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use rust_decimal::Decimal;

use petbox_core::{DiscountType, Money, Phone, PostalCode};
use petbox_integration_tests::{catalog_store, coupon};
use petbox_storefront::config::CheckoutConfig;
use petbox_storefront::db::memory::{FailPoint, MemoryStore};
use petbox_storefront::models::{PetProfile, PetProfileForm};
use petbox_storefront::services::checkout::{CheckoutService, CheckoutSession};
use petbox_storefront::services::fakes::{FakeBilling, FakePostalCodes};
use petbox_storefront::services::onboarding::{
    AddressInput, IdentificationInput, OnboardingError, OnboardingService, OnboardingStep,
    OnboardingWizard, PersonalDataInput, autofill_postal_code,
};
use petbox_storefront::services::postal_code::PostalAddress;

const PHONE: &str = "(11) 98888-7777";
const CEP: &str = "01001-000";

fn pet() -> PetProfile {
    let mut pet = PetProfile::from_form(PetProfileForm {
        name: "Thor".to_owned(),
        species: "cachorro".to_owned(),
        size: "G".to_owned(),
        gender: "boy".to_owned(),
        allergies: vec!["frango".to_owned()],
        ..PetProfileForm::default()
    })
    .unwrap();
    pet.allergies.toggle("Nenhuma");
    pet.allergies.toggle("milho");
    pet
}

fn resolver() -> FakePostalCodes {
    FakePostalCodes::new().with(
        "01001000",
        PostalAddress {
            street: "Praça da Sé".to_owned(),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            state: "SP".to_owned(),
        },
    )
}

/// Walk a fresh visitor to the address step.
async fn to_address_step(store: &MemoryStore, billing: &FakeBilling) -> OnboardingWizard {
    let service = OnboardingService::new(store, billing);
    let mut wizard = OnboardingWizard::new();

    service
        .check(
            &mut wizard,
            &IdentificationInput {
                phone: PHONE.to_owned(),
                document: String::new(),
            },
        )
        .await
        .unwrap();
    wizard
        .register(&PersonalDataInput {
            name: "Ana Souza".to_owned(),
            email: "ana@example.com".to_owned(),
            phone: PHONE.to_owned(),
            document: "123.456.789-09".to_owned(),
        })
        .unwrap();
    assert_eq!(wizard.step(), OnboardingStep::Address);
    wizard
}

fn address_with_number() -> AddressInput {
    AddressInput {
        number: "100".to_owned(),
        ..AddressInput::default()
    }
}

#[tokio::test]
async fn test_new_customer_to_order_context() {
    let store = catalog_store();
    store.insert_coupon(coupon("BEMVINDO", DiscountType::Fixed, Decimal::new(10, 0)));
    let billing = FakeBilling::new();

    let mut wizard = to_address_step(&store, &billing).await;
    let filled = autofill_postal_code(&resolver(), &mut wizard, CEP)
        .await
        .unwrap();
    assert!(filled);
    assert_eq!(wizard.form().city, "São Paulo");

    let service = OnboardingService::new(&store, &billing);
    let completion = service
        .create_onboarding(&mut wizard, &address_with_number(), &pet())
        .await
        .unwrap();

    let customers = store.customers();
    let addresses = store.addresses();
    let pets = store.pets();
    assert_eq!(customers.len(), 1);
    assert_eq!(addresses.len(), 1);
    assert_eq!(pets.len(), 1);

    let customer = customers.first().unwrap();
    let address = addresses.first().unwrap();
    let stored_pet = pets.first().unwrap();
    assert_eq!(customer.phone, Phone::parse(PHONE).unwrap());
    assert_eq!(address.customer_id, customer.id);
    assert_eq!(address.postal_code, PostalCode::parse(CEP).unwrap());
    assert_eq!(address.street, "Praça da Sé");
    assert_eq!(stored_pet.customer_id, customer.id);
    assert_eq!(stored_pet.allergies, vec!["milho".to_owned()]);

    assert_eq!(billing.calls(), vec![customer.id]);
    assert_eq!(completion.billing_customer_id.as_deref(), Some("cus_0001"));
    assert_eq!(
        customer.billing_customer_id.as_deref(),
        Some("cus_0001"),
        "billing id recorded on the customer"
    );

    let config = CheckoutConfig::default();
    let checkout = CheckoutService::new(&store, &store, &config);
    let plans = checkout.plans().await.unwrap();
    let mut session = CheckoutSession::default();
    checkout
        .apply_coupon(&mut session, "bemvindo", Utc::now())
        .await
        .unwrap();
    let order = checkout
        .order_context(&plans, &mut session, &completion, Utc::now())
        .await
        .unwrap();

    assert_eq!(order.customer_id, customer.id);
    assert_eq!(order.pet_id, stored_pet.id);
    assert_eq!(order.product_value, Money::from_cents(4990));
    assert_eq!(order.discount_amount, Money::from_cents(1000));
    assert_eq!(order.final_price, Money::from_cents(3990));
}

#[tokio::test]
async fn test_returning_customer_is_not_duplicated() {
    let store = catalog_store();
    let billing = FakeBilling::new();

    let mut first = to_address_step(&store, &billing).await;
    autofill_postal_code(&resolver(), &mut first, CEP)
        .await
        .unwrap();
    OnboardingService::new(&store, &billing)
        .create_onboarding(&mut first, &address_with_number(), &pet())
        .await
        .unwrap();

    // Same phone, typed differently, in a new session.
    let service = OnboardingService::new(&store, &billing);
    let mut second = OnboardingWizard::new();
    let found = service
        .check(
            &mut second,
            &IdentificationInput {
                phone: "11988887777".to_owned(),
                document: String::new(),
            },
        )
        .await
        .unwrap();
    assert!(found.is_some());
    assert_eq!(second.form().name, "Ana Souza");
    assert!(second.existing_customer().is_some());

    let confirmed = PersonalDataInput {
        name: second.form().name.clone(),
        email: second.form().email.clone(),
        phone: second.form().phone.clone(),
        document: second.form().document.clone(),
    };
    second.register(&confirmed).unwrap();
    autofill_postal_code(&resolver(), &mut second, CEP)
        .await
        .unwrap();
    let completion = service
        .create_onboarding(&mut second, &address_with_number(), &pet())
        .await
        .unwrap();

    assert_eq!(store.customers().len(), 1);
    assert_eq!(store.addresses().len(), 2);
    assert_eq!(store.pets().len(), 2);
    assert_eq!(billing.calls().len(), 1, "billing customer created once");
    assert_eq!(completion.billing_customer_id.as_deref(), Some("cus_0001"));
}

#[tokio::test]
async fn test_failed_pet_insert_persists_nothing() {
    let store = catalog_store();
    let billing = FakeBilling::new();
    let mut wizard = to_address_step(&store, &billing).await;
    autofill_postal_code(&resolver(), &mut wizard, CEP)
        .await
        .unwrap();

    store.fail_at(FailPoint::PetInsert);
    let err = OnboardingService::new(&store, &billing)
        .create_onboarding(&mut wizard, &address_with_number(), &pet())
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardingError::Persistence(_)));
    assert!(store.customers().is_empty());
    assert!(store.addresses().is_empty());
    assert!(store.pets().is_empty());
    assert!(billing.calls().is_empty());
    assert_eq!(wizard.step(), OnboardingStep::Address);
}

#[tokio::test]
async fn test_postal_outage_keeps_manual_entry_working() {
    let store = catalog_store();
    let billing = FakeBilling::new();
    let mut wizard = to_address_step(&store, &billing).await;

    let filled = autofill_postal_code(&FakePostalCodes::failing(), &mut wizard, CEP)
        .await
        .unwrap();
    assert!(!filled);

    let completion = OnboardingService::new(&store, &billing)
        .create_onboarding(
            &mut wizard,
            &AddressInput {
                street: "Rua Direita".to_owned(),
                number: "5".to_owned(),
                city: "São Paulo".to_owned(),
                state: "sp".to_owned(),
                ..AddressInput::default()
            },
            &pet(),
        )
        .await
        .unwrap();

    let address = store.addresses().into_iter().next().unwrap();
    assert_eq!(address.state, "SP");
    assert_eq!(address.neighborhood, None);
    assert_eq!(address.customer_id, completion.customer_id);
}

#[tokio::test]
async fn test_billing_outage_does_not_block_checkout() {
    let store = catalog_store();
    let billing = FakeBilling::failing();
    let mut wizard = to_address_step(&store, &billing).await;
    autofill_postal_code(&resolver(), &mut wizard, CEP)
        .await
        .unwrap();

    let completion = OnboardingService::new(&store, &billing)
        .create_onboarding(&mut wizard, &address_with_number(), &pet())
        .await
        .unwrap();

    assert_eq!(completion.billing_customer_id, None);
    assert_eq!(store.customers().len(), 1);
}
