//! The onboarding wizard: `check` → `register` → `address`.
//!
//! The wizard is plain data stored in the session. Every method either
//! succeeds and moves the wizard forward or returns an error without touching
//! it, so a failed step can simply be retried.

use serde::{Deserialize, Serialize};

use petbox_core::{Cpf, CustomerId, Phone, PostalCode, digits_only};

use super::error::OnboardingError;
use crate::models::{
    Customer, CustomerLookup, CustomerRef, NewAddress, NewCustomer, NewOnboarding, PetProfile,
};
use crate::services::postal_code::PostalAddress;

const MISSING_IDENTIFICATION: &str = "informe telefone ou CPF";
const MISSING_PERSONAL_DATA: &str = "preencha nome, e-mail e telefone";
const MISSING_ADDRESS: &str = "preencha rua, número, cidade, estado e CEP";
const INVALID_POSTAL_CODE: &str = "CEP inválido";
const INVALID_PHONE: &str = "telefone inválido";

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Check,
    Register,
    Address,
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Register => write!(f, "register"),
            Self::Address => write!(f, "address"),
        }
    }
}

/// Values typed so far. Kept verbatim (trimmed) across back navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub document: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Customer matched during the identification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingCustomer {
    pub id: CustomerId,
    pub billing_customer_id: Option<String>,
}

/// Identification step input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentificationInput {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub document: String,
}

/// Personal data step input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonalDataInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub document: String,
}

/// Address step input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
}

/// A pending postal code autofill.
///
/// Only the response to the most recent request may be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalRequest {
    pub generation: u64,
    pub postal_code: PostalCode,
}

/// Validated data ready for the onboarding transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub onboarding: NewOnboarding,
    /// Contact details as confirmed by the visitor.
    pub contact: NewCustomer,
    pub existing: Option<ExistingCustomer>,
}

/// Onboarding wizard state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    form: OnboardingForm,
    existing: Option<ExistingCustomer>,
    postal_generation: u64,
}

fn trimmed(value: &str) -> String {
    value.trim().to_owned()
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Submitted value, or the stored one when the submitted field is blank.
fn submitted_or(submitted: &str, stored: &str) -> String {
    let submitted = submitted.trim();
    if submitted.is_empty() {
        stored.to_owned()
    } else {
        submitted.to_owned()
    }
}

impl OnboardingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> OnboardingStep {
        self.step
    }

    #[must_use]
    pub const fn form(&self) -> &OnboardingForm {
        &self.form
    }

    /// Customer matched at the identification step, if any.
    #[must_use]
    pub const fn existing_customer(&self) -> Option<&ExistingCustomer> {
        self.existing.as_ref()
    }

    fn expect_step(&self, expected: OnboardingStep) -> Result<(), OnboardingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(OnboardingError::InvalidStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Validate identification input and build the customer lookup.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside the check step; `Validation` when neither phone
    /// nor CPF was given, or a phone was typed without any digit.
    pub fn lookup_for(
        &self,
        input: &IdentificationInput,
    ) -> Result<CustomerLookup, OnboardingError> {
        self.expect_step(OnboardingStep::Check)?;
        if !input.phone.trim().is_empty() && Phone::parse(&input.phone).is_err() {
            return Err(OnboardingError::validation(INVALID_PHONE));
        }
        CustomerLookup::from_identification(&input.phone, &input.document)
            .ok_or_else(|| OnboardingError::validation(MISSING_IDENTIFICATION))
    }

    /// Record the lookup result and advance to `register`.
    ///
    /// A match pre-fills the contact fields; no match forgets a customer
    /// matched by an earlier attempt along with the fields it filled in.
    pub fn apply_check(&mut self, input: &IdentificationInput, found: Option<&Customer>) {
        self.form.phone = trimmed(&input.phone);
        self.form.document = trimmed(&input.document);

        match found {
            Some(customer) => {
                self.form.name.clone_from(&customer.name);
                self.form.email.clone_from(&customer.email);
                self.form.phone = customer.phone.as_str().to_owned();
                if let Some(document) = &customer.document {
                    self.form.document = document.as_str().to_owned();
                }
                self.existing = Some(ExistingCustomer {
                    id: customer.id,
                    billing_customer_id: customer.billing_customer_id.clone(),
                });
            }
            None => {
                if self.existing.take().is_some() {
                    self.form.name.clear();
                    self.form.email.clear();
                }
            }
        }

        self.step = OnboardingStep::Register;
    }

    /// Confirm personal data and advance to `address`.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside the register step; `Validation` when name, email
    /// or phone is blank, or the phone has no digits.
    pub fn register(&mut self, input: &PersonalDataInput) -> Result<(), OnboardingError> {
        self.expect_step(OnboardingStep::Register)?;

        let name = trimmed(&input.name);
        let email = trimmed(&input.email);
        let phone = trimmed(&input.phone);
        if name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(OnboardingError::validation(MISSING_PERSONAL_DATA));
        }
        if Phone::parse(&phone).is_err() {
            return Err(OnboardingError::validation(INVALID_PHONE));
        }

        self.form.name = name;
        self.form.email = email;
        self.form.phone = phone;
        self.form.document = trimmed(&input.document);
        self.step = OnboardingStep::Address;
        Ok(())
    }

    /// Go back one step. No-op at `check`.
    pub const fn back(&mut self) {
        self.step = match self.step {
            OnboardingStep::Check | OnboardingStep::Register => OnboardingStep::Check,
            OnboardingStep::Address => OnboardingStep::Register,
        };
    }

    /// Store a typed postal code and, once it has eight digits, return the
    /// autofill request to issue.
    ///
    /// Every call invalidates requests issued before it.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside the address step.
    pub fn set_postal_code(
        &mut self,
        raw: &str,
    ) -> Result<Option<PostalRequest>, OnboardingError> {
        self.expect_step(OnboardingStep::Address)?;

        self.form.postal_code = digits_only(raw);
        self.postal_generation = self.postal_generation.wrapping_add(1);

        Ok(PostalCode::parse(&self.form.postal_code)
            .ok()
            .map(|postal_code| PostalRequest {
                generation: self.postal_generation,
                postal_code,
            }))
    }

    /// Apply an autofill response. Returns `false` and leaves the form alone
    /// when the request is stale.
    pub fn apply_postal_address(
        &mut self,
        request: &PostalRequest,
        address: &PostalAddress,
    ) -> bool {
        if request.generation != self.postal_generation
            || request.postal_code.as_str() != self.form.postal_code
        {
            return false;
        }

        self.form.street.clone_from(&address.street);
        self.form.neighborhood.clone_from(&address.neighborhood);
        self.form.city.clone_from(&address.city);
        self.form.state.clone_from(&address.state);
        true
    }

    /// Validate the address step and assemble the onboarding write.
    ///
    /// A blank postal code falls back to the one in the wizard. Blank street,
    /// neighborhood, city or state fall back to the wizard's values only when
    /// the postal code is the one they were filled for, so autofilled fields
    /// need not be resent.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside the address step; `Validation` for missing
    /// address fields, a malformed CEP or a phone without digits.
    pub fn prepare_submission(
        &mut self,
        address: &AddressInput,
        pet: &PetProfile,
    ) -> Result<Submission, OnboardingError> {
        self.expect_step(OnboardingStep::Address)?;

        let mut form = self.form.clone();
        form.postal_code = digits_only(&submitted_or(&address.postal_code, &form.postal_code));
        if form.postal_code != self.form.postal_code {
            // Stored fields were filled for a different CEP.
            form.street.clear();
            form.neighborhood.clear();
            form.city.clear();
            form.state.clear();
        }
        form.street = submitted_or(&address.street, &form.street);
        form.number = trimmed(&address.number);
        form.complement = trimmed(&address.complement);
        form.neighborhood = submitted_or(&address.neighborhood, &form.neighborhood);
        form.city = submitted_or(&address.city, &form.city);
        form.state = submitted_or(&address.state, &form.state).to_uppercase();

        if [&form.street, &form.number, &form.city, &form.state, &form.postal_code]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(OnboardingError::validation(MISSING_ADDRESS));
        }
        let postal_code = PostalCode::parse(&form.postal_code)
            .map_err(|_| OnboardingError::validation(INVALID_POSTAL_CODE))?;
        let phone =
            Phone::parse(&form.phone).map_err(|_| OnboardingError::validation(INVALID_PHONE))?;

        let contact = NewCustomer {
            name: form.name.clone(),
            email: form.email.clone(),
            phone,
            document: Cpf::parse(&form.document).ok(),
        };
        let customer = self.existing.as_ref().map_or_else(
            || CustomerRef::New(contact.clone()),
            |existing| CustomerRef::Existing(existing.id),
        );
        let new_address = NewAddress {
            street: form.street.clone(),
            number: form.number.clone(),
            complement: optional(&form.complement),
            neighborhood: optional(&form.neighborhood),
            city: form.city.clone(),
            state: form.state.clone(),
            postal_code,
            is_default: true,
        };

        self.form = form;
        Ok(Submission {
            onboarding: NewOnboarding {
                customer,
                address: new_address,
                pet: pet.to_new_pet(),
            },
            contact,
            existing: self.existing.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use petbox_core::{PetGender, PetSize, Species};

    use super::*;
    use crate::models::AllergySelection;

    fn identification(phone: &str, document: &str) -> IdentificationInput {
        IdentificationInput {
            phone: phone.to_owned(),
            document: document.to_owned(),
        }
    }

    fn personal_data() -> PersonalDataInput {
        PersonalDataInput {
            name: "Ana Souza".to_owned(),
            email: "ana@example.com".to_owned(),
            phone: "(11) 98888-7777".to_owned(),
            document: String::new(),
        }
    }

    fn address() -> AddressInput {
        AddressInput {
            street: "Rua Augusta".to_owned(),
            number: "1500".to_owned(),
            complement: " ".to_owned(),
            neighborhood: "Consolação".to_owned(),
            city: "São Paulo".to_owned(),
            state: "sp".to_owned(),
            postal_code: "01305-100".to_owned(),
        }
    }

    fn pet() -> PetProfile {
        PetProfile {
            name: "Thor".to_owned(),
            species: Species::Dog,
            breed: None,
            size: PetSize::Medium,
            gender: PetGender::Male,
            birth_date: None,
            allergies: AllergySelection::from_items(["Nenhuma"]),
        }
    }

    fn customer() -> Customer {
        Customer {
            id: CustomerId::generate(),
            name: "Carla Lima".to_owned(),
            email: "carla@example.com".to_owned(),
            phone: Phone::parse("11977776666").unwrap(),
            document: Some(Cpf::parse("12345678909").unwrap()),
            billing_customer_id: Some("cus_1".to_owned()),
            created_at: Utc::now(),
        }
    }

    fn at_address() -> OnboardingWizard {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(&identification("11988887777", ""), None);
        wizard.register(&personal_data()).unwrap();
        wizard
    }

    #[test]
    fn test_check_requires_phone_or_document() {
        let wizard = OnboardingWizard::new();
        let err = wizard.lookup_for(&identification("  ", "")).unwrap_err();
        assert_eq!(err.to_string(), MISSING_IDENTIFICATION);
        assert_eq!(wizard.step(), OnboardingStep::Check);
    }

    #[test]
    fn test_check_rejects_phone_without_digits() {
        let wizard = OnboardingWizard::new();
        let err = wizard
            .lookup_for(&identification("abc", "123.456.789-09"))
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_PHONE);
    }

    #[test]
    fn test_match_prefills_contact() {
        let mut wizard = OnboardingWizard::new();
        let found = customer();
        wizard.apply_check(&identification("11977776666", ""), Some(&found));

        assert_eq!(wizard.step(), OnboardingStep::Register);
        assert_eq!(wizard.form().name, "Carla Lima");
        assert_eq!(wizard.form().email, "carla@example.com");
        assert_eq!(wizard.form().document, "12345678909");
        assert_eq!(wizard.existing_customer().unwrap().id, found.id);
    }

    #[test]
    fn test_no_match_forgets_previous_match() {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(&identification("11977776666", ""), Some(&customer()));
        wizard.back();
        wizard.apply_check(&identification("11911110000", ""), None);

        assert!(wizard.existing_customer().is_none());
        assert!(wizard.form().name.is_empty());
        assert!(wizard.form().email.is_empty());
        assert_eq!(wizard.form().phone, "11911110000");
    }

    #[test]
    fn test_recheck_prefers_phone_over_stored_document() {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(&identification("11977776666", ""), Some(&customer()));
        wizard.back();

        let form = wizard.form().clone();
        let lookup = wizard
            .lookup_for(&identification(&form.phone, "98765432100"))
            .unwrap();
        assert_eq!(
            lookup,
            CustomerLookup::Phone(Phone::parse("11977776666").unwrap())
        );
    }

    #[test]
    fn test_register_requires_fields() {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(&identification("11988887777", ""), None);

        let mut input = personal_data();
        input.email = "  ".to_owned();
        assert!(matches!(
            wizard.register(&input),
            Err(OnboardingError::Validation(_))
        ));
        assert_eq!(wizard.step(), OnboardingStep::Register);

        wizard.register(&personal_data()).unwrap();
        assert_eq!(wizard.step(), OnboardingStep::Address);
    }

    #[test]
    fn test_register_rejects_phone_without_digits() {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(&identification("", "123.456.789-09"), None);

        let mut input = personal_data();
        input.phone = "abc".to_owned();
        let err = wizard.register(&input).unwrap_err();
        assert_eq!(err.to_string(), INVALID_PHONE);
        assert_eq!(wizard.step(), OnboardingStep::Register);
    }

    #[test]
    fn test_register_outside_step() {
        let mut wizard = OnboardingWizard::new();
        assert!(matches!(
            wizard.register(&personal_data()),
            Err(OnboardingError::InvalidStep {
                expected: OnboardingStep::Register,
                actual: OnboardingStep::Check,
            })
        ));
    }

    #[test]
    fn test_back_keeps_values() {
        let mut wizard = at_address();
        wizard.back();
        assert_eq!(wizard.step(), OnboardingStep::Register);
        wizard.back();
        assert_eq!(wizard.step(), OnboardingStep::Check);
        wizard.back();
        assert_eq!(wizard.step(), OnboardingStep::Check);
        assert_eq!(wizard.form().name, "Ana Souza");
    }

    #[test]
    fn test_postal_request_only_when_complete() {
        let mut wizard = at_address();
        assert_eq!(wizard.set_postal_code("01305").unwrap(), None);

        let request = wizard.set_postal_code("01305-100").unwrap().unwrap();
        assert_eq!(request.postal_code.as_str(), "01305100");
    }

    #[test]
    fn test_stale_postal_response_discarded() {
        let mut wizard = at_address();
        let first = wizard.set_postal_code("01001-000").unwrap().unwrap();
        let second = wizard.set_postal_code("20040-020").unwrap().unwrap();

        let se = PostalAddress {
            street: "Praça da Sé".to_owned(),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            state: "SP".to_owned(),
        };
        assert!(!wizard.apply_postal_address(&first, &se));
        assert!(wizard.form().street.is_empty());

        let centro = PostalAddress {
            street: "Avenida Rio Branco".to_owned(),
            neighborhood: "Centro".to_owned(),
            city: "Rio de Janeiro".to_owned(),
            state: "RJ".to_owned(),
        };
        assert!(wizard.apply_postal_address(&second, &centro));
        assert_eq!(wizard.form().city, "Rio de Janeiro");
    }

    #[test]
    fn test_retyping_same_code_invalidates_earlier_request() {
        let mut wizard = at_address();
        let first = wizard.set_postal_code("01001000").unwrap().unwrap();
        let _second = wizard.set_postal_code("01001000").unwrap().unwrap();
        assert!(!wizard.apply_postal_address(&first, &PostalAddress::default()));
    }

    #[test]
    fn test_submission_for_new_customer() {
        let mut wizard = at_address();
        let submission = wizard.prepare_submission(&address(), &pet()).unwrap();

        match &submission.onboarding.customer {
            CustomerRef::New(customer) => {
                assert_eq!(customer.phone.as_str(), "11988887777");
                assert_eq!(customer.document, None);
            }
            CustomerRef::Existing(_) => panic!("expected a new customer"),
        }
        let new_address = &submission.onboarding.address;
        assert_eq!(new_address.state, "SP");
        assert_eq!(new_address.complement, None);
        assert!(new_address.is_default);
        assert!(submission.onboarding.pet.allergies.is_empty());
    }

    #[test]
    fn test_submission_reuses_existing_customer() {
        let mut wizard = OnboardingWizard::new();
        let found = customer();
        wizard.apply_check(&identification("11977776666", ""), Some(&found));
        let form = wizard.form().clone();
        wizard
            .register(&PersonalDataInput {
                name: form.name,
                email: form.email,
                phone: form.phone,
                document: form.document,
            })
            .unwrap();

        let submission = wizard.prepare_submission(&address(), &pet()).unwrap();
        assert_eq!(
            submission.onboarding.customer,
            CustomerRef::Existing(found.id)
        );
        assert_eq!(
            submission.existing.unwrap().billing_customer_id.as_deref(),
            Some("cus_1")
        );
    }

    #[test]
    fn test_submission_uses_autofilled_fields() {
        let mut wizard = at_address();
        let request = wizard.set_postal_code("01001000").unwrap().unwrap();
        wizard.apply_postal_address(
            &request,
            &PostalAddress {
                street: "Praça da Sé".to_owned(),
                neighborhood: "Sé".to_owned(),
                city: "São Paulo".to_owned(),
                state: "SP".to_owned(),
            },
        );

        let input = AddressInput {
            number: "1".to_owned(),
            ..AddressInput::default()
        };
        let submission = wizard.prepare_submission(&input, &pet()).unwrap();
        assert_eq!(submission.onboarding.address.street, "Praça da Sé");
        assert_eq!(
            submission.onboarding.address.postal_code.as_str(),
            "01001000"
        );
    }

    #[test]
    fn test_submission_ignores_autofill_for_other_postal_code() {
        let stored = at_address();

        // Two overlapping lookups started from the same stored wizard.
        let mut older = stored.clone();
        let mut newer = stored;
        let old_request = older.set_postal_code("01001000").unwrap().unwrap();
        let new_request = newer.set_postal_code("20040020").unwrap().unwrap();
        assert!(newer.apply_postal_address(
            &new_request,
            &PostalAddress {
                street: "Rua da Assembleia".to_owned(),
                neighborhood: "Centro".to_owned(),
                city: "Rio de Janeiro".to_owned(),
                state: "RJ".to_owned(),
            },
        ));
        assert!(older.apply_postal_address(
            &old_request,
            &PostalAddress {
                street: "Praça da Sé".to_owned(),
                neighborhood: "Sé".to_owned(),
                city: "São Paulo".to_owned(),
                state: "SP".to_owned(),
            },
        ));

        // The older copy was written last; the visitor submits the newer CEP.
        let mut wizard = older;
        let input = AddressInput {
            number: "1".to_owned(),
            postal_code: "20040-020".to_owned(),
            ..AddressInput::default()
        };
        let err = wizard.prepare_submission(&input, &pet()).unwrap_err();
        assert_eq!(err.to_string(), MISSING_ADDRESS);

        let input = AddressInput {
            street: "Rua da Assembleia".to_owned(),
            city: "Rio de Janeiro".to_owned(),
            state: "rj".to_owned(),
            ..input
        };
        let submission = wizard.prepare_submission(&input, &pet()).unwrap();
        let address = submission.onboarding.address;
        assert_eq!(address.postal_code.as_str(), "20040020");
        assert_eq!(address.city, "Rio de Janeiro");
        assert_eq!(address.state, "RJ");
        assert_eq!(address.neighborhood, None);
    }

    #[test]
    fn test_submission_requires_address_fields() {
        let mut wizard = at_address();
        let mut input = address();
        input.number = String::new();

        let err = wizard.prepare_submission(&input, &pet()).unwrap_err();
        assert_eq!(err.to_string(), MISSING_ADDRESS);
        assert!(wizard.form().street.is_empty());
    }

    #[test]
    fn test_submission_rejects_short_postal_code() {
        let mut wizard = at_address();
        let mut input = address();
        input.postal_code = "0130".to_owned();

        let err = wizard.prepare_submission(&input, &pet()).unwrap_err();
        assert_eq!(err.to_string(), INVALID_POSTAL_CODE);
    }
}
