//! Onboarding wizard route handlers.
//!
//! The wizard lives in the session under `onboarding` and is written back
//! only after a step succeeds. A completed onboarding replaces it with the
//! completion bundle under `onboarding_completion`.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::CustomerRepository;
use crate::error::{AppError, Result, set_sentry_user};
use crate::models::{OnboardingCompletion, OrderContext, session, session_keys};
use crate::routes::checkout::order_for;
use crate::services::checkout::CheckoutSession;
use crate::services::onboarding::{
    AddressInput, IdentificationInput, OnboardingForm, OnboardingService, OnboardingStep,
    OnboardingWizard, PersonalDataInput,
};
use crate::services::postal_code::{PostalCodeResolver, resolve_quietly};
use crate::state::AppState;

const MISSING_PET: &str = "preencha o perfil do pet";

/// Wizard snapshot.
#[derive(Debug, Serialize)]
pub struct WizardView {
    pub step: OnboardingStep,
    pub form: OnboardingForm,
    /// Whether the identification step matched a stored customer.
    pub customer_found: bool,
}

impl From<&OnboardingWizard> for WizardView {
    fn from(wizard: &OnboardingWizard) -> Self {
        Self {
            step: wizard.step(),
            form: wizard.form().clone(),
            customer_found: wizard.existing_customer().is_some(),
        }
    }
}

/// Postal code autofill form.
#[derive(Debug, Deserialize)]
pub struct PostalCodeForm {
    #[serde(default)]
    pub postal_code: String,
}

/// Postal code autofill response.
#[derive(Debug, Serialize)]
pub struct PostalCodeView {
    #[serde(flatten)]
    pub wizard: WizardView,
    /// Whether the address fields were filled from the lookup.
    pub filled: bool,
}

/// Final submission response.
#[derive(Debug, Serialize)]
pub struct SubmitView {
    pub completion: OnboardingCompletion,
    pub order: OrderContext,
}

async fn load_wizard(session: &Session) -> Result<OnboardingWizard> {
    Ok(session::load(session, session_keys::ONBOARDING).await?)
}

async fn store_wizard(session: &Session, wizard: &OnboardingWizard) -> Result<Json<WizardView>> {
    session::store(session, session_keys::ONBOARDING, wizard).await?;
    Ok(Json(WizardView::from(wizard)))
}

/// Current wizard state.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<WizardView>> {
    let wizard = load_wizard(&session).await?;
    Ok(Json(WizardView::from(&wizard)))
}

/// Identification step.
#[instrument(skip_all)]
pub async fn check(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<IdentificationInput>,
) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    let customers = CustomerRepository::new(state.pool());
    let service = OnboardingService::new(&customers, state.billing());

    service.check(&mut wizard, &input).await?;
    store_wizard(&session, &wizard).await
}

/// Personal data step.
#[instrument(skip_all)]
pub async fn register(
    session: Session,
    Json(input): Json<PersonalDataInput>,
) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    wizard.register(&input)?;
    store_wizard(&session, &wizard).await
}

/// Go back one step, keeping everything typed so far.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Json<WizardView>> {
    let mut wizard = load_wizard(&session).await?;
    wizard.back();
    store_wizard(&session, &wizard).await
}

/// Store the typed CEP and autofill the address when it is complete.
#[instrument(skip_all)]
pub async fn postal_code(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PostalCodeForm>,
) -> Result<Json<PostalCodeView>> {
    let (wizard, filled) =
        autofill_in_session(state.postal_codes(), &session, &form.postal_code).await?;
    Ok(Json(PostalCodeView {
        wizard: WizardView::from(&wizard),
        filled,
    }))
}

/// Postal autofill against the wizard stored in the session.
///
/// The new postal generation is saved before the lookup and the response is
/// applied to a freshly reloaded wizard, so a slow lookup issued by an
/// earlier request of the same visitor cannot overwrite a newer code.
async fn autofill_in_session<R>(
    resolver: &R,
    session: &Session,
    raw: &str,
) -> Result<(OnboardingWizard, bool)>
where
    R: PostalCodeResolver,
{
    let mut wizard = load_wizard(session).await?;
    let request = wizard.set_postal_code(raw)?;
    session::store(session, session_keys::ONBOARDING, &wizard).await?;
    let Some(request) = request else {
        return Ok((wizard, false));
    };
    session::save_now(session).await?;

    let address = resolve_quietly(resolver, &request.postal_code).await;

    session::reload(session).await?;
    let mut wizard = load_wizard(session).await?;
    let filled = address.is_some_and(|address| wizard.apply_postal_address(&request, &address));
    if filled {
        session::store(session, session_keys::ONBOARDING, &wizard).await?;
        session::save_now(session).await?;
    }
    Ok((wizard, filled))
}

/// Final submission: persist the onboarding and return the order context.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(address): Json<AddressInput>,
) -> Result<Json<SubmitView>> {
    let checkout: CheckoutSession = session::load(&session, session_keys::CHECKOUT).await?;
    let pet = checkout
        .pet
        .ok_or_else(|| AppError::BadRequest(MISSING_PET.to_string()))?;

    let mut wizard = load_wizard(&session).await?;
    let customers = CustomerRepository::new(state.pool());
    let service = OnboardingService::new(&customers, state.billing());
    let completion = service.create_onboarding(&mut wizard, &address, &pet).await?;

    set_sentry_user(&completion.customer_id, Some(&completion.customer_email));
    session
        .insert(session_keys::ONBOARDING_COMPLETION, &completion)
        .await?;
    session
        .remove::<OnboardingWizard>(session_keys::ONBOARDING)
        .await?;

    let order = order_for(&state, &session, &completion).await?;
    Ok(Json(SubmitView { completion, order }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;
    use tower_sessions::MemoryStore;

    use petbox_core::PostalCode;

    use super::*;
    use crate::services::fakes::FakePostalCodes;
    use crate::services::postal_code::{PostalAddress, PostalCodeError};

    const SAO_PAULO_CEP: &str = "01001000";
    const RIO_CEP: &str = "20040020";

    /// Resolver whose São Paulo lookup waits until `release` is called.
    struct HeldResolver {
        inner: FakePostalCodes,
        gate: Notify,
    }

    impl HeldResolver {
        fn new() -> Self {
            Self {
                inner: FakePostalCodes::new()
                    .with(SAO_PAULO_CEP, place("Praça da Sé", "São Paulo", "SP"))
                    .with(RIO_CEP, place("Rua da Assembleia", "Rio de Janeiro", "RJ")),
                gate: Notify::new(),
            }
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    impl PostalCodeResolver for HeldResolver {
        async fn resolve(
            &self,
            code: &PostalCode,
        ) -> std::result::Result<Option<PostalAddress>, PostalCodeError> {
            if code.as_str() == SAO_PAULO_CEP {
                self.gate.notified().await;
            }
            self.inner.resolve(code).await
        }
    }

    fn place(street: &str, city: &str, state: &str) -> PostalAddress {
        PostalAddress {
            street: street.to_owned(),
            neighborhood: "Centro".to_owned(),
            city: city.to_owned(),
            state: state.to_owned(),
        }
    }

    fn wizard_at_address_step() -> OnboardingWizard {
        let mut wizard = OnboardingWizard::new();
        wizard.apply_check(
            &IdentificationInput {
                phone: "11988887777".to_owned(),
                document: String::new(),
            },
            None,
        );
        wizard
            .register(&PersonalDataInput {
                name: "Ana Souza".to_owned(),
                email: "ana@example.com".to_owned(),
                phone: "11988887777".to_owned(),
                document: String::new(),
            })
            .unwrap();
        wizard
    }

    /// Saves a wizard at the address step and returns the session store.
    async fn stored_session() -> (Arc<MemoryStore>, Session) {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store.clone(), None);
        session::store(&session, session_keys::ONBOARDING, &wizard_at_address_step())
            .await
            .unwrap();
        session.save().await.unwrap();
        (store, session)
    }

    #[tokio::test]
    async fn test_autofill_fills_stored_wizard() {
        let (store, session) = stored_session().await;
        let resolver = HeldResolver::new();

        let (wizard, filled) = autofill_in_session(&resolver, &session, "20040-020")
            .await
            .unwrap();
        assert!(filled);
        assert_eq!(wizard.form().city, "Rio de Janeiro");

        let fresh = Session::new(session.id(), store, None);
        let stored = load_wizard(&fresh).await.unwrap();
        assert_eq!(stored.form().postal_code, RIO_CEP);
        assert_eq!(stored.form().state, "RJ");
    }

    #[tokio::test]
    async fn test_incomplete_code_skips_lookup() {
        let (_store, session) = stored_session().await;

        let (wizard, filled) = autofill_in_session(&HeldResolver::new(), &session, "0100")
            .await
            .unwrap();
        assert!(!filled);
        assert_eq!(wizard.form().postal_code, "0100");
        assert!(wizard.form().city.is_empty());
    }

    #[tokio::test]
    async fn test_slow_older_lookup_is_discarded() {
        let (store, first) = stored_session().await;
        // Two overlapping requests of the same visitor.
        let second = Session::new(first.id(), store.clone(), None);
        let older = Session::new(first.id(), store.clone(), None);
        drop(first);
        let resolver = HeldResolver::new();

        let newer = async {
            let result = autofill_in_session(&resolver, &second, RIO_CEP).await;
            resolver.release();
            result
        };
        let (old_result, new_result) =
            tokio::join!(autofill_in_session(&resolver, &older, SAO_PAULO_CEP), newer);

        let (_, old_filled) = old_result.unwrap();
        let (_, new_filled) = new_result.unwrap();
        assert!(!old_filled);
        assert!(new_filled);

        let fresh = Session::new(older.id(), store, None);
        let stored = load_wizard(&fresh).await.unwrap();
        assert_eq!(stored.form().postal_code, RIO_CEP);
        assert_eq!(stored.form().city, "Rio de Janeiro");
    }

    #[tokio::test]
    async fn test_autofill_outside_address_step_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        let err = autofill_in_session(&HeldResolver::new(), &session, RIO_CEP)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Onboarding(crate::services::onboarding::OnboardingError::InvalidStep { .. })
        ));
    }
}
