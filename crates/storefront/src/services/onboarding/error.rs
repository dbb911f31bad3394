//! Onboarding error types.

use thiserror::Error;

use super::wizard::OnboardingStep;
use crate::db::RepositoryError;

/// Errors that can occur while moving through the onboarding wizard.
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Input rejected; the message is shown to the visitor as-is.
    #[error("{0}")]
    Validation(String),

    /// Action not allowed at the wizard's current step.
    #[error("action requires step {expected}, wizard is at {actual}")]
    InvalidStep {
        expected: OnboardingStep,
        actual: OnboardingStep,
    },

    /// Customer lookup failed; the wizard did not advance.
    #[error("customer lookup failed: {0}")]
    Lookup(#[source] RepositoryError),

    /// Onboarding write failed; nothing was persisted.
    #[error("failed to save onboarding: {0}")]
    Persistence(#[source] RepositoryError),
}

impl OnboardingError {
    pub(crate) fn validation(message: &str) -> Self {
        Self::Validation(message.to_owned())
    }
}
