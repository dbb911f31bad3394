//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Bodies are JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::PetProfileError;
use crate::services::checkout::CouponError;
use crate::services::onboarding::OnboardingError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Onboarding step failed.
    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    /// Coupon could not be applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Pet form rejected.
    #[error("Pet profile error: {0}")]
    PetProfile(#[from] PetProfileError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Onboarding(err) => match err {
                OnboardingError::Validation(_) => StatusCode::BAD_REQUEST,
                OnboardingError::InvalidStep { .. } => StatusCode::CONFLICT,
                OnboardingError::Lookup(_) => StatusCode::SERVICE_UNAVAILABLE,
                OnboardingError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Coupon(err) => match err {
                CouponError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CouponError::AlreadyApplied => StatusCode::CONFLICT,
                CouponError::Lookup(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::PetProfile(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    // Don't expose internal error details to clients
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "Erro interno. Tente novamente.".to_string()
            }
            Self::Onboarding(err) => match err {
                OnboardingError::Validation(msg) => msg.clone(),
                OnboardingError::InvalidStep { .. } => {
                    "Etapa inválida. Recarregue a página.".to_string()
                }
                OnboardingError::Lookup(_) => {
                    "Não foi possível verificar seu cadastro. Tente novamente.".to_string()
                }
                OnboardingError::Persistence(_) => {
                    "Não foi possível concluir seu cadastro. Tente novamente.".to_string()
                }
            },
            Self::Coupon(err) => err.user_message().to_string(),
            Self::PetProfile(err) => match err {
                PetProfileError::MissingName => "informe o nome do pet".to_string(),
                PetProfileError::InvalidChoice(_) => "opção inválida".to_string(),
            },
            Self::NotFound(what) => format!("{what} não encontrado"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    fn should_report(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Session(_)
                | Self::Internal(_)
                | Self::Onboarding(OnboardingError::Persistence(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.should_report() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if self.status() == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error = %self, "Dependency unavailable");
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the onboarded customer.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Coupon applied", Some(&[("code", "SAVE10")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
