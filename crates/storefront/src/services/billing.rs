//! Billing provider client.
//!
//! The provider exposes a `create-customer` function that registers a
//! customer and returns its id. Onboarding calls it after the local
//! transaction commits; failures are logged and never block the checkout.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use petbox_core::CustomerId;

use crate::config::BillingConfig;

/// Function name appended to the configured base URL.
const CREATE_CUSTOMER_PATH: &str = "create-customer";

/// Errors that can occur when calling the billing provider.
#[derive(Debug, Error)]
pub enum BillingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client could not be built from configuration.
    #[error("Invalid billing configuration: {0}")]
    Config(String),
}

/// Customer data sent to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct BillingCustomer<'a> {
    pub id: CustomerId,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub document: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateCustomerResponse {
    #[serde(rename = "customerId", alias = "customer_id", alias = "id")]
    customer_id: String,
}

/// Registers customers with the billing provider.
#[allow(async_fn_in_trait)]
pub trait BillingProvider: Send + Sync {
    /// Create a customer and return the provider's id for it.
    async fn create_customer(
        &self,
        customer: &BillingCustomer<'_>,
    ) -> Result<String, BillingError>;
}

/// HTTP client for the billing provider.
#[derive(Clone)]
pub struct BillingClient {
    client: reqwest::Client,
    create_customer_url: Url,
}

impl BillingClient {
    /// Create a new billing client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BillingConfig) -> Result<Self, BillingError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| BillingError::Config(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            create_customer_url: function_url(&config.functions_url, CREATE_CUSTOMER_PATH)?,
        })
    }
}

impl BillingProvider for BillingClient {
    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn create_customer(
        &self,
        customer: &BillingCustomer<'_>,
    ) -> Result<String, BillingError> {
        let response = self
            .client
            .post(self.create_customer_url.clone())
            .json(customer)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_create_customer(&body)
    }
}

/// Join a function name onto the base URL, keeping the base path.
fn function_url(base: &Url, name: &str) -> Result<Url, BillingError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(name)
        .map_err(|e| BillingError::Config(format!("Invalid functions URL: {e}")))
}

fn parse_create_customer(body: &str) -> Result<String, BillingError> {
    let parsed: CreateCustomerResponse =
        serde_json::from_str(body).map_err(|e| BillingError::Parse(e.to_string()))?;
    if parsed.customer_id.trim().is_empty() {
        return Err(BillingError::Parse("empty customer id".to_owned()));
    }
    Ok(parsed.customer_id)
}
