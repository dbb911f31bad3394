//! Postal code (CEP) lookup.
//!
//! Resolves a CEP into street, neighborhood, city and state through a
//! ViaCEP-compatible service: `GET {base}/{cep}/json/`. Unknown codes come
//! back as `200 {"erro": true}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};
use url::Url;

use petbox_core::PostalCode;

/// Errors that can occur when resolving a postal code.
#[derive(Debug, Error)]
pub enum PostalCodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status}")]
    Api { status: u16 },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Address fields filled in from a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

/// Resolves postal codes into addresses.
#[allow(async_fn_in_trait)]
pub trait PostalCodeResolver: Send + Sync {
    /// Address for `code`, or `None` if the service does not know it.
    async fn resolve(
        &self,
        code: &PostalCode,
    ) -> Result<Option<PostalAddress>, PostalCodeError>;
}

/// HTTP client for a ViaCEP-compatible service.
#[derive(Clone)]
pub struct PostalCodeClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PostalCodeClient {
    /// Create a new client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, PostalCodeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn lookup_url(&self, code: &PostalCode) -> String {
        format!(
            "{}/{}/json/",
            self.base_url.as_str().trim_end_matches('/'),
            code.as_str()
        )
    }
}

impl PostalCodeResolver for PostalCodeClient {
    #[instrument(skip(self), fields(postal_code = %code))]
    async fn resolve(
        &self,
        code: &PostalCode,
    ) -> Result<Option<PostalAddress>, PostalCodeError> {
        let response = self.client.get(self.lookup_url(code)).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PostalCodeError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Parse a ViaCEP response body.
fn parse_response(body: &str) -> Result<Option<PostalAddress>, PostalCodeError> {
    let parsed: ViaCepResponse =
        serde_json::from_str(body).map_err(|e| PostalCodeError::Parse(e.to_string()))?;

    let not_found = match &parsed.erro {
        Some(serde_json::Value::Bool(flag)) => *flag,
        Some(serde_json::Value::String(flag)) => flag == "true",
        _ => false,
    };
    if not_found {
        return Ok(None);
    }

    Ok(Some(PostalAddress {
        street: parsed.logradouro,
        neighborhood: parsed.bairro,
        city: parsed.localidade,
        state: parsed.uf,
    }))
}

/// Resolve `code`, logging failures instead of returning them.
///
/// Autofill is best effort: the visitor can always type the address.
pub async fn resolve_quietly<R>(resolver: &R, code: &PostalCode) -> Option<PostalAddress>
where
    R: PostalCodeResolver,
{
    match resolver.resolve(code).await {
        Ok(Some(address)) => Some(address),
        Ok(None) => {
            warn!(postal_code = %code, "Postal code not found");
            None
        }
        Err(e) => {
            warn!(postal_code = %code, error = %e, "Postal code lookup failed");
            None
        }
    }
}
