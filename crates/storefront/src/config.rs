//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BILLING_FUNCTIONS_URL` - Base URL of the billing provider functions
//! - `BILLING_API_KEY` - Bearer key for the billing provider (high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `POSTAL_CODE_API_URL` - CEP lookup service (default: <https://viacep.com.br/ws>)
//! - `CHECKOUT_DEFAULT_PLAN_PRICE` - Price used when a plan has no product (default: 89.90)
//! - `CHECKOUT_REVALIDATE_COUPON` - Re-check the applied coupon at handoff (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use petbox_core::Money;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default CEP lookup service.
pub const DEFAULT_POSTAL_CODE_API_URL: &str = "https://viacep.com.br/ws";

/// Price shown when the selected plan has no configured product.
pub const DEFAULT_PLAN_PRICE: &str = "89.90";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Billing provider configuration
    pub billing: BillingConfig,
    /// CEP lookup service base URL
    pub postal_code_api_url: Url,
    /// Checkout behavior
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Billing provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BillingConfig {
    /// Base URL of the provider's functions endpoint
    pub functions_url: Url,
    /// Bearer API key (server-side only)
    pub api_key: SecretString,
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("functions_url", &self.functions_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Checkout pricing options.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Gross price used when the selected plan has no product
    pub default_plan_price: Money,
    /// Re-validate the applied coupon when building the order context
    pub revalidate_coupon: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            default_plan_price: Money::from_cents(8990),
            revalidate_coupon: false,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let billing = BillingConfig::from_env()?;
        let postal_code_api_url = parse_url(
            "POSTAL_CODE_API_URL",
            &get_env_or_default("POSTAL_CODE_API_URL", DEFAULT_POSTAL_CODE_API_URL),
        )?;
        let checkout = CheckoutConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            billing,
            postal_code_api_url,
            checkout,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BillingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            functions_url: parse_url(
                "BILLING_FUNCTIONS_URL",
                &get_required_env("BILLING_FUNCTIONS_URL")?,
            )?,
            api_key: get_validated_secret("BILLING_API_KEY")?,
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_plan_price =
            get_env_or_default("CHECKOUT_DEFAULT_PLAN_PRICE", DEFAULT_PLAN_PRICE)
                .parse::<Money>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "CHECKOUT_DEFAULT_PLAN_PRICE".to_string(),
                        e.to_string(),
                    )
                })?;
        if default_plan_price.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_DEFAULT_PLAN_PRICE".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let revalidate_coupon = parse_bool(
            "CHECKOUT_REVALIDATE_COUPON",
            &get_env_or_default("CHECKOUT_REVALIDATE_COUPON", "false"),
        )?;

        Ok(Self {
            default_plan_price,
            revalidate_coupon,
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get the database URL, falling back to the generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Bits of entropy per character, from character frequencies.
fn entropy_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

/// Why `secret` looks unsafe to deploy, if it does.
fn weak_secret_reason(secret: &str) -> Option<String> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Some(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let entropy = entropy_per_char(secret);
    (entropy < MIN_ENTROPY_BITS_PER_CHAR).then(|| {
        format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        )
    })
}

/// Read a required secret and reject placeholders or low-entropy values.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    if let Some(reason) = weak_secret_reason(&value) {
        return Err(ConfigError::InsecureSecret(key.to_string(), reason));
    }
    Ok(SecretString::from(value))
}
