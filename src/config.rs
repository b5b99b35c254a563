//! Configuration types, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP/WebSocket server binds to.
    pub port: u16,
    /// Path of the libSQL database holding the session slots.
    pub db_path: String,
    /// Simulated "typing" delay before a step prompt is appended.
    pub typing_delay: Duration,
    /// Default checkout currency (ISO 4217, lowercase).
    pub currency: String,
    /// Idle time after which a live conversation is dropped from memory.
    pub session_idle_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: "./data/warmeleads.db".to_string(),
            typing_delay: Duration::from_millis(1200),
            currency: "eur".to_string(),
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl AppConfig {
    /// Build config from `WARMELEADS_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match std::env::var("WARMELEADS_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "WARMELEADS_PORT".into(),
                message: format!("not a port number: {raw}"),
            })?,
            Err(_) => defaults.port,
        };

        let db_path = std::env::var("WARMELEADS_DB_PATH").unwrap_or(defaults.db_path);

        let typing_delay = std::env::var("WARMELEADS_TYPING_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.typing_delay);

        let currency = std::env::var("WARMELEADS_CURRENCY")
            .map(|c| c.trim().to_lowercase())
            .unwrap_or(defaults.currency);

        let session_idle_timeout = match std::env::var("WARMELEADS_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    key: "WARMELEADS_SESSION_IDLE_SECS".into(),
                    message: format!("not a number of seconds: {raw}"),
                })?,
            Err(_) => defaults.session_idle_timeout,
        };

        Ok(Self {
            port,
            db_path,
            typing_delay,
            currency,
            session_idle_timeout,
        })
    }
}

/// Upper bound on a single Stripe or Twilio API call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by the provider integrations. Every request is
/// bounded by [`PROVIDER_TIMEOUT`].
pub(crate) fn http_client() -> reqwest::Client {
    match reqwest::Client::builder().timeout(PROVIDER_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Failed to build HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        }
    }
}

/// Stripe checkout configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    pub api_base: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl StripeConfig {
    /// Returns `None` if `STRIPE_SECRET_KEY` is not set (checkout disabled).
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY").ok()?;
        let site = std::env::var("WARMELEADS_SITE_URL")
            .unwrap_or_else(|_| "https://www.warmeleads.eu".to_string());

        Some(Self {
            secret_key: SecretString::from(secret_key),
            api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            success_url: std::env::var("STRIPE_SUCCESS_URL").unwrap_or_else(|_| {
                format!("{site}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}")
            }),
            cancel_url: std::env::var("STRIPE_CANCEL_URL")
                .unwrap_or_else(|_| format!("{site}/checkout/cancel")),
        })
    }
}

/// Twilio WhatsApp configuration.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender number, without the `whatsapp:` prefix.
    pub from_number: String,
    /// Sales team numbers to notify.
    pub to_numbers: Vec<String>,
    pub api_base: String,
}

impl TwilioConfig {
    /// Returns `None` if `TWILIO_ACCOUNT_SID` is not set or no recipients
    /// are configured (notifications disabled).
    pub fn from_env() -> Option<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok()?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default();
        let from_number = std::env::var("TWILIO_WHATSAPP_FROM").unwrap_or_default();

        let to_numbers: Vec<String> = std::env::var("TWILIO_WHATSAPP_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if to_numbers.is_empty() {
            return None;
        }

        Some(Self {
            account_sid,
            auth_token: SecretString::from(auth_token),
            from_number,
            to_numbers,
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
        })
    }
}
