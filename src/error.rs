//! Error types for WarmeLeads.

use uuid::Uuid;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Input the prospect has to fix before the conversation may continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing contact field: {0}")]
    MissingContactField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(i64),
}

/// Errors raised by funnel operations.
#[derive(Debug, thiserror::Error)]
pub enum FunnelError {
    #[error("Conversation {0} not found")]
    SessionNotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),
}

/// Errors from the payment-session boundary.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Payment provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Payment provider {provider} rejected the request ({status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("No payment provider configured")]
    NotConfigured,
}

impl CheckoutError {
    /// Whether the prospect can retry the same checkout.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::NotConfigured)
    }
}

/// Errors from the sales notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notifier {name} failed to send: {reason}")]
    SendFailed { name: String, reason: String },
}
