//! Checkout bridge — hands a finished conversation off to a payment
//! provider and returns the URL the prospect is redirected to.

pub mod pricing;
pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutError, ValidationError};
use crate::funnel::model::{ContactInfo, Industry};
use crate::funnel::state::is_valid_email;
use crate::funnel::Recommendation;

pub use pricing::{Quote, quote};
pub use stripe::StripeCheckout;

/// What is being bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDescriptor {
    pub package: Recommendation,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    pub conversation_id: Uuid,
}

impl OrderDescriptor {
    /// Product line shown on the payment page, e.g.
    /// "25x Exclusieve leads (Zonnepanelen)".
    pub fn product_name(&self) -> String {
        match self.industry {
            Some(industry) => format!(
                "{}x {} ({})",
                self.quantity,
                self.package.title(),
                industry.label()
            ),
            None => format!("{}x {}", self.quantity, self.package.title()),
        }
    }
}

/// Request to open a payment session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Amount in minor currency units (cents).
    pub amount: i64,
    /// ISO 4217 currency code, lowercase.
    pub currency: String,
    pub customer: ContactInfo,
    pub order: OrderDescriptor,
}

impl CheckoutRequest {
    /// Reject non-positive amounts and a missing or malformed email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= 0 {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        if self.customer.email.trim().is_empty() {
            return Err(ValidationError::MissingContactField("email"));
        }
        if !is_valid_email(&self.customer.email) {
            return Err(ValidationError::InvalidEmail(self.customer.email.clone()));
        }
        Ok(())
    }
}

/// An opened payment session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// The external payment-session boundary.
#[async_trait]
pub trait CheckoutBridge: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Open a payment session. Implementations must call
    /// `CheckoutRequest::validate` before contacting the provider.
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError>;
}
