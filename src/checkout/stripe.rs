//! Stripe Checkout — customers keyed by email, one-off payment sessions.
//!
//! Talks to the Stripe REST API directly with form-encoded requests.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{StripeConfig, http_client};
use crate::error::CheckoutError;

use super::{CheckoutBridge, CheckoutRequest, CheckoutSession};

const PROVIDER: &str = "stripe";

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe implementation of the checkout bridge.
pub struct StripeCheckout {
    config: StripeConfig,
    client: reqwest::Client,
}

impl StripeCheckout {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            client: http_client(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.api_base.trim_end_matches('/'))
    }

    /// Reuse the first customer with this email, or create one.
    async fn find_or_create_customer(
        &self,
        request: &CheckoutRequest,
    ) -> Result<String, CheckoutError> {
        let email = request.customer.email.trim();

        let resp = self
            .client
            .get(self.api_url("customers"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(request_failed)?;
        let existing: StripeList<StripeCustomer> = parse_response(resp).await?;

        if let Some(customer) = existing.data.into_iter().next() {
            debug!(customer_id = %customer.id, "Reusing Stripe customer");
            return Ok(customer.id);
        }

        let contact = &request.customer;
        let mut form = vec![("email", email.to_string())];
        if !contact.name.trim().is_empty() {
            form.push(("name", contact.name.trim().to_string()));
        }
        if !contact.phone.trim().is_empty() {
            form.push(("phone", contact.phone.trim().to_string()));
        }
        if !contact.company.trim().is_empty() {
            form.push(("metadata[company]", contact.company.trim().to_string()));
        }

        let resp = self
            .client
            .post(self.api_url("customers"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(request_failed)?;
        let customer: StripeCustomer = parse_response(resp).await?;

        info!(customer_id = %customer.id, "Created Stripe customer");
        Ok(customer.id)
    }
}

#[async_trait]
impl CheckoutBridge for StripeCheckout {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        request.validate()?;

        let customer_id = self.find_or_create_customer(request).await?;
        let order = &request.order;

        let form = vec![
            ("mode", "payment".to_string()),
            ("customer", customer_id),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                order.product_name(),
            ),
            ("metadata[conversation_id]", order.conversation_id.to_string()),
            ("metadata[package]", order.package.to_string()),
            ("metadata[quantity]", order.quantity.to_string()),
        ];

        let resp = self
            .client
            .post(self.api_url("checkout/sessions"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(request_failed)?;
        let session: StripeSession = parse_response(resp).await?;

        let url = session.url.ok_or_else(|| CheckoutError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: format!("session {} has no redirect url", session.id),
        })?;

        info!(
            session_id = %session.id,
            conversation_id = %order.conversation_id,
            amount = request.amount,
            "Stripe checkout session created"
        );

        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }
}

fn request_failed(e: reqwest::Error) -> CheckoutError {
    CheckoutError::RequestFailed {
        provider: PROVIDER.into(),
        reason: e.to_string(),
    }
}

/// Decode a successful response, or turn Stripe's error body into a
/// `CheckoutError::Provider`.
async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, CheckoutError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(body);
        warn!(status = %status, "Stripe request rejected: {}", message);
        return Err(CheckoutError::Provider {
            provider: PROVIDER.into(),
            status: status.as_u16(),
            message,
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| CheckoutError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        })
}
