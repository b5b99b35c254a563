//! WhatsApp notifications through the Twilio Messages API.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::{TwilioConfig, http_client};
use crate::error::NotifyError;

use super::LeadNotifier;

/// WhatsApp caps a message body at 1600 characters.
const WHATSAPP_MAX_BODY: usize = 1600;

pub struct TwilioWhatsApp {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioWhatsApp {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: http_client(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    async fn send_to(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        let form = [
            ("From", whatsapp_address(&self.config.from_number)),
            ("To", whatsapp_address(to)),
            ("Body", body.to_string()),
        ];

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::SendFailed {
                name: "whatsapp".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(NotifyError::SendFailed {
                name: "whatsapp".into(),
                reason: format!("Twilio returned {status}: {err}"),
            });
        }

        tracing::debug!(to = %to, "WhatsApp notification sent");
        Ok(())
    }
}

#[async_trait]
impl LeadNotifier for TwilioWhatsApp {
    fn name(&self) -> &str {
        "whatsapp"
    }

    /// Send to every configured number. Fails if any single send fails,
    /// after attempting all of them.
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let body = truncate_body(text);
        let mut first_err = None;

        for to in &self.config.to_numbers {
            if let Err(e) = self.send_to(to, &body).await {
                tracing::warn!(to = %to, "WhatsApp notification failed: {}", e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

fn truncate_body(text: &str) -> String {
    if text.chars().count() <= WHATSAPP_MAX_BODY {
        return text.to_string();
    }
    let mut body: String = text.chars().take(WHATSAPP_MAX_BODY - 1).collect();
    body.push('…');
    body
}
