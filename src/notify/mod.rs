//! Sales notifications for started checkouts.

pub mod whatsapp;

use async_trait::async_trait;

use crate::error::NotifyError;

pub use whatsapp::TwilioWhatsApp;

/// Sends a short text to the sales team.
#[async_trait]
pub trait LeadNotifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}
