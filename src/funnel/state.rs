//! Step controller — tracks which question of the conversation is active.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::model::{ContactInfo, UserProfile};

/// The named steps of the chat questionnaire.
///
/// The conventional order is Welcome → IndustrySelect → CurrentLeads →
/// Challenge → LeadType → Budget → Timeline → CompanySize → Quantity →
/// Recommendation → ContactInfo → Checkout, but callers may jump to any
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationStep {
    Welcome,
    IndustrySelect,
    CurrentLeads,
    Challenge,
    LeadType,
    Budget,
    Timeline,
    CompanySize,
    Quantity,
    Recommendation,
    ContactInfo,
    Checkout,
}

impl ConversationStep {
    pub const ALL: [ConversationStep; 12] = [
        Self::Welcome,
        Self::IndustrySelect,
        Self::CurrentLeads,
        Self::Challenge,
        Self::LeadType,
        Self::Budget,
        Self::Timeline,
        Self::CompanySize,
        Self::Quantity,
        Self::Recommendation,
        Self::ContactInfo,
        Self::Checkout,
    ];

    /// Next step in the conventional order, if any.
    pub fn next(&self) -> Option<ConversationStep> {
        let idx = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// Whether this is the conventional final step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Checkout)
    }
}

impl Default for ConversationStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::IndustrySelect => "industry-select",
            Self::CurrentLeads => "current-leads",
            Self::Challenge => "challenge",
            Self::LeadType => "lead-type",
            Self::Budget => "budget",
            Self::Timeline => "timeline",
            Self::CompanySize => "company-size",
            Self::Quantity => "quantity",
            Self::Recommendation => "recommendation",
            Self::ContactInfo => "contact-info",
            Self::Checkout => "checkout",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ConversationStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.to_string() == s)
            .ok_or_else(|| format!("Unknown conversation step: {s}"))
    }
}

/// Check that the contact details needed for checkout are present.
pub fn validate_contact(contact: Option<&ContactInfo>) -> Result<&ContactInfo, ValidationError> {
    let contact = contact.ok_or(ValidationError::MissingContactField("email"))?;
    if contact.name.trim().is_empty() {
        return Err(ValidationError::MissingContactField("name"));
    }
    if contact.email.trim().is_empty() {
        return Err(ValidationError::MissingContactField("email"));
    }
    if !is_valid_email(&contact.email) {
        return Err(ValidationError::InvalidEmail(contact.email.clone()));
    }
    Ok(contact)
}

/// Loose e-mail shape check: something@domain.tld, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    EMAIL_RE.is_match(email.trim())
}

/// Tracks the active step and when each step was first entered.
#[derive(Debug, Clone, PartialEq)]
pub struct StepController {
    current: ConversationStep,
    step_times: BTreeMap<ConversationStep, DateTime<Utc>>,
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}

impl StepController {
    /// Start at `Welcome`, with its entry time recorded.
    pub fn new() -> Self {
        let mut step_times = BTreeMap::new();
        step_times.insert(ConversationStep::Welcome, Utc::now());
        Self {
            current: ConversationStep::Welcome,
            step_times,
        }
    }

    /// Rebuild a controller from persisted values.
    pub fn restore(
        current: ConversationStep,
        step_times: BTreeMap<ConversationStep, DateTime<Utc>>,
    ) -> Self {
        Self {
            current,
            step_times,
        }
    }

    pub fn current(&self) -> ConversationStep {
        self.current
    }

    pub fn step_times(&self) -> &BTreeMap<ConversationStep, DateTime<Utc>> {
        &self.step_times
    }

    /// Move to `step`. Entering `Checkout` requires a name and a valid email
    /// in the profile; nothing changes when that check fails.
    pub fn set_current_step(
        &mut self,
        step: ConversationStep,
        profile: &UserProfile,
    ) -> Result<(), ValidationError> {
        if step.is_terminal() {
            validate_contact(profile.contact_info.as_ref())?;
        }

        // Re-entries keep the original timestamp.
        self.step_times.entry(step).or_insert_with(Utc::now);
        self.current = step;
        Ok(())
    }

    /// Percentage of funnel steps entered so far.
    pub fn completion_rate(&self) -> f32 {
        let visited = self.step_times.len() as f32;
        (visited / ConversationStep::ALL.len() as f32 * 100.0).min(100.0)
    }
}
