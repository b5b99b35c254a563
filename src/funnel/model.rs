//! Funnel data models: the prospect profile, chat messages, and analytics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::ConversationStep;

/// Installation branch the prospect works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Industry {
    #[serde(rename = "Thuisbatterijen")]
    HomeBatteries,
    #[serde(rename = "Zonnepanelen")]
    SolarPanels,
    #[serde(rename = "Warmtepompen")]
    HeatPumps,
    #[serde(rename = "Airco's")]
    AirConditioning,
    #[serde(rename = "Financial Lease")]
    FinancialLease,
}

impl Industry {
    pub const ALL: [Industry; 5] = [
        Self::HomeBatteries,
        Self::SolarPanels,
        Self::HeatPumps,
        Self::AirConditioning,
        Self::FinancialLease,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::HomeBatteries => "Thuisbatterijen",
            Self::SolarPanels => "Zonnepanelen",
            Self::HeatPumps => "Warmtepompen",
            Self::AirConditioning => "Airco's",
            Self::FinancialLease => "Financial Lease",
        }
    }
}

/// How many leads the prospect currently receives per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentLeads {
    #[serde(rename = "Nog geen leads")]
    None,
    #[serde(rename = "1-25 leads")]
    UpTo25,
    #[serde(rename = "25-100 leads")]
    UpTo100,
    #[serde(rename = "100+ leads")]
    Over100,
}

impl CurrentLeads {
    pub const ALL: [CurrentLeads; 4] = [Self::None, Self::UpTo25, Self::UpTo100, Self::Over100];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "Nog geen leads",
            Self::UpTo25 => "1-25 leads",
            Self::UpTo100 => "25-100 leads",
            Self::Over100 => "100+ leads",
        }
    }
}

/// The prospect's biggest problem with their current lead supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Challenge {
    #[serde(rename = "Leads zijn te duur")]
    TooExpensive,
    #[serde(rename = "Te weinig volume")]
    TooLittleVolume,
    #[serde(rename = "Slechte kwaliteit")]
    PoorQuality,
    #[serde(rename = "Geen tijd voor opvolging")]
    NoTimeForFollowUp,
}

impl Challenge {
    pub const ALL: [Challenge; 4] = [
        Self::TooExpensive,
        Self::TooLittleVolume,
        Self::PoorQuality,
        Self::NoTimeForFollowUp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::TooExpensive => "Leads zijn te duur",
            Self::TooLittleVolume => "Te weinig volume",
            Self::PoorQuality => "Slechte kwaliteit",
            Self::NoTimeForFollowUp => "Geen tijd voor opvolging",
        }
    }
}

/// Which kind of leads the prospect asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadType {
    #[serde(rename = "Exclusieve leads")]
    Exclusive,
    #[serde(rename = "Gedeelde leads")]
    Shared,
    #[serde(rename = "Weet ik nog niet")]
    Undecided,
}

impl LeadType {
    pub const ALL: [LeadType; 3] = [Self::Exclusive, Self::Shared, Self::Undecided];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Exclusive => "Exclusieve leads",
            Self::Shared => "Gedeelde leads",
            Self::Undecided => "Weet ik nog niet",
        }
    }
}

/// Contact details collected at the end of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
}

/// Everything the prospect told us so far. Every field is optional until
/// checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_leads: Option<CurrentLeads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Challenge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<LeadType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
}

/// A partial profile. Keys that are `Some` overwrite the profile's value;
/// `None` leaves it untouched.
pub type ProfileUpdate = UserProfile;

impl UserProfile {
    /// Shallow merge: each key present in `update` replaces the current
    /// value. `contact_info` is replaced as a whole.
    pub fn merge(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            industry,
            current_leads,
            challenge,
            lead_type,
            budget,
            timeline,
            company_size,
            quantity,
            contact_info,
        } = update;

        if industry.is_some() {
            self.industry = industry;
        }
        if current_leads.is_some() {
            self.current_leads = current_leads;
        }
        if challenge.is_some() {
            self.challenge = challenge;
        }
        if lead_type.is_some() {
            self.lead_type = lead_type;
        }
        if budget.is_some() {
            self.budget = budget;
        }
        if timeline.is_some() {
            self.timeline = timeline;
        }
        if company_size.is_some() {
            self.company_size = company_size;
        }
        if quantity.is_some() {
            self.quantity = quantity;
        }
        if contact_info.is_some() {
            self.contact_info = contact_info;
        }
    }

    /// Render a short Dutch summary of the profile, used in sales
    /// notifications.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(industry) = self.industry {
            parts.push(format!("Branche: {}", industry.label()));
        }
        if let Some(leads) = self.current_leads {
            parts.push(format!("Huidige leads: {}", leads.label()));
        }
        if let Some(challenge) = self.challenge {
            parts.push(format!("Uitdaging: {}", challenge.label()));
        }
        if let Some(lead_type) = self.lead_type {
            parts.push(format!("Voorkeur: {}", lead_type.label()));
        }
        if let Some(ref budget) = self.budget {
            parts.push(format!("Budget: {budget}"));
        }
        if let Some(ref timeline) = self.timeline {
            parts.push(format!("Start: {timeline}"));
        }
        if let Some(ref size) = self.company_size {
            parts.push(format!("Bedrijfsgrootte: {size}"));
        }
        if let Some(quantity) = self.quantity {
            parts.push(format!("Aantal: {quantity}"));
        }
        if let Some(ref contact) = self.contact_info {
            parts.push(format!(
                "Contact: {} ({}) {} {}",
                contact.name, contact.company, contact.email, contact.phone
            ));
        }

        parts.join("\n")
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    System,
    User,
}

/// One turn of the chat transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type: MessageType::System,
            content: content.into(),
            timestamp: Utc::now(),
            options: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type: MessageType::User,
            content: content.into(),
            timestamp: Utc::now(),
            options: None,
        }
    }

    /// Attach selectable answer options. Empty lists are dropped.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        if !options.is_empty() {
            self.options = Some(options);
        }
        self
    }
}

/// Funnel analytics, persisted alongside the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub start_time: DateTime<Utc>,
    /// When each step was first entered.
    #[serde(default)]
    pub step_times: BTreeMap<ConversationStep, DateTime<Utc>>,
    /// Number of prospect replies.
    #[serde(default)]
    pub interactions: u32,
    /// Percentage (0-100) of funnel steps visited.
    #[serde(default)]
    pub completion_rate: f32,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            step_times: BTreeMap::new(),
            interactions: 0,
            completion_rate: 0.0,
        }
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_applies_updates_in_order() {
        let mut profile = UserProfile::default();
        profile.merge(ProfileUpdate {
            industry: Some(Industry::SolarPanels),
            budget: Some("€1.000 - €2.500".into()),
            ..Default::default()
        });
        profile.merge(ProfileUpdate {
            budget: Some("€2.500+".into()),
            challenge: Some(Challenge::PoorQuality),
            ..Default::default()
        });

        assert_eq!(profile.industry, Some(Industry::SolarPanels));
        assert_eq!(profile.budget.as_deref(), Some("€2.500+"));
        assert_eq!(profile.challenge, Some(Challenge::PoorQuality));
        assert!(profile.timeline.is_none());
    }

    #[test]
    fn merge_replaces_contact_info_wholesale() {
        let mut profile = UserProfile::default();
        profile.merge(ProfileUpdate {
            contact_info: Some(ContactInfo {
                name: "Jan".into(),
                email: "jan@example.nl".into(),
                phone: "0612345678".into(),
                company: "Jan Solar".into(),
            }),
            ..Default::default()
        });
        profile.merge(ProfileUpdate {
            contact_info: Some(ContactInfo {
                email: "info@example.nl".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let contact = profile.contact_info.unwrap();
        assert_eq!(contact.email, "info@example.nl");
        assert!(contact.name.is_empty());
        assert!(contact.company.is_empty());
    }

    #[test]
    fn empty_strings_are_accepted() {
        let mut profile = UserProfile::default();
        profile.merge(ProfileUpdate {
            timeline: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(profile.timeline.as_deref(), Some(""));
    }

    #[test]
    fn profile_uses_dutch_wire_values() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "challenge": "Leads zijn te duur",
            "currentLeads": "100+ leads",
            "companySize": "2-5 medewerkers"
        }))
        .unwrap();

        assert_eq!(profile.challenge, Some(Challenge::TooExpensive));
        assert_eq!(profile.current_leads, Some(CurrentLeads::Over100));
        assert_eq!(profile.company_size.as_deref(), Some("2-5 medewerkers"));

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["currentLeads"], "100+ leads");
        assert!(json.get("industry").is_none());
    }

    #[test]
    fn labels_match_serde() {
        for challenge in Challenge::ALL {
            let json = serde_json::to_string(&challenge).unwrap();
            assert_eq!(json, format!("\"{}\"", challenge.label()));
        }
        for leads in CurrentLeads::ALL {
            let json = serde_json::to_string(&leads).unwrap();
            assert_eq!(json, format!("\"{}\"", leads.label()));
        }
        for industry in Industry::ALL {
            let json = serde_json::to_string(&industry).unwrap();
            assert_eq!(json, format!("\"{}\"", industry.label()));
        }
        for lead_type in LeadType::ALL {
            let json = serde_json::to_string(&lead_type).unwrap();
            assert_eq!(json, format!("\"{}\"", lead_type.label()));
        }
    }

    #[test]
    fn message_serializes_type_tag() {
        let msg = Message::system("Welkom!").with_options(vec!["Start".into()]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["options"][0], "Start");

        let reply = Message::user("Zonnepanelen");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "user");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn with_empty_options_is_none() {
        let msg = Message::system("Hoi").with_options(Vec::new());
        assert!(msg.options.is_none());
    }

    #[test]
    fn summary_lists_known_fields() {
        let profile = UserProfile {
            industry: Some(Industry::HeatPumps),
            quantity: Some(50),
            ..Default::default()
        };
        let summary = profile.summary();
        assert!(summary.contains("Warmtepompen"));
        assert!(summary.contains("Aantal: 50"));
        assert!(!summary.contains("Budget"));
    }
}
