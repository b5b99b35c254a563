//! Dutch prompt text and answer options for each conversation step.

use super::model::{Challenge, CurrentLeads, Industry, LeadType, Message, UserProfile};
use super::recommendation::get_recommendation;
use super::state::ConversationStep;

/// Default number of leads suggested when the prospect has not picked one.
pub const DEFAULT_QUANTITY: u32 = 25;

/// Build the system message shown when `step` becomes active.
pub fn step_prompt(step: ConversationStep, profile: &UserProfile) -> Message {
    Message::system(prompt_text(step, profile)).with_options(step_options(step))
}

fn prompt_text(step: ConversationStep, profile: &UserProfile) -> String {
    match step {
        ConversationStep::Welcome => "\
Welkom bij WarmeLeads! 👋 In een paar korte vragen zoeken we uit welke leads \
het beste bij jouw bedrijf passen. Zullen we beginnen?"
            .to_string(),

        ConversationStep::IndustrySelect => {
            "In welke branche ben je actief?".to_string()
        }

        ConversationStep::CurrentLeads => match profile.industry {
            Some(industry) => format!(
                "Mooi, {} is een groeiende markt. Hoeveel leads ontvang je nu per maand?",
                industry.label().to_lowercase()
            ),
            None => "Hoeveel leads ontvang je nu per maand?".to_string(),
        },

        ConversationStep::Challenge => {
            "Wat is op dit moment je grootste uitdaging met leads?".to_string()
        }

        ConversationStep::LeadType => "\
Heb je een voorkeur voor exclusieve leads (alleen voor jou) of gedeelde leads \
(voordeliger, gedeeld met maximaal drie installateurs)?"
            .to_string(),

        ConversationStep::Budget => {
            "Welk maandbudget heb je ongeveer voor leadgeneratie?".to_string()
        }

        ConversationStep::Timeline => "Wanneer wil je starten?".to_string(),

        ConversationStep::CompanySize => {
            "Hoe groot is je bedrijf?".to_string()
        }

        ConversationStep::Quantity => format!(
            "Hoeveel leads wil je in je eerste bestelling ontvangen? \
             (De meeste installateurs starten met {DEFAULT_QUANTITY}.)"
        ),

        ConversationStep::Recommendation => {
            let rec = get_recommendation(profile);
            format!(
                "Op basis van je antwoorden raden we aan: **{}**.\n{}",
                rec.title(),
                rec.explanation()
            )
        }

        ConversationStep::ContactInfo => "\
Top! Naar welk naam en e-mailadres mogen we je bestelling en leads sturen? \
Een telefoonnummer en bedrijfsnaam helpen ons je sneller te bereiken."
            .to_string(),

        ConversationStep::Checkout => {
            let name = profile
                .contact_info
                .as_ref()
                .map(|c| c.name.trim())
                .filter(|n| !n.is_empty());
            match name {
                Some(name) => format!(
                    "Bedankt {name}! Je wordt doorgestuurd naar de beveiligde betaalpagina."
                ),
                None => "Bedankt! Je wordt doorgestuurd naar de beveiligde betaalpagina."
                    .to_string(),
            }
        }
    }
}

fn step_options(step: ConversationStep) -> Vec<String> {
    let labels: Vec<&str> = match step {
        ConversationStep::Welcome => vec!["Ja, laten we beginnen"],
        ConversationStep::IndustrySelect => Industry::ALL.iter().map(|i| i.label()).collect(),
        ConversationStep::CurrentLeads => CurrentLeads::ALL.iter().map(|c| c.label()).collect(),
        ConversationStep::Challenge => Challenge::ALL.iter().map(|c| c.label()).collect(),
        ConversationStep::LeadType => LeadType::ALL.iter().map(|l| l.label()).collect(),
        ConversationStep::Budget => vec![
            "Tot €1.000",
            "€1.000 - €2.500",
            "€2.500 - €5.000",
            "€5.000+",
        ],
        ConversationStep::Timeline => vec!["Direct", "Binnen een maand", "Binnen drie maanden"],
        ConversationStep::CompanySize => vec![
            "Zzp",
            "2-5 medewerkers",
            "6-20 medewerkers",
            "20+ medewerkers",
        ],
        ConversationStep::Quantity => vec!["25", "50", "100", "250"],
        ConversationStep::Recommendation => vec!["Bestellen", "Meer informatie"],
        ConversationStep::ContactInfo | ConversationStep::Checkout => Vec::new(),
    };
    labels.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::model::ContactInfo;

    #[test]
    fn every_step_has_a_prompt() {
        let profile = UserProfile::default();
        for step in ConversationStep::ALL {
            let msg = step_prompt(step, &profile);
            assert!(!msg.content.is_empty(), "{step} has no prompt");
        }
    }

    #[test]
    fn industry_step_offers_all_industries() {
        let msg = step_prompt(ConversationStep::IndustrySelect, &UserProfile::default());
        let options = msg.options.unwrap();
        assert_eq!(options.len(), Industry::ALL.len());
        assert!(options.contains(&"Warmtepompen".to_string()));
    }

    #[test]
    fn challenge_options_match_wire_values() {
        let msg = step_prompt(ConversationStep::Challenge, &UserProfile::default());
        let options = msg.options.unwrap();
        assert!(options.contains(&"Leads zijn te duur".to_string()));
        assert!(options.contains(&"Te weinig volume".to_string()));
    }

    #[test]
    fn current_leads_prompt_mentions_industry() {
        let profile = UserProfile {
            industry: Some(Industry::SolarPanels),
            ..Default::default()
        };
        let msg = step_prompt(ConversationStep::CurrentLeads, &profile);
        assert!(msg.content.contains("zonnepanelen"));
    }

    #[test]
    fn recommendation_prompt_reflects_profile() {
        let profile = UserProfile {
            current_leads: Some(CurrentLeads::Over100),
            ..Default::default()
        };
        let msg = step_prompt(ConversationStep::Recommendation, &profile);
        assert!(msg.content.contains("Exclusieve leads"));
    }

    #[test]
    fn contact_step_has_no_options() {
        let msg = step_prompt(ConversationStep::ContactInfo, &UserProfile::default());
        assert!(msg.options.is_none());
    }

    #[test]
    fn checkout_prompt_greets_by_name() {
        let profile = UserProfile {
            contact_info: Some(ContactInfo {
                name: "Sanne".into(),
                email: "sanne@example.nl".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let msg = step_prompt(ConversationStep::Checkout, &profile);
        assert!(msg.content.contains("Sanne"));
    }
}
