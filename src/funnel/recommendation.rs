//! Recommendation engine — maps a profile onto one of the three lead
//! packages.

use serde::{Deserialize, Serialize};

use super::model::{Challenge, CurrentLeads, UserProfile};

/// Lead package offered to the prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Shared leads, sold to several installers at a lower price.
    Gedeelde,
    /// Exclusive leads, sold to one installer only.
    Exclusieve,
    /// A mix of both.
    Mixed,
}

impl Recommendation {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Gedeelde => "Gedeelde leads",
            Self::Exclusieve => "Exclusieve leads",
            Self::Mixed => "Mix van exclusieve en gedeelde leads",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Self::Gedeelde => {
                "Gedeelde leads zijn de voordeligste manier om te starten: je betaalt minder per lead en bouwt snel volume op."
            }
            Self::Exclusieve => {
                "Exclusieve leads komen alleen bij jou terecht. Geen concurrentie op dezelfde aanvraag, dus een hogere conversie."
            }
            Self::Mixed => {
                "Met een mix combineer je de hoge conversie van exclusieve leads met het volume van gedeelde leads."
            }
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Gedeelde => "gedeelde",
            Self::Exclusieve => "exclusieve",
            Self::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

/// Classify a profile. The first matching rule wins:
///
/// 1. leads too expensive, or no leads yet → shared
/// 2. 100+ leads already, or too little volume → exclusive
/// 3. anything else, including an empty profile → mixed
pub fn get_recommendation(profile: &UserProfile) -> Recommendation {
    if profile.challenge == Some(Challenge::TooExpensive)
        || profile.current_leads == Some(CurrentLeads::None)
    {
        return Recommendation::Gedeelde;
    }

    if profile.current_leads == Some(CurrentLeads::Over100)
        || profile.challenge == Some(Challenge::TooLittleVolume)
    {
        return Recommendation::Exclusieve;
    }

    Recommendation::Mixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_expensive_is_shared() {
        let profile = UserProfile {
            challenge: Some(Challenge::TooExpensive),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Gedeelde);
    }

    #[test]
    fn no_leads_yet_is_shared() {
        let profile = UserProfile {
            current_leads: Some(CurrentLeads::None),
            challenge: Some(Challenge::TooLittleVolume),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Gedeelde);
    }

    #[test]
    fn over_hundred_is_exclusive() {
        let profile = UserProfile {
            current_leads: Some(CurrentLeads::Over100),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Exclusieve);
    }

    #[test]
    fn too_little_volume_is_exclusive() {
        let profile = UserProfile {
            current_leads: Some(CurrentLeads::UpTo25),
            challenge: Some(Challenge::TooLittleVolume),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Exclusieve);
    }

    #[test]
    fn empty_profile_is_mixed() {
        assert_eq!(
            get_recommendation(&UserProfile::default()),
            Recommendation::Mixed
        );
    }

    #[test]
    fn first_rule_wins_on_conflict() {
        let profile = UserProfile {
            challenge: Some(Challenge::TooExpensive),
            current_leads: Some(CurrentLeads::Over100),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Gedeelde);
    }

    #[test]
    fn unrelated_answers_are_mixed() {
        let profile = UserProfile {
            challenge: Some(Challenge::PoorQuality),
            current_leads: Some(CurrentLeads::UpTo100),
            budget: Some("€5.000+".into()),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), Recommendation::Mixed);
    }

    #[test]
    fn is_deterministic() {
        let profile = UserProfile {
            current_leads: Some(CurrentLeads::Over100),
            ..Default::default()
        };
        assert_eq!(get_recommendation(&profile), get_recommendation(&profile));
    }

    #[test]
    fn display_matches_serde() {
        for rec in [
            Recommendation::Gedeelde,
            Recommendation::Exclusieve,
            Recommendation::Mixed,
        ] {
            let json = serde_json::to_string(&rec).unwrap();
            assert_eq!(json, format!("\"{rec}\""));
        }
    }
}
