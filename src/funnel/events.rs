//! Events pushed to WebSocket clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Analytics, Message, UserProfile};
use super::recommendation::Recommendation;
use super::session::ChatSession;
use super::state::ConversationStep;

/// Full view of a session, as returned by the REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub conversation_id: Uuid,
    pub current_step: ConversationStep,
    pub is_typing: bool,
    pub user_profile: UserProfile,
    pub messages: Vec<Message>,
    pub analytics: Analytics,
    pub recommendation: Recommendation,
}

impl From<&ChatSession> for SessionView {
    fn from(session: &ChatSession) -> Self {
        Self {
            conversation_id: session.conversation_id(),
            current_step: session.current_step(),
            is_typing: session.is_typing(),
            user_profile: session.profile().clone(),
            messages: session.messages().to_vec(),
            analytics: session.analytics().clone(),
            recommendation: session.recommendation(),
        }
    }
}

/// Funnel event broadcast to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FunnelEvent {
    /// Sent once when a client connects.
    SessionSync { session: SessionView },
    TypingStarted {
        conversation_id: Uuid,
        step: ConversationStep,
    },
    MessageAppended {
        conversation_id: Uuid,
        message: Message,
    },
    StepChanged {
        conversation_id: Uuid,
        step: ConversationStep,
    },
    SessionCleared {
        previous_id: Uuid,
        conversation_id: Uuid,
    },
    CheckoutStarted { conversation_id: Uuid, url: String },
}

impl FunnelEvent {
    /// Whether this event concerns the given conversation.
    pub fn concerns(&self, id: Uuid) -> bool {
        match self {
            Self::SessionSync { session } => session.conversation_id == id,
            Self::TypingStarted {
                conversation_id, ..
            }
            | Self::MessageAppended {
                conversation_id, ..
            }
            | Self::StepChanged {
                conversation_id, ..
            }
            | Self::CheckoutStarted {
                conversation_id, ..
            } => *conversation_id == id,
            Self::SessionCleared {
                previous_id,
                conversation_id,
            } => *previous_id == id || *conversation_id == id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tags_are_snake_case() {
        let id = Uuid::new_v4();
        let event = FunnelEvent::TypingStarted {
            conversation_id: id,
            step: ConversationStep::Budget,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "typing_started");
        assert_eq!(json["step"], "budget");
        assert_eq!(json["conversation_id"], id.to_string());
    }

    #[test]
    fn cleared_concerns_both_ids() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        let event = FunnelEvent::SessionCleared {
            previous_id: old,
            conversation_id: new,
        };
        assert!(event.concerns(old));
        assert!(event.concerns(new));
        assert!(!event.concerns(Uuid::new_v4()));
    }
}
