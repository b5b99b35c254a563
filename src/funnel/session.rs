//! `ChatSession` — one prospect's conversation: profile, step, transcript
//! and analytics, plus the persisted slot shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

use super::model::{Analytics, Message, MessageType, ProfileUpdate, UserProfile};
use super::recommendation::{Recommendation, get_recommendation};
use super::state::{ConversationStep, StepController};
use super::transcript::MessageLog;

/// The durable slot contents. The message log and typing flag are not
/// part of it; they start empty after a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user_profile: UserProfile,
    pub current_step: ConversationStep,
    pub conversation_id: Uuid,
    pub analytics: Analytics,
}

/// A single conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation_id: Uuid,
    profile: UserProfile,
    steps: StepController,
    log: MessageLog,
    analytics: Analytics,
    is_typing: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let steps = StepController::new();
        let mut analytics = Analytics::new();
        analytics.step_times = steps.step_times().clone();
        analytics.completion_rate = steps.completion_rate();

        Self {
            conversation_id: Uuid::new_v4(),
            profile: UserProfile::default(),
            steps,
            log: MessageLog::new(),
            analytics,
            is_typing: false,
        }
    }

    /// Rebuild a session from its durable slot.
    pub fn restore(persisted: PersistedSession) -> Self {
        let steps = StepController::restore(
            persisted.current_step,
            persisted.analytics.step_times.clone(),
        );
        Self {
            conversation_id: persisted.conversation_id,
            profile: persisted.user_profile,
            steps,
            log: MessageLog::new(),
            analytics: persisted.analytics,
            is_typing: false,
        }
    }

    /// Parse a slot value; `None` when it is missing a field or malformed.
    pub fn from_slot(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<PersistedSession>(value) {
            Ok(persisted) => Some(Self::restore(persisted)),
            Err(e) => {
                tracing::warn!("Discarding corrupt session slot: {}", e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> PersistedSession {
        PersistedSession {
            user_profile: self.profile.clone(),
            current_step: self.steps.current(),
            conversation_id: self.conversation_id,
            analytics: self.analytics.clone(),
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn current_step(&self) -> ConversationStep {
        self.steps.current()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.is_typing = typing;
    }

    pub fn recommendation(&self) -> Recommendation {
        get_recommendation(&self.profile)
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) {
        self.profile.merge(update);
    }

    /// Make `step` the active step and update the analytics block.
    pub fn set_current_step(&mut self, step: ConversationStep) -> Result<(), ValidationError> {
        self.steps.set_current_step(step, &self.profile)?;
        self.analytics.step_times = self.steps.step_times().clone();
        self.analytics.completion_rate = self.steps.completion_rate();
        Ok(())
    }

    pub fn add_message(&mut self, message: Message) {
        if message.message_type == MessageType::User {
            self.analytics.interactions += 1;
        }
        self.log.add_message(message);
    }

    /// Start over: fresh id, empty profile and transcript, back to welcome.
    pub fn clear_chat(&mut self) {
        let previous = self.conversation_id;
        *self = Self::new();
        while self.conversation_id == previous {
            self.conversation_id = Uuid::new_v4();
        }
    }
}
