//! `SessionStore` trait — the durable per-conversation slot.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Backend-agnostic storage for conversation slots.
///
/// A slot holds the JSON produced by `ChatSession::snapshot`. Writes are
/// last-write-wins; there is no locking across writers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the slot for a conversation, if one exists.
    async fn load_session(
        &self,
        conversation_id: Uuid,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Create or overwrite the slot for a conversation.
    async fn save_session(
        &self,
        conversation_id: Uuid,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Remove a slot. Returns whether anything was deleted.
    async fn delete_session(&self, conversation_id: Uuid) -> Result<bool, DatabaseError>;
}
