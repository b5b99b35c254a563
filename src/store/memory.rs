//! In-memory `SessionStore`, for tests and for running without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::traits::SessionStore;

#[derive(Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<Uuid, serde_json::Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_session(
        &self,
        conversation_id: Uuid,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        Ok(self.slots.read().await.get(&conversation_id).cloned())
    }

    async fn save_session(
        &self,
        conversation_id: Uuid,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        self.slots
            .write()
            .await
            .insert(conversation_id, value.clone());
        Ok(())
    }

    async fn delete_session(&self, conversation_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.slots.write().await.remove(&conversation_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_slot_crud() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();

        store
            .save_session(id, &serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(store.load_session(id).await.unwrap().unwrap()["a"], 1);

        assert!(store.delete_session(id).await.unwrap());
        assert!(store.load_session(id).await.unwrap().is_none());
    }
}
