use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use super::{ConversationStore, StoreError};
use crate::models::ConversationState;

/// Conversation progress lives only in memory and is lost on restart.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<String, ConversationState>>,
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, sender: &str) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.conversations.lock().await.get(sender).cloned())
    }

    async fn put(&self, sender: &str, state: ConversationState) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .await
            .insert(sender.to_string(), state);
        Ok(())
    }

    async fn delete(&self, sender: &str) -> Result<(), StoreError> {
        self.conversations.lock().await.remove(sender);
        Ok(())
    }

    async fn expire_idle(&self, cutoff: NaiveDateTime) -> Result<usize, StoreError> {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        conversations.retain(|_, state| state.last_activity >= cutoff);
        Ok(before - conversations.len())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.conversations.lock().await.len())
    }
}
