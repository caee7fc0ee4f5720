//! In-Memory Conversation and Message Adapters
//!
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{ConversationRepository, MessageRepository, RepositoryError};

/// In-memory conversation storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored conversations
    pub async fn count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::already_exists("Conversation", conversation.id));
        }
        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn find_active_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .values()
            .filter(|c| &c.user_id == user_id && c.is_active())
            .max_by_key(|c| c.last_activity_at)
            .cloned())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(&conversation.id) {
            Some(existing) => {
                *existing = conversation.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("Conversation", conversation.id)),
        }
    }
}

/// In-memory message storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<ConversationId, Vec<Message>>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored message of a conversation, oldest first
    pub async fn all(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.messages
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        self.messages
            .write()
            .await
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let all = messages.get(conversation_id).map(Vec::as_slice).unwrap_or_default();
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn create_and_find_conversation() {
        let repo = InMemoryConversationRepository::new();
        let conversation = Conversation::start(user(), Timestamp::now());

        repo.create(&conversation).await.unwrap();

        let found = repo.find_by_id(&conversation.id).await.unwrap();
        assert_eq!(found, Some(conversation.clone()));
        assert!(matches!(
            repo.create(&conversation).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn find_active_prefers_most_recent_and_skips_ended() {
        let repo = InMemoryConversationRepository::new();
        let now = Timestamp::now();
        let older = Conversation::start(user(), now);
        let newer = Conversation::start(user(), now.plus_secs(60));
        let ended = Conversation::start(user(), now.plus_secs(120)).ended(now.plus_secs(120));

        for c in [&older, &newer, &ended] {
            repo.create(c).await.unwrap();
        }

        let active = repo.find_active_by_user(&user()).await.unwrap().unwrap();
        assert_eq!(active.id, newer.id);
    }

    #[tokio::test]
    async fn update_missing_conversation_fails() {
        let repo = InMemoryConversationRepository::new();
        let conversation = Conversation::start(user(), Timestamp::now());

        let result = repo.update(&conversation).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn recent_returns_tail_oldest_first() {
        let repo = InMemoryMessageRepository::new();
        let conversation_id = ConversationId::new();
        let now = Timestamp::now();
        for i in 0..5 {
            repo.append(&Message::user(conversation_id, format!("m{}", i), now))
                .await
                .unwrap();
        }

        let recent = repo.recent(&conversation_id, 2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
        assert!(repo.recent(&ConversationId::new(), 2).await.unwrap().is_empty());
    }
}
