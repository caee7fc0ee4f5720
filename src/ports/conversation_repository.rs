//! Conversation and message repository ports.
//!
//! # Design
//!
//! - **One active conversation per user** is the lookup default; callers
//!   may still force a new one
//! - **Messages are append-only** and read back newest-last

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{ConversationId, UserId};

use super::RepositoryError;

/// Repository port for conversations.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Save a new conversation.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    async fn create(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Find a conversation by its ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError>;

    /// The user's most recently active conversation that has not ended.
    async fn find_active_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Replace an existing conversation.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation doesn't exist
    async fn update(&self, conversation: &Conversation) -> Result<(), RepositoryError>;
}

/// Repository port for chat messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message to its conversation.
    async fn append(&self, message: &Message) -> Result<(), RepositoryError>;

    /// The last `limit` messages of a conversation, oldest first.
    async fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}
