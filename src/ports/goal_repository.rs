//! Goal repository port.

use async_trait::async_trait;

use crate::domain::conversation::Goal;
use crate::domain::foundation::ConversationId;

use super::RepositoryError;

/// Repository port for user goals.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert the goal or replace the stored goal with the same id.
    async fn upsert(&self, conversation_id: &ConversationId, goal: &Goal) -> Result<(), RepositoryError>;

    /// Every goal recorded for a conversation, in creation order.
    async fn find_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Goal>, RepositoryError>;
}
