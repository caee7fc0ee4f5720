//! State Repository Port - append-only conversation state snapshots.
//!
//! One snapshot is written per turn. Snapshots are never updated in place;
//! the latest one is the conversation's current memory.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationId;

use super::RepositoryError;

/// Port for persisting per-turn state snapshots
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Append a snapshot for a conversation.
    async fn append_snapshot(
        &self,
        conversation_id: &ConversationId,
        state: &ConversationState,
    ) -> Result<(), RepositoryError>;

    /// The most recent snapshot, or `None` for a new conversation.
    async fn latest(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationState>, RepositoryError>;
}
