//! In-Memory State Snapshot Adapter
//!
//! Keeps every snapshot ever appended, so tests can inspect history.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationId;
use crate::ports::{RepositoryError, StateRepository};

/// In-memory append-only snapshot storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateRepository {
    snapshots: Arc<RwLock<HashMap<ConversationId, Vec<ConversationState>>>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots stored for a conversation
    pub async fn snapshot_count(&self, conversation_id: &ConversationId) -> usize {
        self.snapshots
            .read()
            .await
            .get(conversation_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn append_snapshot(
        &self,
        conversation_id: &ConversationId,
        state: &ConversationState,
    ) -> Result<(), RepositoryError> {
        self.snapshots
            .write()
            .await
            .entry(*conversation_id)
            .or_default()
            .push(state.clone());
        Ok(())
    }

    async fn latest(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationState>, RepositoryError> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(conversation_id)
            .and_then(|s| s.last())
            .cloned())
    }
}
