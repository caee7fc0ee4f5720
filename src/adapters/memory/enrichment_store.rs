//! In-Memory Goal, Extraction and Clarification Adapters

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::Goal;
use crate::domain::enrichment::{ClarificationRecord, ExtractionRecord};
use crate::domain::foundation::{ClarificationId, ConversationId, DomainId, Timestamp};
use crate::ports::{
    ClarificationRepository, ExtractionRepository, GoalRepository, RepositoryError,
};

/// In-memory goal storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryGoalRepository {
    goals: Arc<RwLock<HashMap<ConversationId, Vec<Goal>>>>,
}

impl InMemoryGoalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GoalRepository for InMemoryGoalRepository {
    async fn upsert(&self, conversation_id: &ConversationId, goal: &Goal) -> Result<(), RepositoryError> {
        let mut goals = self.goals.write().await;
        let stored = goals.entry(*conversation_id).or_default();
        match stored.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal.clone(),
            None => stored.push(goal.clone()),
        }
        Ok(())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Goal>, RepositoryError> {
        Ok(self
            .goals
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory extraction storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryExtractionRepository {
    records: Arc<RwLock<Vec<(ConversationId, ExtractionRecord)>>>,
}

impl InMemoryExtractionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved records for a conversation, oldest first
    pub async fn records_for(&self, conversation_id: &ConversationId) -> Vec<ExtractionRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == conversation_id)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl ExtractionRepository for InMemoryExtractionRepository {
    async fn save(
        &self,
        conversation_id: &ConversationId,
        record: &ExtractionRecord,
    ) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .push((*conversation_id, record.clone()));
        Ok(())
    }
}

/// In-memory clarification storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryClarificationRepository {
    records: Arc<RwLock<HashMap<ClarificationId, ClarificationRecord>>>,
}

impl InMemoryClarificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &ClarificationId) -> Option<ClarificationRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Every record for a conversation regardless of status
    pub async fn all_for(&self, conversation_id: &ConversationId) -> Vec<ClarificationRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| &r.conversation_id == conversation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ClarificationRepository for InMemoryClarificationRepository {
    async fn create(&self, record: &ClarificationRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::already_exists("Clarification", record.id));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_pending(
        &self,
        conversation_id: &ConversationId,
        domain_id: &DomainId,
        now: Timestamp,
    ) -> Result<Vec<ClarificationRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut pending: Vec<ClarificationRecord> = records
            .values()
            .filter(|r| {
                &r.conversation_id == conversation_id && &r.domain_id == domain_id && r.is_pending(now)
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn resolve(&self, id: &ClarificationId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                record.resolved = true;
                Ok(())
            }
            None => Err(RepositoryError::not_found("Clarification", id)),
        }
    }
}
