//! Extraction and clarification repository ports.

use async_trait::async_trait;

use crate::domain::enrichment::{ClarificationRecord, ExtractionRecord};
use crate::domain::foundation::{ClarificationId, ConversationId, DomainId, Timestamp};

use super::RepositoryError;

/// Repository port for accepted domain extractions.
#[async_trait]
pub trait ExtractionRepository: Send + Sync {
    async fn save(
        &self,
        conversation_id: &ConversationId,
        record: &ExtractionRecord,
    ) -> Result<(), RepositoryError>;
}

/// Repository port for agent clarification records.
#[async_trait]
pub trait ClarificationRepository: Send + Sync {
    async fn create(&self, record: &ClarificationRecord) -> Result<(), RepositoryError>;

    /// Unresolved, unexpired clarifications for a conversation and domain,
    /// newest first.
    async fn find_pending(
        &self,
        conversation_id: &ConversationId,
        domain_id: &DomainId,
        now: Timestamp,
    ) -> Result<Vec<ClarificationRecord>, RepositoryError>;

    /// Mark a clarification resolved.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such clarification exists
    async fn resolve(&self, id: &ClarificationId) -> Result<(), RepositoryError>;
}
