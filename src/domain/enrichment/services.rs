//! Domain Services for enrichment
//!
//! Capability traits for domain plugins. Each registered domain owns one
//! extractor and any number of suggestion strategies, looked up by
//! [`DomainId`] in an immutable registry.

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, Message};
use crate::domain::foundation::{ConversationId, DomainId, MessageId};

use super::{
    clarification::ClarificationRecord,
    definition::{DomainDefinition, DomainRelevance},
    errors::{ExtractionError, RelevanceError, StrategyError},
    extraction::{ExtractionOutcome, ExtractionRecord},
    suggestion::Suggestion,
};

/// Everything an extractor may read for one message.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub message: &'a str,
    pub recent_messages: &'a [Message],
    pub state: &'a ConversationState,
    pub domain: &'a DomainDefinition,
    /// Unanswered clarification this domain raised earlier, if any.
    pub pending_clarification: Option<&'a ClarificationRecord>,
}

/// Everything a strategy may read for one accepted extraction.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub message: &'a str,
    pub state: &'a ConversationState,
    pub domain: &'a DomainDefinition,
    pub extraction: &'a ExtractionRecord,
}

/// Turns a message into structured data for one domain.
#[async_trait]
pub trait DomainExtractor: Send + Sync {
    async fn extract(
        &self,
        context: &ExtractionContext<'_>,
    ) -> Result<ExtractionOutcome, ExtractionError>;
}

/// Proposes steering hints from an accepted extraction.
#[async_trait]
pub trait SuggestionStrategy: Send + Sync {
    /// Stable name used in logs and on produced suggestions.
    fn name(&self) -> &str;

    async fn suggest(
        &self,
        context: &SuggestionContext<'_>,
    ) -> Result<Vec<Suggestion>, StrategyError>;
}

/// Decides which registered domains apply to a message.
#[async_trait]
pub trait RelevanceDetector: Send + Sync {
    async fn detect(
        &self,
        message: &str,
        domains: &[DomainDefinition],
    ) -> Result<Vec<DomainRelevance>, RelevanceError>;
}

/// Keyword relevance detector (default implementation)
pub struct KeywordRelevanceDetector;

#[async_trait]
impl RelevanceDetector for KeywordRelevanceDetector {
    async fn detect(
        &self,
        message: &str,
        domains: &[DomainDefinition],
    ) -> Result<Vec<DomainRelevance>, RelevanceError> {
        Ok(domains
            .iter()
            .filter(|d| d.enabled)
            .filter_map(|d| d.keyword_relevance(message))
            .collect())
    }
}

/// Ids of the given relevances, in order.
pub fn domain_ids(relevances: &[DomainRelevance]) -> Vec<DomainId> {
    relevances.iter().map(|r| r.domain_id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyword_detector_skips_disabled_domains() {
        let domains = vec![
            DomainDefinition::new(DomainId::new("goals").unwrap(), "Goals").with_keywords(["goal"]),
            DomainDefinition::new(DomainId::new("fitness").unwrap(), "Fitness")
                .with_keywords(["goal"])
                .disabled(),
        ];

        let relevant = KeywordRelevanceDetector
            .detect("my goal is simple", &domains)
            .await
            .unwrap();

        assert_eq!(domain_ids(&relevant), vec![DomainId::new("goals").unwrap()]);
    }

    #[tokio::test]
    async fn keyword_detector_returns_nothing_without_matches() {
        let domains =
            vec![DomainDefinition::new(DomainId::new("goals").unwrap(), "Goals").with_keywords(["goal"])];
        let relevant = KeywordRelevanceDetector.detect("hello", &domains).await.unwrap();
        assert!(relevant.is_empty());
    }
}
