//! Domain extraction records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClarificationId, DomainId, ExtractionId, MessageId, Timestamp};

use super::clarification::ClarificationRequest;

/// An accepted structured extraction for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: ExtractionId,
    pub domain_id: DomainId,
    pub payload: serde_json::Value,
    pub confidence: f64,
    pub source_message_id: Option<MessageId>,
    pub created_at: Timestamp,
}

impl ExtractionRecord {
    pub fn new(
        domain_id: DomainId,
        payload: serde_json::Value,
        confidence: f64,
        source_message_id: Option<MessageId>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ExtractionId::new(),
            domain_id,
            payload,
            confidence,
            source_message_id,
            created_at: now,
        }
    }
}

/// What a domain extractor returns for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub payload: serde_json::Value,
    pub confidence: f64,
    /// Follow-up question the domain needs answered on a later turn.
    pub clarification: Option<ClarificationRequest>,
    /// Pending clarification this message answered.
    pub resolved_clarification: Option<ClarificationId>,
}

impl ExtractionOutcome {
    pub fn new(payload: serde_json::Value, confidence: f64) -> Self {
        Self {
            payload,
            confidence,
            clarification: None,
            resolved_clarification: None,
        }
    }

    pub fn with_clarification(mut self, request: ClarificationRequest) -> Self {
        self.clarification = Some(request);
        self
    }

    pub fn resolving(mut self, id: ClarificationId) -> Self {
        self.resolved_clarification = Some(id);
        self
    }
}
