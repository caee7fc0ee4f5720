//! Agent clarification records.
//!
//! A clarification is a short-lived follow-up question a domain is waiting
//! on ("which goal did you mean?"). It expires after a TTL and is resolved
//! once a later message answers it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClarificationId, ConversationId, DomainId, Timestamp};

/// A follow-up a domain wants to raise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Kind of question, e.g. `goal_selection`.
    pub state_type: String,
    pub payload: serde_json::Value,
}

impl ClarificationRequest {
    pub fn new(state_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            state_type: state_type.into(),
            payload,
        }
    }
}

/// A stored, TTL-bounded clarification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRecord {
    pub id: ClarificationId,
    pub conversation_id: ConversationId,
    pub domain_id: DomainId,
    pub state_type: String,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub resolved: bool,
}

impl ClarificationRecord {
    pub fn open(
        conversation_id: ConversationId,
        domain_id: DomainId,
        request: ClarificationRequest,
        ttl_secs: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: ClarificationId::new(),
            conversation_id,
            domain_id,
            state_type: request.state_type,
            payload: request.payload,
            created_at: now,
            expires_at: now.plus_secs(ttl_secs),
            resolved: false,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Unresolved and not yet expired.
    pub fn is_pending(&self, now: Timestamp) -> bool {
        !self.resolved && !self.is_expired(now)
    }
}
