//! Conversation and message entities.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};

use super::mode::ResponseMode;

/// Whether a conversation still accepts turns by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Ended,
}

/// A conversation between one user and the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub status: ConversationStatus,
    pub current_mode: ResponseMode,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl Conversation {
    /// Starts a new active conversation.
    pub fn start(user_id: UserId, now: Timestamp) -> Self {
        Self {
            id: ConversationId::new(),
            user_id,
            status: ConversationStatus::Active,
            current_mode: ResponseMode::default(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }

    /// Returns a copy stamped with this turn's mode and time.
    pub fn touched(&self, mode: ResponseMode, now: Timestamp) -> Self {
        Self {
            current_mode: mode,
            last_activity_at: now,
            ..self.clone()
        }
    }

    /// Returns an ended copy of this conversation.
    pub fn ended(&self, now: Timestamp) -> Self {
        Self {
            status: ConversationStatus::Ended,
            last_activity_at: now,
            ..self.clone()
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: Timestamp,
}

impl Message {
    pub fn user(conversation_id: ConversationId, content: impl Into<String>, now: Timestamp) -> Self {
        Self::new(conversation_id, MessageRole::User, content, now)
    }

    pub fn assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self::new(conversation_id, MessageRole::Assistant, content, now)
    }

    fn new(
        conversation_id: ConversationId,
        role: MessageRole,
        content: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role,
            content: content.into(),
            created_at: now,
        }
    }
}
