//! Mode segments: one handler's contribution to a reply.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::ResponseMode;

/// Priority of the primary mode's segment. Secondaries count up from here.
pub const PRIMARY_PRIORITY: u32 = 0;

/// What kind of text a segment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    /// Fixed crisis reply; never blended with other output.
    CrisisResponse,
    /// Generic reply used after every handler failed.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub confidence: f64,
    pub state_updates: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A single response generator's output. Consumed by the composer and
/// never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSegment {
    pub mode: ResponseMode,
    pub content: String,
    /// Lower sorts first.
    pub priority: u32,
    pub content_type: ContentType,
    pub metadata: SegmentMetadata,
}

impl ModeSegment {
    pub fn text(mode: ResponseMode, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            mode,
            content: content.into(),
            priority: PRIMARY_PRIORITY,
            content_type: ContentType::Text,
            metadata: SegmentMetadata {
                confidence,
                state_updates: None,
            },
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_state_update(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .state_updates
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
