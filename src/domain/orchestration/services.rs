//! Domain Services for response orchestration

use async_trait::async_trait;

use crate::domain::classification::ArbiterDecision;
use crate::domain::conversation::{ConversationState, Message, ResponseMode};

use super::{
    errors::{DetectionError, HandlerError},
    segment::ModeSegment,
    values::MultiIntentResult,
};

/// A mode as advertised to the multi-intent detector.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeDescriptor {
    pub mode: ResponseMode,
    pub description: String,
}

/// Inputs shared by every handler invoked for one turn.
#[derive(Debug, Clone, Copy)]
pub struct HandlerRequest<'a> {
    pub message: &'a str,
    pub recent_messages: &'a [Message],
    pub state: &'a ConversationState,
    pub decision: &'a ArbiterDecision,
    /// Segment priority to stamp on the output; 0 is the primary mode.
    pub priority: u32,
}

impl<'a> HandlerRequest<'a> {
    pub fn with_priority(self, priority: u32) -> Self {
        Self { priority, ..self }
    }

    pub fn is_primary(&self) -> bool {
        self.priority == super::segment::PRIMARY_PRIORITY
    }
}

/// Generates the reply for one response mode.
#[async_trait]
pub trait ModeHandler: Send + Sync {
    fn mode(&self) -> &ResponseMode;

    /// One-line description used when advertising the mode.
    fn description(&self) -> &str;

    async fn respond(&self, request: &HandlerRequest<'_>) -> Result<ModeSegment, HandlerError>;
}

/// Inputs for multi-intent detection.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub message: &'a str,
    pub recent_messages: &'a [Message],
    /// Mode picked by arbitration this turn.
    pub current_mode: &'a ResponseMode,
    pub available_modes: &'a [ModeDescriptor],
}

/// Decides whether a message needs more than one mode.
#[async_trait]
pub trait MultiIntentDetector: Send + Sync {
    async fn detect(&self, input: &DetectionInput<'_>) -> Result<MultiIntentResult, DetectionError>;
}
