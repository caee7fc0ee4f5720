//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and validation errors that form the
//! vocabulary of the Confidant domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{
    ClarificationId, ConversationId, DomainId, ExtractionId, GoalId, MessageId, UserId,
};
pub use timestamp::Timestamp;
