//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Generation
//!
//! - `TextGenerator` - LLM completions for classifiers, extractors, handlers and the composer
//! - `parse_json_object` - reads the JSON object out of structured-output replies
//!
//! ## Persistence
//!
//! - `ConversationRepository` / `MessageRepository` - conversations and their messages
//! - `StateRepository` - append-only per-turn state snapshots
//! - `GoalRepository` - user goals
//! - `ExtractionRepository` / `ClarificationRepository` - domain enrichment records

mod conversation_repository;
mod enrichment_repository;
mod goal_repository;
mod json_output;
mod repository_error;
mod state_repository;
mod text_generator;

pub use conversation_repository::{ConversationRepository, MessageRepository};
pub use enrichment_repository::{ClarificationRepository, ExtractionRepository};
pub use goal_repository::GoalRepository;
pub use json_output::{json_object_span, parse_json_object};
pub use repository_error::RepositoryError;
pub use state_repository::StateRepository;
pub use text_generator::{
    ChatMessage, ChatRole, FinishReason, GenerationError, GenerationPurpose, GenerationRequest,
    GenerationResponse, GeneratorInfo, ResponseFormat, TextGenerator, TokenUsage,
};
