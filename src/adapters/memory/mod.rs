//! In-Memory Persistence Adapters.
//!
//! Implementations of the repository ports backed by `tokio::sync::RwLock`
//! maps. Used by the tests and by the default binary.

mod conversation_store;
mod enrichment_store;
mod state_store;

pub use conversation_store::{InMemoryConversationRepository, InMemoryMessageRepository};
pub use enrichment_store::{
    InMemoryClarificationRepository, InMemoryExtractionRepository, InMemoryGoalRepository,
};
pub use state_store::InMemoryStateRepository;
