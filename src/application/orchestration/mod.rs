//! Multi-intent orchestration
//!
//! Detects which modes a message needs, runs their handlers and composes
//! the segments into one reply.

mod composer;
mod intent_detector;
mod orchestrator;

pub use composer::ResponseComposer;
pub use intent_detector::{
    detect_or_fallback, LlmMultiIntentDetector, DEFAULT_MIN_SECONDARY_CONFIDENCE,
};
pub use orchestrator::{
    OrchestratedResponse, OrchestratorSettings, ResponseOrchestrator, FALLBACK_REPLY,
};
