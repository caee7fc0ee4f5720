//! Response modes
//!
//! Prompt-driven mode handlers and the registry the orchestrator
//! dispatches through.

mod handler;
mod registry;

pub use handler::PromptedModeHandler;
pub use registry::{default_handlers, ModeRegistry, ModeRegistryError};
