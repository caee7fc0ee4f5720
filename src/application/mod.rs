//! Application layer - Commands, Handlers and the services they coordinate.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod classification;
pub mod enrichment;
pub mod handlers;
pub mod modes;
pub mod orchestration;

pub use classification::{ClassificationOutcome, ClassificationService};
pub use handlers::{
    PipelineError, PipelineFailure, PipelineStage, ProcessTurnCommand, ProcessTurnHandler,
    ProcessTurnResult, TurnRepositories, TurnSettings,
};
