//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod turn;

pub use turn::{
    PipelineError, PipelineFailure, PipelineStage, ProcessTurnCommand, ProcessTurnHandler,
    ProcessTurnResult, TurnRepositories, TurnSettings,
};
