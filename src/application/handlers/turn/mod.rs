//! Turn handler - processes one user message end to end.

mod pipeline_error;
mod process_turn;

pub use pipeline_error::{PipelineError, PipelineFailure, PipelineStage};
pub use process_turn::{
    ProcessTurnCommand, ProcessTurnHandler, ProcessTurnResult, TurnRepositories, TurnSettings,
};
