//! HTTP DTOs for the turn endpoint
//!
//! These types decouple the HTTP API from domain types. Field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::application::handlers::ProcessTurnResult;
use crate::application::handlers::PipelineError;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to process one user message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub force_new_conversation: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a processed turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub response: String,
    pub processing_time_ms: u64,
    pub message_id: String,
    pub conversation_id: String,
    pub modes: Vec<String>,
}

impl From<ProcessTurnResult> for TurnResponse {
    fn from(result: ProcessTurnResult) -> Self {
        Self {
            response: result.response,
            processing_time_ms: result.processing_time_ms,
            message_id: result.message_id.to_string(),
            conversation_id: result.conversation_id.to_string(),
            modes: result.modes.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            stage: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: message.into(),
            stage: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            code: "CONFLICT".to_string(),
            message: message.into(),
            stage: None,
        }
    }

    /// Internal failure, tagged with the pipeline stage that failed.
    pub fn pipeline(err: &PipelineError) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: err.to_string(),
            stage: Some(err.stage.to_string()),
        }
    }
}
