//! HTTP handlers for the turn endpoint
//!
//! These handlers connect Axum routes to the turn pipeline.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use crate::application::handlers::{
    PipelineError, PipelineFailure, ProcessTurnCommand, ProcessTurnHandler,
};
use crate::domain::foundation::{ConversationId, UserId};

use super::dto::{ErrorResponse, TurnRequest, TurnResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing the turn pipeline
#[derive(Clone)]
pub struct TurnAppState {
    pub handler: Arc<ProcessTurnHandler>,
}

impl TurnAppState {
    pub fn new(handler: Arc<ProcessTurnHandler>) -> Self {
        Self { handler }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// Process one user message
///
/// POST /api/turns
pub async fn process_turn(
    State(app_state): State<TurnAppState>,
    Json(req): Json<TurnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(req.user_id)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(e.to_string()))))?;

    let conversation_id = req
        .conversation_id
        .as_deref()
        .map(ConversationId::from_str)
        .transpose()
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid conversationId format")),
            )
        })?;

    let cmd = ProcessTurnCommand {
        conversation_id,
        user_id,
        message: req.message,
        force_new_conversation: req.force_new_conversation,
    };

    let result = app_state.handler.handle(cmd).await.map_err(to_api_error)?;

    Ok((StatusCode::OK, Json(TurnResponse::from(result))))
}

/// Liveness probe
///
/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

fn to_api_error(err: PipelineError) -> ApiError {
    match &err.source {
        PipelineFailure::EmptyMessage => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(err.source.to_string())),
        ),
        PipelineFailure::ConversationNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(err.source.to_string())),
        ),
        PipelineFailure::ConversationEnded(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::conflict(err.source.to_string())),
        ),
        PipelineFailure::Repository(_) | PipelineFailure::Enrichment(_) => {
            error!(stage = %err.stage, error = %err, "Turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::pipeline(&err)),
            )
        }
    }
}
