//! Route definitions for the turn endpoints

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, process_turn, TurnAppState};

/// Create the turn router
///
/// # Endpoints
///
/// - `POST /api/turns` - Process one user message
/// - `GET /health` - Liveness probe
pub fn routes() -> Router<TurnAppState> {
    Router::new()
        .route("/api/turns", post(process_turn))
        .route("/health", get(health))
}
