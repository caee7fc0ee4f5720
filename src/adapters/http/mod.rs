//! HTTP adapters - REST API implementations.
//!
//! The turn pipeline is the only surface; everything is JSON.

pub mod turn;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use turn::{TurnAppState, TurnRequest, TurnResponse};

/// Full application router with tracing and a request timeout
pub fn router(state: TurnAppState, request_timeout: Duration) -> Router {
    turn::routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
