//! HTTP adapter for the turn pipeline

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, TurnRequest, TurnResponse};
pub use handlers::TurnAppState;
pub use routes::routes;
