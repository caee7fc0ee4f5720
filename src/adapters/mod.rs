//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Text generation (OpenAI, mock) and LLM-backed classifiers
//! - `memory` - In-memory repositories
//! - `http` - axum REST surface for the turn pipeline

pub mod ai;
pub mod http;
pub mod memory;
