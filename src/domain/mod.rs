//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, validation errors)
//! - `memory` - Decaying, reinforced context elements
//! - `conversation` - Conversations, messages, state snapshots, modes and goals
//! - `classification` - Safety/intent signals and arbitration
//! - `enrichment` - Topic domains, extractions, suggestions and clarifications
//! - `orchestration` - Multi-intent results, mode segments and composition rules

pub mod classification;
pub mod conversation;
pub mod enrichment;
pub mod foundation;
pub mod memory;
pub mod orchestration;
