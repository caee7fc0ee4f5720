//! Confidant - conversational companion backend
//!
//! Each user message runs through one turn pipeline: memory decay, safety
//! and intent classification, domain enrichment, multi-intent detection and
//! response orchestration across mode handlers.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
