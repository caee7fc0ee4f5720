//! Error types for domain enrichment
//!
//! A failing extractor or strategy only loses its own contribution; the
//! coordinator logs these and carries on.

/// Extraction errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ExtractionError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Invalid extractor response: {0}")]
    InvalidResponse(String),

    #[error("No extractor registered for domain '{0}'")]
    NotRegistered(String),
}

/// Suggestion strategy errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StrategyError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Strategy cannot use extraction: {0}")]
    UnusablePayload(String),
}

/// Relevance detection errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RelevanceError {
    #[error("Relevance detection failed: {0}")]
    DetectionFailed(String),
}
