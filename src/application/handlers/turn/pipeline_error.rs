//! Pipeline stages and the error carrying the stage that failed.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::application::enrichment::EnrichmentError;
use crate::domain::foundation::ConversationId;
use crate::ports::RepositoryError;

/// The ordered stages of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Load,
    Decay,
    Classify,
    Enrich,
    Detect,
    Generate,
    Persist,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Load => "load",
            PipelineStage::Decay => "decay",
            PipelineStage::Classify => "classify",
            PipelineStage::Enrich => "enrich",
            PipelineStage::Detect => "detect",
            PipelineStage::Generate => "generate",
            PipelineStage::Persist => "persist",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong inside a stage.
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Conversation has ended: {0}")]
    ConversationEnded(ConversationId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}

impl PipelineFailure {
    /// Failures caused by the request rather than the infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineFailure::EmptyMessage
                | PipelineFailure::ConversationNotFound(_)
                | PipelineFailure::ConversationEnded(_)
        )
    }
}

/// A turn that could not be completed.
#[derive(Debug, Error)]
#[error("Turn failed during {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub source: PipelineFailure,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: impl Into<PipelineFailure>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// Adapter for `map_err` that tags a failure with its stage.
    pub fn at<E: Into<PipelineFailure>>(stage: PipelineStage) -> impl FnOnce(E) -> Self {
        move |err| Self::new(stage, err)
    }
}
