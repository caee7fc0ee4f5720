//! ResponseOrchestrator - one reply from one or several mode handlers
//!
//! Single-mode turns invoke only the primary handler. Multi-intent turns
//! invoke the primary first, then the confident secondaries concurrently
//! under a per-handler timeout, and compose the survivors. Any failure
//! after the primary falls back to the primary alone, then to a fixed
//! reply.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::conversation::ResponseMode;
use crate::domain::orchestration::{
    merge_state_updates, CompositionError, CompositionStrategy, ContentType, HandlerError,
    HandlerRequest, ModeScore, ModeSegment, MultiIntentResult, PRIMARY_PRIORITY,
};

use crate::application::modes::ModeRegistry;

use super::composer::ResponseComposer;

/// Reply used when even the primary handler cannot answer.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble putting my thoughts together right now. Could you say that again?";

/// Orchestration thresholds
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Secondaries must be strictly more confident than this.
    pub secondary_confidence_threshold: f64,
    /// A primary reply longer than this is returned alone.
    pub long_response_chars: usize,
    pub handler_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            secondary_confidence_threshold: 0.6,
            long_response_chars: 300,
            handler_timeout: Duration::from_millis(8000),
        }
    }
}

/// The composed reply for one turn
#[derive(Debug, Clone)]
pub struct OrchestratedResponse {
    pub content: String,
    /// Segments that made it into the reply, primary first.
    pub segments: Vec<ModeSegment>,
    pub state_updates: serde_json::Map<String, serde_json::Value>,
    pub orchestrated: bool,
}

impl OrchestratedResponse {
    fn single(segment: ModeSegment) -> Self {
        Self {
            content: segment.content.clone(),
            state_updates: merge_state_updates(std::slice::from_ref(&segment)),
            segments: vec![segment],
            orchestrated: false,
        }
    }

    fn fallback(mode: ResponseMode) -> Self {
        let segment =
            ModeSegment::text(mode, FALLBACK_REPLY, 0.0).with_content_type(ContentType::Fallback);
        Self {
            content: FALLBACK_REPLY.to_string(),
            segments: vec![segment],
            state_updates: serde_json::Map::new(),
            orchestrated: false,
        }
    }

    /// Modes that contributed, primary first.
    pub fn modes(&self) -> Vec<&ResponseMode> {
        self.segments.iter().map(|s| &s.mode).collect()
    }
}

#[derive(Debug, Error)]
enum OrchestrationFailure {
    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

pub struct ResponseOrchestrator {
    modes: Arc<ModeRegistry>,
    composer: ResponseComposer,
    settings: OrchestratorSettings,
}

impl ResponseOrchestrator {
    pub fn new(
        modes: Arc<ModeRegistry>,
        composer: ResponseComposer,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            modes,
            composer,
            settings,
        }
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    /// Never fails; the worst case is [`FALLBACK_REPLY`].
    pub async fn respond(
        &self,
        detection: &MultiIntentResult,
        request: HandlerRequest<'_>,
    ) -> OrchestratedResponse {
        let primary_mode = &detection.primary.mode;
        let request = request.with_priority(PRIMARY_PRIORITY);

        // A crisis reply is never combined with anything else.
        let single = !detection.requires_orchestration || request.decision.safety_context.is_crisis;
        if !single {
            match self.orchestrate(detection, request).await {
                Ok(response) => return response,
                Err(err) => warn!(error = %err, "Orchestration failed, retrying primary alone"),
            }
        }

        match self.invoke(primary_mode, request).await {
            Ok(segment) => OrchestratedResponse::single(segment),
            Err(err) => {
                error!(mode = %primary_mode, error = %err, "Primary handler failed, using fallback");
                OrchestratedResponse::fallback(primary_mode.clone())
            }
        }
    }

    async fn orchestrate(
        &self,
        detection: &MultiIntentResult,
        request: HandlerRequest<'_>,
    ) -> Result<OrchestratedResponse, OrchestrationFailure> {
        let primary = self.invoke(&detection.primary.mode, request).await?;

        let survivors: Vec<&ModeScore> = detection
            .secondary
            .iter()
            .filter(|s| s.confidence > self.settings.secondary_confidence_threshold)
            .collect();
        if survivors.is_empty() || primary.char_len() > self.settings.long_response_chars {
            debug!(
                survivors = survivors.len(),
                primary_chars = primary.char_len(),
                "Returning primary response alone"
            );
            return Ok(OrchestratedResponse::single(primary));
        }

        let timeout_ms = self.settings.handler_timeout.as_millis() as u64;
        let secondaries = survivors.iter().enumerate().map(|(i, score)| {
            let request = request.with_priority(PRIMARY_PRIORITY + 1 + i as u32);
            async move {
                let outcome = tokio::time::timeout(
                    self.settings.handler_timeout,
                    self.invoke(&score.mode, request),
                )
                .await
                .unwrap_or(Err(HandlerError::Timeout(timeout_ms)));
                (&score.mode, outcome)
            }
        });
        let results = join_all(secondaries).await;

        let mut segments = vec![primary];
        for (mode, outcome) in results {
            match outcome {
                Ok(segment) => segments.push(segment),
                Err(err) => warn!(mode = %mode, error = %err, "Dropping secondary handler"),
            }
        }
        if segments.len() == 1 {
            return Ok(OrchestratedResponse::single(segments.remove(0)));
        }

        let strategy = detection
            .composition_strategy
            .unwrap_or(CompositionStrategy::Sequential);
        let content = self.composer.compose(&segments, strategy).await?;

        Ok(OrchestratedResponse {
            content,
            state_updates: merge_state_updates(&segments),
            segments,
            orchestrated: true,
        })
    }

    async fn invoke(
        &self,
        mode: &ResponseMode,
        request: HandlerRequest<'_>,
    ) -> Result<ModeSegment, HandlerError> {
        let handler = self.modes.handler_for(mode)?;
        let segment = handler.respond(&request).await?;
        Ok(segment.with_priority(request.priority))
    }
}
