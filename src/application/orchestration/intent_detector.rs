//! LlmMultiIntentDetector - which modes does this message need?
//!
//! Advertises the registered modes to the text generator and reads back a
//! primary mode with optional secondaries. Modes the generator invents are
//! discarded.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::conversation::ResponseMode;
use crate::domain::orchestration::{
    CompositionStrategy, DetectionError, DetectionInput, ModeDescriptor, ModeScore,
    MultiIntentDetector, MultiIntentResult,
};
use crate::ports::{
    parse_json_object, ChatMessage, ChatRole, GenerationPurpose, GenerationRequest, TextGenerator,
};

/// Default floor for a secondary mode to trigger orchestration.
pub const DEFAULT_MIN_SECONDARY_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Deserialize)]
struct ScorePayload {
    mode: String,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectionPayload {
    primary: ScorePayload,
    #[serde(default)]
    secondary: Vec<ScorePayload>,
    #[serde(default)]
    composition_strategy: Option<CompositionStrategy>,
}

/// Multi-intent detector using the text generator
pub struct LlmMultiIntentDetector {
    generator: Arc<dyn TextGenerator>,
    min_secondary_confidence: f64,
}

impl LlmMultiIntentDetector {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            min_secondary_confidence: DEFAULT_MIN_SECONDARY_CONFIDENCE,
        }
    }

    pub fn with_min_secondary_confidence(mut self, min_secondary_confidence: f64) -> Self {
        self.min_secondary_confidence = min_secondary_confidence;
        self
    }

    fn system_prompt(modes: &[ModeDescriptor], current_mode: &ResponseMode) -> String {
        let modes = modes
            .iter()
            .map(|m| format!("- {}: {}", m.mode, m.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You decide which response modes a message to a companion app needs.
Available modes:
{}
The conversation is currently in "{}" mode.

A message can need more than one mode, e.g. a greeting followed by a goal.
Respond with JSON only:
{{
  "primary": {{ "mode": "<mode>", "confidence": 0.0-1.0 }},
  "secondary": [{{ "mode": "<mode>", "confidence": 0.0-1.0 }}],
  "compositionStrategy": "sequential" | "blended"
}}"#,
            modes, current_mode
        )
    }

    /// Keeps only modes from `available`; an unknown primary is an error.
    fn interpret(
        &self,
        payload: DetectionPayload,
        available: &[ModeDescriptor],
    ) -> Result<MultiIntentResult, DetectionError> {
        let known = |raw: &str| -> Option<ResponseMode> {
            let mode = ResponseMode::new(raw).ok()?;
            available.iter().any(|m| m.mode == mode).then_some(mode)
        };

        let primary_mode = known(&payload.primary.mode).ok_or_else(|| {
            DetectionError::InvalidResponse(format!("unknown mode '{}'", payload.primary.mode))
        })?;
        let primary = ModeScore::new(primary_mode, payload.primary.confidence.unwrap_or(1.0));

        let secondary: Vec<ModeScore> = payload
            .secondary
            .into_iter()
            .filter_map(|s| match known(&s.mode) {
                Some(mode) => Some(ModeScore::new(mode, s.confidence.unwrap_or(0.0))),
                None => {
                    debug!(mode = %s.mode, "Discarding unknown secondary mode");
                    None
                }
            })
            .collect();

        Ok(MultiIntentResult::from_scores(
            primary,
            secondary,
            self.min_secondary_confidence,
            payload.composition_strategy,
        ))
    }
}

#[async_trait]
impl MultiIntentDetector for LlmMultiIntentDetector {
    async fn detect(&self, input: &DetectionInput<'_>) -> Result<MultiIntentResult, DetectionError> {
        let request = GenerationRequest::new(GenerationPurpose::MultiIntentDetection)
            .with_system_prompt(Self::system_prompt(input.available_modes, input.current_mode))
            .with_messages(input.recent_messages.iter().map(ChatMessage::from))
            .with_message(ChatRole::User, input.message)
            .with_temperature(0.0)
            .with_max_tokens(200)
            .json();

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| DetectionError::Generation(e.to_string()))?;

        let payload: DetectionPayload =
            parse_json_object(&response.content).map_err(DetectionError::InvalidResponse)?;
        self.interpret(payload, input.available_modes)
    }
}

/// Runs `detector`, replacing any failure with the single-mode fallback.
pub async fn detect_or_fallback(
    detector: &dyn MultiIntentDetector,
    input: &DetectionInput<'_>,
) -> MultiIntentResult {
    match detector.detect(input).await {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "Multi-intent detection failed, using fallback");
            MultiIntentResult::fallback(input.current_mode.clone())
        }
    }
}
