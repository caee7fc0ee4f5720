//! LLM-backed safety and intent classifiers.
//!
//! Each classifier issues one JSON-format generation call. The pipeline
//! runs them sequentially, safety first.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::classification::{
    ClassificationError, ClassificationInput, IntentClassifier, IntentResult, SafetyClassifier,
    SafetyLevel, SafetyResult, Tone,
};
use crate::domain::conversation::ResponseMode;
use crate::domain::orchestration::ModeDescriptor;
use crate::ports::{
    parse_json_object, ChatMessage, ChatRole, GenerationPurpose, GenerationRequest, TextGenerator,
};

const SAFETY_PROMPT: &str = r#"You screen messages to a supportive companion app for wellbeing risk.
Classify the latest user message and respond with JSON only:
{
  "level": "SAFE" | "CONCERN" | "CRISIS",
  "signals": ["short_snake_case_tags"],
  "tone": "normal" | "empathetic" | "urgent"
}
Use CRISIS only for risk of self-harm, suicide or immediate danger."#;

fn recent_context(input: &ClassificationInput) -> Vec<ChatMessage> {
    input.recent_messages.iter().map(ChatMessage::from).collect()
}

#[derive(Debug, Deserialize)]
struct SafetyPayload {
    level: SafetyLevel,
    #[serde(default)]
    signals: Vec<String>,
    #[serde(default)]
    tone: Option<Tone>,
}

/// Safety classifier using the text generator
pub struct LlmSafetyClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl LlmSafetyClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn parse(content: &str) -> Result<SafetyResult, ClassificationError> {
        let payload: SafetyPayload =
            parse_json_object(content).map_err(ClassificationError::InvalidResponse)?;

        let default_tone = match payload.level {
            SafetyLevel::Safe => Tone::Normal,
            SafetyLevel::Concern => Tone::Empathetic,
            SafetyLevel::Crisis => Tone::Urgent,
        };

        Ok(SafetyResult {
            level: payload.level,
            signals: payload.signals,
            suggested_tone: payload.tone.unwrap_or(default_tone),
        })
    }
}

#[async_trait]
impl SafetyClassifier for LlmSafetyClassifier {
    async fn classify(&self, input: &ClassificationInput) -> Result<SafetyResult, ClassificationError> {
        let request = GenerationRequest::new(GenerationPurpose::SafetyClassification)
            .with_system_prompt(SAFETY_PROMPT)
            .with_messages(recent_context(input))
            .with_message(ChatRole::User, input.message.clone())
            .with_temperature(0.0)
            .with_max_tokens(200)
            .json();

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| ClassificationError::Generation(e.to_string()))?;

        Self::parse(&response.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentPayload {
    intent: String,
    #[serde(alias = "mode")]
    suggested_mode: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    entities: Vec<String>,
}

/// Intent classifier using the text generator
///
/// Suggested modes outside the registered set are replaced by the
/// conversation's current mode.
pub struct LlmIntentClassifier {
    generator: Arc<dyn TextGenerator>,
    modes: Vec<ModeDescriptor>,
}

impl LlmIntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, modes: Vec<ModeDescriptor>) -> Self {
        Self { generator, modes }
    }

    fn system_prompt(&self) -> String {
        let modes = self
            .modes
            .iter()
            .map(|m| format!("- {}: {}", m.mode, m.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You route messages for a supportive companion app.
Available response modes:
{}

Respond with JSON only:
{{
  "intent": "SHORT_UPPER_SNAKE_LABEL",
  "suggestedMode": "<one of the modes above>",
  "confidence": 0.0-1.0,
  "entities": ["topics or objects mentioned"]
}}"#,
            modes
        )
    }

    fn parse(&self, content: &str, current_mode: &ResponseMode) -> Result<IntentResult, ClassificationError> {
        let payload: IntentPayload =
            parse_json_object(content).map_err(ClassificationError::InvalidResponse)?;

        let mode = ResponseMode::new(&payload.suggested_mode)
            .ok()
            .filter(|mode| self.modes.iter().any(|m| &m.mode == mode))
            .unwrap_or_else(|| current_mode.clone());

        Ok(IntentResult::new(payload.intent, mode, payload.confidence.unwrap_or(0.5))
            .with_entities(payload.entities))
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, input: &ClassificationInput) -> Result<IntentResult, ClassificationError> {
        let request = GenerationRequest::new(GenerationPurpose::IntentClassification)
            .with_system_prompt(self.system_prompt())
            .with_messages(recent_context(input))
            .with_message(ChatRole::User, input.message.clone())
            .with_temperature(0.0)
            .with_max_tokens(200)
            .json();

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| ClassificationError::Generation(e.to_string()))?;

        self.parse(&response.content, &input.current_mode)
    }
}
