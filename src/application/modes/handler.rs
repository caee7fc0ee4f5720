//! PromptedModeHandler - one response mode backed by the text generator

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::classification::{crisis_resources, crisis_response};
use crate::domain::conversation::ResponseMode;
use crate::domain::orchestration::{
    ContentType, HandlerError, HandlerRequest, ModeHandler, ModeSegment,
};
use crate::ports::{ChatMessage, ChatRole, GenerationPurpose, GenerationRequest, TextGenerator};

/// Context elements included in the prompt.
const PROMPT_CONTEXT_LIMIT: usize = 5;

/// A mode defined by its instructions; the prompt is assembled per turn
/// from tone, steering hints, goals and the strongest remembered context.
pub struct PromptedModeHandler {
    mode: ResponseMode,
    description: String,
    instructions: String,
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    temperature: f32,
}

impl PromptedModeHandler {
    pub fn new(
        mode: ResponseMode,
        description: impl Into<String>,
        instructions: impl Into<String>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            mode,
            description: description.into(),
            instructions: instructions.into(),
            generator,
            max_tokens: 400,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_system_prompt(&self, request: &HandlerRequest<'_>) -> String {
        let mut prompt = format!(
            "You are Confidant, a warm companion. {}\n\nTone: {}.",
            self.instructions,
            request.decision.safety_context.tone.as_str()
        );

        if !request.is_primary() {
            prompt.push_str(
                "\nAnother reply covers the main point of the message; \
                 address only your part in two or three sentences.",
            );
        }

        let goals: Vec<String> = request
            .state
            .active_goals()
            .map(|g| match g.target_value {
                Some(target) => format!("- {} ({}/{})", g.description, g.progress, target),
                None => format!("- {}", g.description),
            })
            .collect();
        if !goals.is_empty() {
            prompt.push_str(&format!("\n\nActive goals:\n{}", goals.join("\n")));
        }

        if let Some(hints) = request.state.steering_hints.as_ref().filter(|h| !h.is_empty()) {
            let hints: Vec<String> = hints.texts().map(|t| format!("- {}", t)).collect();
            prompt.push_str(&format!("\n\nConsider:\n{}", hints.join("\n")));
        }

        let context = request.state.strongest_context(PROMPT_CONTEXT_LIMIT);
        if !context.is_empty() {
            let remembered: Vec<String> = context
                .iter()
                .map(|e| format!("- {} = {}", e.key, e.value))
                .collect();
            prompt.push_str(&format!("\n\nRemembered context:\n{}", remembered.join("\n")));
        }

        prompt
    }

    fn crisis_segment(&self, request: &HandlerRequest<'_>) -> ModeSegment {
        let resources = request
            .decision
            .safety_context
            .crisis_resources
            .clone()
            .unwrap_or_else(crisis_resources);
        ModeSegment::text(self.mode.clone(), crisis_response(&resources), 1.0)
            .with_priority(request.priority)
            .with_content_type(ContentType::CrisisResponse)
    }
}

#[async_trait]
impl ModeHandler for PromptedModeHandler {
    fn mode(&self) -> &ResponseMode {
        &self.mode
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn respond(&self, request: &HandlerRequest<'_>) -> Result<ModeSegment, HandlerError> {
        if request.decision.safety_context.is_crisis {
            debug!(mode = %self.mode, "Crisis turn, returning fixed response");
            return Ok(self.crisis_segment(request));
        }

        let generation = GenerationRequest::new(GenerationPurpose::ModeResponse(self.mode.clone()))
            .with_system_prompt(self.build_system_prompt(request))
            .with_messages(request.recent_messages.iter().map(ChatMessage::from))
            .with_message(ChatRole::User, request.message)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self
            .generator
            .generate(generation)
            .await
            .map_err(|e| HandlerError::Generation(e.to_string()))?;

        Ok(
            ModeSegment::text(self.mode.clone(), response.content.trim(), request.decision.confidence)
                .with_priority(request.priority)
                .with_state_update(
                    format!("{}_last_at", self.mode),
                    json!(request.decision.timestamp),
                ),
        )
    }
}
