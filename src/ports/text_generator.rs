//! Text Generator Port - Interface for LLM completions.
//!
//! Every model call in the turn pipeline goes through this port: the safety
//! and intent classifiers, the multi-intent detector, domain extractors,
//! suggestion strategies, mode handlers and the composer. Implementations
//! translate between the provider API and these types.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoGenerator;
//!
//! #[async_trait]
//! impl TextGenerator for EchoGenerator {
//!     async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
//!         let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
//!         Ok(GenerationResponse::text(last))
//!     }
//!
//!     fn generator_info(&self) -> GeneratorInfo {
//!         GeneratorInfo::new("echo", "echo-1")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::ResponseMode;
use crate::domain::foundation::DomainId;

/// Port for text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a single completion.
    ///
    /// Dropping the returned future cancels the request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError>;

    /// Generator name and model, for logs.
    fn generator_info(&self) -> GeneratorInfo;
}

/// Why a generation call is being made.
///
/// Used for tracing and by scripted generators to route responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenerationPurpose {
    SafetyClassification,
    IntentClassification,
    MultiIntentDetection,
    DomainExtraction(DomainId),
    Suggestion(DomainId),
    ModeResponse(ResponseMode),
    Composition,
}

impl GenerationPurpose {
    /// Stable label such as `mode_response:smalltalk`.
    pub fn label(&self) -> String {
        match self {
            GenerationPurpose::SafetyClassification => "safety_classification".to_string(),
            GenerationPurpose::IntentClassification => "intent_classification".to_string(),
            GenerationPurpose::MultiIntentDetection => "multi_intent_detection".to_string(),
            GenerationPurpose::DomainExtraction(domain) => format!("domain_extraction:{}", domain),
            GenerationPurpose::Suggestion(domain) => format!("suggestion:{}", domain),
            GenerationPurpose::ModeResponse(mode) => format!("mode_response:{}", mode),
            GenerationPurpose::Composition => "composition".to_string(),
        }
    }
}

impl fmt::Display for GenerationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Output shape requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

/// Request for a completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Conversation messages (history + current user message).
    pub messages: Vec<ChatMessage>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness (0.0 = deterministic).
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
    pub purpose: GenerationPurpose,
}

impl GenerationRequest {
    pub fn new(purpose: GenerationPurpose) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
            purpose,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Requests a JSON object response.
    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }
}

/// A message in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl From<&crate::domain::conversation::Message> for ChatMessage {
    fn from(message: &crate::domain::conversation::Message) -> Self {
        use crate::domain::conversation::MessageRole;
        let role = match message.role {
            MessageRole::User => ChatRole::User,
            MessageRole::Assistant => ChatRole::Assistant,
        };
        Self::new(role, message.content.clone())
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: FinishReason,
}

impl GenerationResponse {
    /// A plain response with no usage information.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            model: String::new(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Generator name and model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub model: String,
}

impl GeneratorInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Text generation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GenerationError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl GenerationError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }
}
