//! Classification signals: safety level and user intent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::{Message, ResponseMode};

/// Intent label used when the intent classifier could not decide.
pub const UNCLEAR_INTENT: &str = "UNCLEAR";

/// Confidence attached to the fallback intent.
pub const FALLBACK_INTENT_CONFIDENCE: f64 = 0.3;

/// Signal recorded when the safety classifier failed.
pub const CLASSIFIER_UNAVAILABLE_SIGNAL: &str = "classifier_unavailable";

/// How worried the agent should be about the user's wellbeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    Safe,
    Concern,
    Crisis,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SafetyLevel::Safe => "SAFE",
            SafetyLevel::Concern => "CONCERN",
            SafetyLevel::Crisis => "CRISIS",
        };
        write!(f, "{}", s)
    }
}

/// Register the reply should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Normal,
    Empathetic,
    Urgent,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Normal => "normal",
            Tone::Empathetic => "empathetic",
            Tone::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the safety classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyResult {
    pub level: SafetyLevel,
    /// Short tags describing what was detected (`self_harm`, `stress`, ...).
    pub signals: Vec<String>,
    pub suggested_tone: Tone,
}

impl SafetyResult {
    pub fn safe() -> Self {
        Self {
            level: SafetyLevel::Safe,
            signals: Vec::new(),
            suggested_tone: Tone::Normal,
        }
    }

    /// Conservative result used when classification fails.
    pub fn fallback() -> Self {
        Self {
            level: SafetyLevel::Concern,
            signals: vec![CLASSIFIER_UNAVAILABLE_SIGNAL.to_string()],
            suggested_tone: Tone::Empathetic,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.signals.iter().any(|s| s == CLASSIFIER_UNAVAILABLE_SIGNAL)
    }
}

/// Output of the intent classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Free-form intent label, e.g. `GOAL_SETTING`.
    pub intent: String,
    pub suggested_mode: ResponseMode,
    pub confidence: f64,
    /// Topics or objects mentioned in the message.
    pub entities: Vec<String>,
}

impl IntentResult {
    pub fn new(intent: impl Into<String>, suggested_mode: ResponseMode, confidence: f64) -> Self {
        Self {
            intent: intent.into(),
            suggested_mode,
            confidence: confidence.clamp(0.0, 1.0),
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    /// Conservative result used when classification fails.
    pub fn fallback() -> Self {
        Self::new(UNCLEAR_INTENT, ResponseMode::casual(), FALLBACK_INTENT_CONFIDENCE)
    }
}

/// What classifiers get to look at.
#[derive(Debug, Clone)]
pub struct ClassificationInput {
    pub message: String,
    pub recent_messages: Vec<Message>,
    pub current_mode: ResponseMode,
}

impl ClassificationInput {
    pub fn new(message: impl Into<String>, current_mode: ResponseMode) -> Self {
        Self {
            message: message.into(),
            recent_messages: Vec::new(),
            current_mode,
        }
    }

    pub fn with_recent_messages(mut self, recent_messages: Vec<Message>) -> Self {
        self.recent_messages = recent_messages;
        self
    }
}
