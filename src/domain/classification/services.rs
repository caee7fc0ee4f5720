//! Domain Services for classification
//!
//! Classifier traits implemented by adapters, plus keyword-based defaults
//! used when model-backed classification is switched off.

use async_trait::async_trait;

use crate::domain::conversation::ResponseMode;

use super::{
    errors::ClassificationError,
    values::{ClassificationInput, IntentResult, SafetyLevel, SafetyResult, Tone},
};

/// Assesses the wellbeing risk expressed in a message.
#[async_trait]
pub trait SafetyClassifier: Send + Sync {
    async fn classify(&self, input: &ClassificationInput) -> Result<SafetyResult, ClassificationError>;
}

/// Determines what the user wants and which mode should answer.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, input: &ClassificationInput) -> Result<IntentResult, ClassificationError>;
}

const CRISIS_PHRASES: &[(&str, &str)] = &[
    ("kill myself", "self_harm"),
    ("end my life", "self_harm"),
    ("suicide", "self_harm"),
    ("want to die", "self_harm"),
    ("hurt myself", "self_harm"),
    ("self harm", "self_harm"),
    ("no reason to live", "hopelessness"),
];

const CONCERN_PHRASES: &[(&str, &str)] = &[
    ("hopeless", "hopelessness"),
    ("depressed", "low_mood"),
    ("overwhelmed", "stress"),
    ("stressed", "stress"),
    ("anxious", "anxiety"),
    ("panic", "anxiety"),
    ("lonely", "loneliness"),
    ("can't cope", "stress"),
    ("exhausted", "burnout"),
];

/// Keyword-based safety classifier
pub struct RuleBasedSafetyClassifier;

impl RuleBasedSafetyClassifier {
    fn matches(text: &str, table: &[(&str, &str)]) -> Vec<String> {
        let mut signals: Vec<String> = Vec::new();
        for (phrase, signal) in table {
            if text.contains(phrase) && !signals.iter().any(|s| s == signal) {
                signals.push(signal.to_string());
            }
        }
        signals
    }

    pub fn assess(&self, message: &str) -> SafetyResult {
        let lowercase = message.to_lowercase();

        let crisis = Self::matches(&lowercase, CRISIS_PHRASES);
        if !crisis.is_empty() {
            return SafetyResult {
                level: SafetyLevel::Crisis,
                signals: crisis,
                suggested_tone: Tone::Urgent,
            };
        }

        let concern = Self::matches(&lowercase, CONCERN_PHRASES);
        if !concern.is_empty() {
            return SafetyResult {
                level: SafetyLevel::Concern,
                signals: concern,
                suggested_tone: Tone::Empathetic,
            };
        }

        SafetyResult::safe()
    }
}

#[async_trait]
impl SafetyClassifier for RuleBasedSafetyClassifier {
    async fn classify(&self, input: &ClassificationInput) -> Result<SafetyResult, ClassificationError> {
        Ok(self.assess(&input.message))
    }
}

const TOPIC_WORDS: &[&str] = &[
    "work", "job", "family", "health", "sleep", "money", "school", "exercise", "books", "reading",
    "relationship", "friends",
];

/// Keyword-based intent classifier (default implementation)
pub struct RuleBasedIntentClassifier;

impl RuleBasedIntentClassifier {
    pub fn detect(&self, message: &str, current_mode: &ResponseMode) -> IntentResult {
        let lowercase = message.to_lowercase();
        let entities: Vec<String> = TOPIC_WORDS
            .iter()
            .filter(|w| lowercase.split(|c: char| !c.is_alphanumeric()).any(|t| t == **w))
            .map(|w| w.to_string())
            .collect();

        // Goal signals
        if lowercase.contains("goal") || lowercase.contains("target") {
            return IntentResult::new("GOAL_SETTING", ResponseMode::goal_tracking(), 0.8)
                .with_entities(entities);
        }
        if lowercase.contains("progress") || lowercase.contains("finished") {
            return IntentResult::new("GOAL_PROGRESS", ResponseMode::goal_tracking(), 0.7)
                .with_entities(entities);
        }

        // Feelings
        if lowercase.contains("feel")
            || lowercase.contains("sad")
            || lowercase.contains("stressed")
            || lowercase.contains("anxious")
        {
            return IntentResult::new("EMOTIONAL_SUPPORT", ResponseMode::emotional_support(), 0.7)
                .with_entities(entities);
        }

        // Greetings
        let first_word = lowercase
            .split(|c: char| !c.is_alphanumeric())
            .find(|t| !t.is_empty())
            .unwrap_or_default();
        let greeting = ["hi", "hello", "hey"].contains(&first_word)
            || lowercase.trim_start().starts_with("good morning")
            || lowercase.trim_start().starts_with("good evening");
        if greeting {
            return IntentResult::new("GREETING", ResponseMode::smalltalk(), 0.7)
                .with_entities(entities);
        }

        IntentResult::new("CONTINUE", current_mode.clone(), 0.5).with_entities(entities)
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedIntentClassifier {
    async fn classify(&self, input: &ClassificationInput) -> Result<IntentResult, ClassificationError> {
        Ok(self.detect(&input.message, &input.current_mode))
    }
}
