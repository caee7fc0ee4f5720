//! Multi-intent orchestration configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::orchestration::composition::ConflictPolicy;

use super::error::ValidationError;

/// Thresholds for running several mode handlers in one turn
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationConfig {
    /// Secondaries must score strictly above this to be invoked
    #[serde(default = "default_secondary_threshold")]
    pub secondary_confidence_threshold: f64,

    /// Minimum secondary confidence for a message to count as multi-intent
    #[serde(default = "default_min_secondary")]
    pub min_secondary_confidence: f64,

    /// A primary reply longer than this is returned alone
    #[serde(default = "default_long_response_chars")]
    pub long_response_chars: usize,

    #[serde(default = "default_handler_timeout_ms")]
    pub handler_timeout_ms: u64,

    #[serde(default = "default_conflict_min_length")]
    pub conflict_min_length: usize,

    #[serde(default = "default_conflict_shared_words")]
    pub conflict_shared_words: usize,
}

impl OrchestrationConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy {
            min_length: self.conflict_min_length,
            shared_word_limit: self.conflict_shared_words,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            (
                "orchestration.secondary_confidence_threshold",
                self.secondary_confidence_threshold,
            ),
            (
                "orchestration.min_secondary_confidence",
                self.min_secondary_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::out_of_range(field, 0.0, 1.0));
            }
        }
        if self.handler_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("orchestration.handler_timeout_ms"));
        }
        if self.long_response_chars == 0 {
            return Err(ValidationError::MustBePositive("orchestration.long_response_chars"));
        }
        Ok(())
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            secondary_confidence_threshold: default_secondary_threshold(),
            min_secondary_confidence: default_min_secondary(),
            long_response_chars: default_long_response_chars(),
            handler_timeout_ms: default_handler_timeout_ms(),
            conflict_min_length: default_conflict_min_length(),
            conflict_shared_words: default_conflict_shared_words(),
        }
    }
}

fn default_secondary_threshold() -> f64 {
    0.6
}

fn default_min_secondary() -> f64 {
    0.3
}

fn default_long_response_chars() -> usize {
    300
}

fn default_handler_timeout_ms() -> u64 {
    8000
}

fn default_conflict_min_length() -> usize {
    ConflictPolicy::default().min_length
}

fn default_conflict_shared_words() -> usize {
    ConflictPolicy::default().shared_word_limit
}
