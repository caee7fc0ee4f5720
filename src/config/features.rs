//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,

    /// Classify safety and intent with the text generator.
    /// When off, keyword rules are used instead.
    #[serde(default = "default_llm_classification")]
    pub llm_classification: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            json_logs: false,
            llm_classification: default_llm_classification(),
        }
    }
}

fn default_llm_classification() -> bool {
    true
}
