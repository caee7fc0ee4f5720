//! Domain enrichment configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Enrichment coordinator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Number of recent messages handed to extractors
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Cap on merged steering suggestions per turn
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_clarification_ttl")]
    pub clarification_ttl_secs: u64,

    /// Optional YAML file with extra domain definitions
    pub domains_path: Option<PathBuf>,
}

impl EnrichmentConfig {
    pub fn clarification_ttl(&self) -> Duration {
        Duration::from_secs(self.clarification_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_suggestions == 0 {
            return Err(ValidationError::MustBePositive("enrichment.max_suggestions"));
        }
        if self.clarification_ttl_secs == 0 {
            return Err(ValidationError::MustBePositive(
                "enrichment.clarification_ttl_secs",
            ));
        }
        if let Some(path) = &self.domains_path {
            if !path.is_file() {
                return Err(ValidationError::DomainFileMissing(
                    path.display().to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            max_suggestions: default_max_suggestions(),
            clarification_ttl_secs: default_clarification_ttl(),
            domains_path: None,
        }
    }
}

fn default_recent_window() -> usize {
    6
}

fn default_max_suggestions() -> usize {
    5
}

fn default_clarification_ttl() -> u64 {
    600
}
