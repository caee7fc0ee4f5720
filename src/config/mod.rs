//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CONFIDANT` prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use confidant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod enrichment;
mod error;
mod features;
mod memory;
mod orchestration;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use enrichment::EnrichmentConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use memory::MemoryConfig;
pub use orchestration::OrchestrationConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only `ai.api_key` is required when the
/// OpenAI provider is selected. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Text generation provider
    #[serde(default)]
    pub ai: AiConfig,

    /// Memory decay tuning
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Multi-intent orchestration thresholds
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Domain enrichment settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CONFIDANT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CONFIDANT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CONFIDANT__AI__API_KEY=...` -> `ai.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONFIDANT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.memory.validate()?;
        self.orchestration.validate()?;
        self.enrichment.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CONFIDANT__AI__API_KEY",
        "CONFIDANT__AI__PROVIDER",
        "CONFIDANT__SERVER__PORT",
        "CONFIDANT__SERVER__ENVIRONMENT",
        "CONFIDANT__ORCHESTRATION__HANDLER_TIMEOUT_MS",
        "CONFIDANT__FEATURES__LLM_CLASSIFICATION",
    ];

    fn set_minimal_env() {
        env::set_var("CONFIDANT__AI__API_KEY", "sk-test-xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.ai.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.orchestration.handler_timeout_ms, 8000);
        assert_eq!(config.enrichment.recent_window, 6);
        assert!(config.features.llm_classification);
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CONFIDANT__SERVER__PORT", "3000");
        env::set_var("CONFIDANT__ORCHESTRATION__HANDLER_TIMEOUT_MS", "250");
        env::set_var("CONFIDANT__FEATURES__LLM_CLASSIFICATION", "false");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.orchestration.handler_timeout_ms, 250);
        assert!(!config.features.llm_classification);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CONFIDANT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_mock_provider_validates_without_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CONFIDANT__AI__PROVIDER", "mock");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.provider, AiProvider::Mock);
        assert!(config.validate().is_ok());
    }
}
