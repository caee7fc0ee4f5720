//! Wiring - builds the turn pipeline from configuration.
//!
//! Shared by the binary and the integration tests, which pass their own
//! generator and repositories.

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use crate::adapters::ai::{
    LlmIntentClassifier, LlmSafetyClassifier, MockTextGenerator, OpenAIConfig, OpenAIGenerator,
};
use crate::adapters::memory::{
    InMemoryClarificationRepository, InMemoryConversationRepository,
    InMemoryExtractionRepository, InMemoryGoalRepository, InMemoryMessageRepository,
    InMemoryStateRepository,
};
use crate::application::classification::ClassificationService;
use crate::application::enrichment::goals::register_goals;
use crate::application::enrichment::{
    load_definitions, DomainRegistry, EnrichmentCoordinator, EnrichmentSettings, RegistryError,
};
use crate::application::handlers::{ProcessTurnHandler, TurnRepositories, TurnSettings};
use crate::application::modes::{ModeRegistry, ModeRegistryError};
use crate::application::orchestration::{
    LlmMultiIntentDetector, OrchestratorSettings, ResponseComposer, ResponseOrchestrator,
};
use crate::config::{AiConfig, AiProvider, AppConfig, ValidationError};
use crate::domain::classification::{
    IntentClassifier, RuleBasedIntentClassifier, RuleBasedSafetyClassifier, SafetyClassifier,
};
use crate::domain::enrichment::KeywordRelevanceDetector;
use crate::ports::{
    ClarificationRepository, ConversationRepository, ExtractionRepository, GenerationError,
    GoalRepository, MessageRepository, StateRepository, TextGenerator,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Text generator unavailable: {0}")]
    Generator(#[from] GenerationError),

    #[error("Domain registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("Mode registry: {0}")]
    Modes(#[from] ModeRegistryError),
}

/// Every repository the pipeline touches
#[derive(Clone)]
pub struct Repositories {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub states: Arc<dyn StateRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub extractions: Arc<dyn ExtractionRepository>,
    pub clarifications: Arc<dyn ClarificationRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            conversations: Arc::new(InMemoryConversationRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            states: Arc::new(InMemoryStateRepository::new()),
            goals: Arc::new(InMemoryGoalRepository::new()),
            extractions: Arc::new(InMemoryExtractionRepository::new()),
            clarifications: Arc::new(InMemoryClarificationRepository::new()),
        }
    }

    fn for_turns(&self) -> TurnRepositories {
        TurnRepositories {
            conversations: self.conversations.clone(),
            messages: self.messages.clone(),
            states: self.states.clone(),
            goals: self.goals.clone(),
            clarifications: self.clarifications.clone(),
        }
    }
}

/// The configured text generator.
pub fn build_generator(config: &AiConfig) -> Result<Arc<dyn TextGenerator>, BootstrapError> {
    match config.provider {
        AiProvider::Mock => {
            info!("Using mock text generator");
            Ok(Arc::new(MockTextGenerator::new()))
        }
        AiProvider::OpenAI => {
            let api_key = config
                .api_key
                .as_ref()
                .ok_or(ValidationError::MissingRequired("AI__API_KEY"))?;
            let openai = OpenAIConfig::new(api_key.expose_secret().clone())
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            info!(model = %config.model, "Using OpenAI text generator");
            Ok(Arc::new(OpenAIGenerator::new(openai)?))
        }
    }
}

/// Builds the full turn pipeline around `generator` and `repos`.
pub fn build_turn_handler(
    config: &AppConfig,
    generator: Arc<dyn TextGenerator>,
    repos: &Repositories,
) -> Result<ProcessTurnHandler, BootstrapError> {
    let modes = Arc::new(ModeRegistry::with_defaults(generator.clone())?);

    let (safety, intent): (Arc<dyn SafetyClassifier>, Arc<dyn IntentClassifier>) =
        if config.features.llm_classification {
            (
                Arc::new(LlmSafetyClassifier::new(generator.clone())),
                Arc::new(LlmIntentClassifier::new(generator.clone(), modes.descriptors())),
            )
        } else {
            (Arc::new(RuleBasedSafetyClassifier), Arc::new(RuleBasedIntentClassifier))
        };

    let mut domains = register_goals(DomainRegistry::builder(), generator.clone())?;
    if let Some(path) = &config.enrichment.domains_path {
        let overrides = load_definitions(path)?;
        info!(path = %path.display(), domains = overrides.len(), "Loaded domain definitions");
        domains = domains.with_definition_overrides(overrides);
    }
    let registry = domains.build()?;

    let decay = config.memory.decay_policy();
    let enrichment = EnrichmentCoordinator::new(
        Arc::new(registry),
        Arc::new(KeywordRelevanceDetector),
        repos.extractions.clone(),
        repos.clarifications.clone(),
        decay.clone(),
        EnrichmentSettings {
            max_suggestions: config.enrichment.max_suggestions,
            clarification_ttl_secs: config.enrichment.clarification_ttl_secs,
        },
    );

    let detector = LlmMultiIntentDetector::new(generator.clone())
        .with_min_secondary_confidence(config.orchestration.min_secondary_confidence);

    let orchestrator = ResponseOrchestrator::new(
        modes,
        ResponseComposer::new(generator, config.orchestration.conflict_policy()),
        OrchestratorSettings {
            secondary_confidence_threshold: config.orchestration.secondary_confidence_threshold,
            long_response_chars: config.orchestration.long_response_chars,
            handler_timeout: config.orchestration.handler_timeout(),
        },
    );

    Ok(ProcessTurnHandler::new(
        repos.for_turns(),
        ClassificationService::new(safety, intent),
        enrichment,
        Arc::new(detector),
        orchestrator,
        decay,
        TurnSettings {
            recent_window: config.enrichment.recent_window,
        },
    ))
}
