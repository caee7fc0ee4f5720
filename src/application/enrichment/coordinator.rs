//! EnrichmentCoordinator - fan-out over the registered topic domains
//!
//! Three bounded groups per turn, each merged at a single fan-in point:
//!
//! 1. global context extraction and domain relevance, side by side;
//! 2. one extractor per relevant domain;
//! 3. every suggestion strategy of each domain whose extraction was accepted.
//!
//! A failing extractor or strategy is logged and contributes nothing.
//! Repository failures are returned to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::classification::{IntentResult, SafetyResult};
use crate::domain::conversation::{ConversationState, Message};
use crate::domain::enrichment::{
    domain_ids, merge_suggestions, observations_from_classification, ClarificationRecord, DomainRelevance,
    ExtractionContext, ExtractionOutcome, ExtractionRecord, RelevanceDetector, SuggestionContext,
};
use crate::domain::foundation::{ConversationId, DomainId, MessageId, Timestamp};
use crate::domain::memory::DecayPolicy;
use crate::ports::{ClarificationRepository, ExtractionRepository, RepositoryError};

use super::registry::DomainRegistry;

/// Infrastructure failures during enrichment
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Failed to persist enrichment data: {0}")]
    Repository(#[from] RepositoryError),
}

/// Tuning for the coordinator
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentSettings {
    pub max_suggestions: usize,
    pub clarification_ttl_secs: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            clarification_ttl_secs: 600,
        }
    }
}

/// Inputs for one enrichment pass
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentRequest<'a> {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub message: &'a str,
    pub recent_messages: &'a [Message],
    pub safety: &'a SafetyResult,
    pub intent: &'a IntentResult,
    /// Unresolved clarifications loaded for this conversation.
    pub pending_clarifications: &'a [ClarificationRecord],
    pub now: Timestamp,
}

/// Result of one enrichment pass
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub state: ConversationState,
    pub relevant_domains: Vec<DomainId>,
    /// Extractions accepted this turn, in domain order.
    pub accepted: Vec<ExtractionRecord>,
}

pub struct EnrichmentCoordinator {
    registry: Arc<DomainRegistry>,
    relevance: Arc<dyn RelevanceDetector>,
    extractions: Arc<dyn ExtractionRepository>,
    clarifications: Arc<dyn ClarificationRepository>,
    decay: DecayPolicy,
    settings: EnrichmentSettings,
}

impl EnrichmentCoordinator {
    pub fn new(
        registry: Arc<DomainRegistry>,
        relevance: Arc<dyn RelevanceDetector>,
        extractions: Arc<dyn ExtractionRepository>,
        clarifications: Arc<dyn ClarificationRepository>,
        decay: DecayPolicy,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            registry,
            relevance,
            extractions,
            clarifications,
            decay,
            settings,
        }
    }

    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    pub async fn enrich(
        &self,
        state: ConversationState,
        request: &EnrichmentRequest<'_>,
    ) -> Result<EnrichmentOutcome, EnrichmentError> {
        // Steering hints only ever describe the current turn.
        let state = state.with_steering_hints(None);

        // Group 1
        let observations = observations_from_classification(request.safety, request.intent);
        let (context_elements, relevance) = futures::join!(
            async {
                self.decay
                    .merge_observations(&state.context_elements, &observations, request.now)
            },
            self.relevance.detect(request.message, self.registry.definitions()),
        );
        let mut state = state.with_context_elements(context_elements);

        let relevances = match relevance {
            Ok(relevances) => relevances,
            Err(err) => {
                warn!(error = %err, "Domain relevance detection failed");
                Vec::new()
            }
        };
        let relevant_domains = self.relevant_domains(&relevances, request);
        if relevant_domains.is_empty() {
            debug!("No relevant domains, skipping extraction");
            return Ok(EnrichmentOutcome {
                state,
                relevant_domains,
                accepted: Vec::new(),
            });
        }

        // Group 2
        let snapshot = state.clone();
        let extractions = relevant_domains.iter().filter_map(|domain_id| {
            let plugin = self.registry.get(domain_id)?;
            let context = ExtractionContext {
                conversation_id: request.conversation_id,
                message_id: request.message_id,
                message: request.message,
                recent_messages: request.recent_messages,
                state: &snapshot,
                domain: &plugin.definition,
                pending_clarification: request
                    .pending_clarifications
                    .iter()
                    .find(|c| &c.domain_id == domain_id && c.is_pending(request.now)),
            };
            Some(async move { (domain_id, plugin.extractor.extract(&context).await) })
        });
        let results = join_all(extractions).await;

        let mut accepted = Vec::new();
        for (domain_id, result) in results {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(domain = %domain_id, error = %err, "Extractor failed");
                    continue;
                }
            };
            let Some(plugin) = self.registry.get(domain_id) else {
                continue;
            };
            if !plugin.definition.accepts(outcome.confidence) {
                debug!(
                    domain = %domain_id,
                    confidence = outcome.confidence,
                    threshold = plugin.definition.confidence_threshold,
                    "Extraction below threshold, discarded"
                );
                continue;
            }

            let record = self.accept(domain_id, outcome, request).await?;
            state = state.with_extraction(record.clone());
            accepted.push(record);
        }

        if accepted.is_empty() {
            return Ok(EnrichmentOutcome {
                state,
                relevant_domains,
                accepted,
            });
        }

        // Group 3
        let suggestions = accepted.iter().flat_map(|record| {
            let plugin = self.registry.get(&record.domain_id);
            let state = &state;
            plugin
                .into_iter()
                .flat_map(move |plugin| {
                    plugin.strategies.iter().map(move |strategy| {
                        let context = SuggestionContext {
                            message: request.message,
                            state,
                            domain: &plugin.definition,
                            extraction: record,
                        };
                        async move { (strategy.name(), strategy.suggest(&context).await) }
                    })
                })
        });
        let groups: Vec<_> = join_all(suggestions)
            .await
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(suggestions) => Some(suggestions),
                Err(err) => {
                    warn!(strategy = name, error = %err, "Suggestion strategy failed");
                    None
                }
            })
            .collect();

        let bundle = merge_suggestions(groups, self.settings.max_suggestions, request.now);
        let hints = (!bundle.is_empty()).then_some(bundle);
        let state = state.with_steering_hints(hints);

        Ok(EnrichmentOutcome {
            state,
            relevant_domains,
            accepted,
        })
    }

    /// Relevant, enabled, registered domains. A domain waiting on a
    /// clarification answer is always relevant.
    fn relevant_domains(
        &self,
        relevances: &[DomainRelevance],
        request: &EnrichmentRequest<'_>,
    ) -> Vec<DomainId> {
        let mut ids: BTreeSet<DomainId> = domain_ids(relevances).into_iter().collect();
        ids.extend(
            request
                .pending_clarifications
                .iter()
                .filter(|c| c.is_pending(request.now))
                .map(|c| c.domain_id.clone()),
        );
        ids.into_iter()
            .filter(|id| {
                self.registry
                    .get(id)
                    .is_some_and(|plugin| plugin.definition.enabled)
            })
            .collect()
    }

    async fn accept(
        &self,
        domain_id: &DomainId,
        outcome: ExtractionOutcome,
        request: &EnrichmentRequest<'_>,
    ) -> Result<ExtractionRecord, EnrichmentError> {
        let record = ExtractionRecord::new(
            domain_id.clone(),
            outcome.payload,
            outcome.confidence,
            Some(request.message_id),
            request.now,
        );
        self.extractions
            .save(&request.conversation_id, &record)
            .await?;

        if let Some(resolved) = outcome.resolved_clarification {
            self.clarifications.resolve(&resolved).await?;
            debug!(domain = %domain_id, clarification = %resolved, "Clarification resolved");
        }
        if let Some(clarification) = outcome.clarification {
            let pending = ClarificationRecord::open(
                request.conversation_id,
                domain_id.clone(),
                clarification,
                self.settings.clarification_ttl_secs,
                request.now,
            );
            self.clarifications.create(&pending).await?;
            debug!(
                domain = %domain_id,
                state_type = %pending.state_type,
                "Clarification requested"
            );
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryClarificationRepository, InMemoryExtractionRepository};
    use crate::domain::classification::Tone;
    use crate::domain::conversation::ResponseMode;
    use crate::domain::enrichment::{
        ClarificationRequest, DomainDefinition, DomainExtractor, ExtractionError,
        KeywordRelevanceDetector, StrategyError, Suggestion, SuggestionStrategy,
    };
    use crate::domain::classification::SafetyLevel;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedExtractor {
        confidence: f64,
        calls: Arc<AtomicUsize>,
        clarification: Option<ClarificationRequest>,
    }

    impl FixedExtractor {
        fn new(confidence: f64) -> Self {
            Self {
                confidence,
                calls: Arc::new(AtomicUsize::new(0)),
                clarification: None,
            }
        }
    }

    #[async_trait]
    impl DomainExtractor for FixedExtractor {
        async fn extract(
            &self,
            context: &ExtractionContext<'_>,
        ) -> Result<ExtractionOutcome, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcome =
                ExtractionOutcome::new(json!({ "domain": context.domain.id.as_str() }), self.confidence);
            if let Some(pending) = context.pending_clarification {
                outcome = outcome.resolving(pending.id);
            }
            if let Some(request) = &self.clarification {
                outcome = outcome.with_clarification(request.clone());
            }
            Ok(outcome)
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl DomainExtractor for FailingExtractor {
        async fn extract(
            &self,
            _context: &ExtractionContext<'_>,
        ) -> Result<ExtractionOutcome, ExtractionError> {
            Err(ExtractionError::InvalidResponse("not json".to_string()))
        }
    }

    struct ListStrategy(&'static str, Vec<&'static str>);

    #[async_trait]
    impl SuggestionStrategy for ListStrategy {
        fn name(&self) -> &str {
            self.0
        }

        async fn suggest(
            &self,
            context: &SuggestionContext<'_>,
        ) -> Result<Vec<Suggestion>, StrategyError> {
            Ok(self
                .1
                .iter()
                .map(|text| Suggestion::new(context.domain.id.clone(), self.0, *text))
                .collect())
        }
    }

    struct BrokenStrategy;

    #[async_trait]
    impl SuggestionStrategy for BrokenStrategy {
        fn name(&self) -> &str {
            "broken"
        }

        async fn suggest(
            &self,
            _context: &SuggestionContext<'_>,
        ) -> Result<Vec<Suggestion>, StrategyError> {
            Err(StrategyError::UnusablePayload("missing title".to_string()))
        }
    }

    fn id(s: &str) -> DomainId {
        DomainId::new(s).unwrap()
    }

    fn definition(name: &str, keywords: &[&str]) -> DomainDefinition {
        DomainDefinition::new(id(name), name).with_keywords(keywords.iter().copied())
    }

    struct Fixture {
        coordinator: EnrichmentCoordinator,
        extractions: InMemoryExtractionRepository,
        clarifications: InMemoryClarificationRepository,
    }

    fn fixture(registry: DomainRegistry, settings: EnrichmentSettings) -> Fixture {
        let extractions = InMemoryExtractionRepository::new();
        let clarifications = InMemoryClarificationRepository::new();
        let coordinator = EnrichmentCoordinator::new(
            Arc::new(registry),
            Arc::new(KeywordRelevanceDetector),
            Arc::new(extractions.clone()),
            Arc::new(clarifications.clone()),
            DecayPolicy::default(),
            settings,
        );
        Fixture {
            coordinator,
            extractions,
            clarifications,
        }
    }

    struct Turn {
        conversation_id: ConversationId,
        safety: SafetyResult,
        intent: IntentResult,
        pending: Vec<ClarificationRecord>,
        now: Timestamp,
    }

    impl Turn {
        fn new() -> Self {
            Self {
                conversation_id: ConversationId::new(),
                safety: SafetyResult::safe(),
                intent: IntentResult::new("CONTINUE", ResponseMode::casual(), 0.5),
                pending: Vec::new(),
                now: Timestamp::now(),
            }
        }

        fn request<'a>(&'a self, message: &'a str) -> EnrichmentRequest<'a> {
            EnrichmentRequest {
                conversation_id: self.conversation_id,
                message_id: MessageId::new(),
                message,
                recent_messages: &[],
                safety: &self.safety,
                intent: &self.intent,
                pending_clarifications: &self.pending,
                now: self.now,
            }
        }

        fn state(&self) -> ConversationState {
            ConversationState::initial(ResponseMode::casual(), self.now)
        }
    }

    #[tokio::test]
    async fn exits_early_when_no_domain_is_relevant() {
        let extractor = FixedExtractor::new(0.9);
        let calls = extractor.calls.clone();
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(extractor))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let turn = Turn {
            intent: IntentResult::new("CONTINUE", ResponseMode::casual(), 0.5)
                .with_entities(vec!["weather".to_string()]),
            ..Turn::new()
        };

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("What a lovely day"))
            .await
            .unwrap();

        assert!(outcome.relevant_domains.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(outcome.state.steering_hints.is_none());
        // Global context extraction still ran.
        assert!(outcome.state.context_element("topic:weather").is_some());
    }

    #[tokio::test]
    async fn extraction_below_threshold_is_discarded() {
        let registry = DomainRegistry::builder()
            .register(
                definition("goals", &["goal"]).with_threshold(0.7),
                Arc::new(FixedExtractor::new(0.5)),
            )
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let turn = Turn::new();

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("My goal is to run"))
            .await
            .unwrap();

        assert_eq!(outcome.relevant_domains, vec![id("goals")]);
        assert!(outcome.accepted.is_empty());
        assert!(outcome.state.extractions_for(&id("goals")).is_empty());
        assert!(f.extractions.records_for(&turn.conversation_id).await.is_empty());
    }

    #[tokio::test]
    async fn accepted_extraction_is_recorded_and_persisted() {
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(FixedExtractor::new(0.9)))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let turn = Turn::new();

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("My goal is to run"))
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.state.extractions_for(&id("goals")).len(), 1);
        assert_eq!(
            f.extractions.records_for(&turn.conversation_id).await,
            outcome.accepted
        );
    }

    #[tokio::test]
    async fn failing_extractor_does_not_affect_other_domains() {
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(FixedExtractor::new(0.9)))
            .unwrap()
            .register(definition("sleep", &["sleep"]), Arc::new(FailingExtractor))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let turn = Turn::new();

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("My goal is more sleep"))
            .await
            .unwrap();

        assert_eq!(outcome.relevant_domains, vec![id("goals"), id("sleep")]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].domain_id, id("goals"));
    }

    #[tokio::test]
    async fn suggestions_are_deduplicated_capped_and_isolated() {
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(FixedExtractor::new(0.9)))
            .unwrap()
            .with_strategy(
                id("goals"),
                Arc::new(ListStrategy("first", vec!["Check in weekly", "Pick a start date", "Track it"])),
            )
            .with_strategy(id("goals"), Arc::new(BrokenStrategy))
            .with_strategy(
                id("goals"),
                Arc::new(ListStrategy("second", vec!["  check in WEEKLY ", "Celebrate wins", "Share it"])),
            )
            .build()
            .unwrap();
        let f = fixture(
            registry,
            EnrichmentSettings {
                max_suggestions: 4,
                ..Default::default()
            },
        );
        let turn = Turn::new();

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("New goal!"))
            .await
            .unwrap();

        let hints = outcome.state.steering_hints.unwrap();
        let texts: Vec<&str> = hints.texts().collect();
        assert_eq!(
            texts,
            vec!["Check in weekly", "Pick a start date", "Track it", "Celebrate wins"]
        );
    }

    #[tokio::test]
    async fn disabled_domain_is_never_relevant() {
        let extractor = FixedExtractor::new(0.9);
        let calls = extractor.calls.clone();
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]).disabled(), Arc::new(extractor))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let turn = Turn::new();

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("goal"))
            .await
            .unwrap();

        assert!(outcome.relevant_domains.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pending_clarification_forces_relevance_and_is_resolved() {
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(FixedExtractor::new(0.9)))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(registry, EnrichmentSettings::default());
        let base = Turn::new();
        let pending = ClarificationRecord::open(
            base.conversation_id,
            id("goals"),
            ClarificationRequest::new("goal_selection", json!({})),
            600,
            base.now,
        );
        f.clarifications.create(&pending).await.unwrap();
        let turn = Turn {
            pending: vec![pending.clone()],
            ..base
        };

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("The reading one"))
            .await
            .unwrap();

        assert_eq!(outcome.relevant_domains, vec![id("goals")]);
        assert!(f.clarifications.get(&pending.id).await.unwrap().resolved);
    }

    #[tokio::test]
    async fn clarification_request_is_stored_with_ttl() {
        let extractor = FixedExtractor {
            clarification: Some(ClarificationRequest::new("goal_selection", json!({"candidates": []}))),
            ..FixedExtractor::new(0.9)
        };
        let registry = DomainRegistry::builder()
            .register(definition("goals", &["goal"]), Arc::new(extractor))
            .unwrap()
            .build()
            .unwrap();
        let f = fixture(
            registry,
            EnrichmentSettings {
                clarification_ttl_secs: 60,
                ..Default::default()
            },
        );
        let turn = Turn::new();

        f.coordinator
            .enrich(turn.state(), &turn.request("goal progress"))
            .await
            .unwrap();

        let stored = f.clarifications.all_for(&turn.conversation_id).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].expires_at, turn.now.plus_secs(60));
        assert!(stored[0].is_pending(turn.now));
    }

    #[tokio::test]
    async fn crisis_signals_become_context() {
        let f = fixture(DomainRegistry::empty(), EnrichmentSettings::default());
        let turn = Turn {
            safety: SafetyResult {
                level: SafetyLevel::Crisis,
                signals: vec!["self_harm".to_string()],
                suggested_tone: Tone::Urgent,
            },
            ..Turn::new()
        };

        let outcome = f
            .coordinator
            .enrich(turn.state(), &turn.request("..."))
            .await
            .unwrap();

        let element = outcome.state.context_element("crisis:self_harm").unwrap();
        assert_eq!(element.weight, 1.0);
    }
}
