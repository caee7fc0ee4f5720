//! ProcessTurnHandler - one user message in, one reply out
//!
//! Runs the turn pipeline: load, decay, classify, enrich, detect, generate,
//! persist. Expected failures inside a stage degrade to fallbacks; only
//! infrastructure failures abort the turn, tagged with their stage.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::application::classification::ClassificationService;
use crate::application::enrichment::goals::goals_domain_id;
use crate::application::enrichment::{EnrichmentCoordinator, EnrichmentRequest};
use crate::application::orchestration::{detect_or_fallback, ResponseOrchestrator};
use crate::domain::classification::ClassificationInput;
use crate::domain::conversation::{
    apply_goal_extraction, Conversation, ConversationState, GoalExtraction, Message, ResponseMode,
};
use crate::domain::enrichment::{ClarificationRecord, ExtractionRecord};
use crate::domain::foundation::{ConversationId, GoalId, MessageId, Timestamp, UserId};
use crate::domain::memory::DecayPolicy;
use crate::domain::orchestration::{
    DetectionInput, HandlerRequest, MultiIntentDetector, PRIMARY_PRIORITY,
};
use crate::ports::{
    ClarificationRepository, ConversationRepository, GoalRepository, MessageRepository,
    StateRepository,
};

use super::pipeline_error::{PipelineError, PipelineFailure, PipelineStage};

/// Command to process one user message
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    /// Continue this conversation; otherwise the user's active one.
    pub conversation_id: Option<ConversationId>,
    pub user_id: UserId,
    pub message: String,
    /// End the user's active conversation and start a new one.
    pub force_new_conversation: bool,
}

impl ProcessTurnCommand {
    pub fn new(user_id: UserId, message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            user_id,
            message: message.into(),
            force_new_conversation: false,
        }
    }

    pub fn in_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn starting_new(mut self) -> Self {
        self.force_new_conversation = true;
        self
    }
}

/// Result of a processed turn
#[derive(Debug, Clone)]
pub struct ProcessTurnResult {
    pub response: String,
    pub processing_time_ms: u64,
    /// Id of the stored assistant message.
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    /// Modes whose handlers contributed, primary first.
    pub modes: Vec<ResponseMode>,
}

/// Persistence ports used by the pipeline
#[derive(Clone)]
pub struct TurnRepositories {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub states: Arc<dyn StateRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub clarifications: Arc<dyn ClarificationRepository>,
}

#[derive(Debug, Clone, Copy)]
pub struct TurnSettings {
    /// Prior messages handed to classifiers, extractors and handlers.
    pub recent_window: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self { recent_window: 6 }
    }
}

/// Everything the Load stage produces.
struct LoadedTurn {
    conversation: Conversation,
    state: ConversationState,
    recent: Vec<Message>,
    pending: Vec<ClarificationRecord>,
    user_message: Message,
}

pub struct ProcessTurnHandler {
    repos: TurnRepositories,
    classification: ClassificationService,
    enrichment: EnrichmentCoordinator,
    detector: Arc<dyn MultiIntentDetector>,
    orchestrator: ResponseOrchestrator,
    decay: DecayPolicy,
    settings: TurnSettings,
}

impl ProcessTurnHandler {
    pub fn new(
        repos: TurnRepositories,
        classification: ClassificationService,
        enrichment: EnrichmentCoordinator,
        detector: Arc<dyn MultiIntentDetector>,
        orchestrator: ResponseOrchestrator,
        decay: DecayPolicy,
        settings: TurnSettings,
    ) -> Self {
        Self {
            repos,
            classification,
            enrichment,
            detector,
            orchestrator,
            decay,
            settings,
        }
    }

    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<ProcessTurnResult, PipelineError> {
        let span = info_span!(
            "process_turn",
            user_id = %cmd.user_id,
            conversation_id = tracing::field::Empty
        );
        self.run(cmd).instrument(span).await
    }

    async fn run(&self, cmd: ProcessTurnCommand) -> Result<ProcessTurnResult, PipelineError> {
        let started = Instant::now();
        let now = Timestamp::now();
        let text = cmd.message.trim();
        if text.is_empty() {
            return Err(PipelineError::new(PipelineStage::Load, PipelineFailure::EmptyMessage));
        }

        // 1. Load
        let turn = self
            .load(&cmd, text, now)
            .await
            .map_err(PipelineError::at(PipelineStage::Load))?;
        let conversation_id = turn.conversation.id;
        tracing::Span::current().record("conversation_id", tracing::field::display(conversation_id));
        debug!(
            stage = %PipelineStage::Load,
            recent = turn.recent.len(),
            pending = turn.pending.len(),
            "Stage complete"
        );

        // 2. Decay
        let state = self.decay.apply_decay(&turn.state, now);
        debug!(
            stage = %PipelineStage::Decay,
            kept = state.context_elements.len(),
            dropped = turn.state.context_elements.len().saturating_sub(state.context_elements.len()),
            "Stage complete"
        );

        // 3. Classify
        let input = ClassificationInput::new(text, turn.conversation.current_mode.clone())
            .with_recent_messages(turn.recent.clone());
        let classification = self.classification.classify(&input, now).await;
        let state = state.with_mode(classification.decision.final_mode.clone());
        debug!(stage = %PipelineStage::Classify, mode = %state.mode, "Stage complete");

        // 4. Enrich
        let request = EnrichmentRequest {
            conversation_id,
            message_id: turn.user_message.id,
            message: text,
            recent_messages: &turn.recent,
            safety: &classification.safety,
            intent: &classification.intent,
            pending_clarifications: &turn.pending,
            now,
        };
        let enriched = self
            .enrichment
            .enrich(state, &request)
            .await
            .map_err(PipelineError::at(PipelineStage::Enrich))?;
        let (state, changed_goals) = apply_goal_records(enriched.state, &enriched.accepted, now);
        debug!(
            stage = %PipelineStage::Enrich,
            domains = enriched.relevant_domains.len(),
            accepted = enriched.accepted.len(),
            goals_changed = changed_goals.len(),
            "Stage complete"
        );

        // 5. Detect
        let descriptors = self.orchestrator.modes().descriptors();
        let detection = detect_or_fallback(
            self.detector.as_ref(),
            &DetectionInput {
                message: text,
                recent_messages: &turn.recent,
                current_mode: &state.mode,
                available_modes: &descriptors,
            },
        )
        .await;
        debug!(
            stage = %PipelineStage::Detect,
            primary = %detection.primary.mode,
            secondary = detection.secondary.len(),
            orchestrate = detection.requires_orchestration,
            "Stage complete"
        );

        // 6. Generate
        let response = self
            .orchestrator
            .respond(
                &detection,
                HandlerRequest {
                    message: text,
                    recent_messages: &turn.recent,
                    state: &state,
                    decision: &classification.decision,
                    priority: PRIMARY_PRIORITY,
                },
            )
            .await;
        debug!(
            stage = %PipelineStage::Generate,
            segments = response.segments.len(),
            orchestrated = response.orchestrated,
            "Stage complete"
        );

        // 7. Persist
        let state = state
            .with_metadata_updates(response.state_updates.clone())
            .touched(now);
        let reply = Message::assistant(conversation_id, response.content.clone(), now);
        self.persist(&turn, &state, &changed_goals, &reply, now)
            .await
            .map_err(PipelineError::at(PipelineStage::Persist))?;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            mode = %state.mode,
            processing_time_ms,
            "Turn processed"
        );

        Ok(ProcessTurnResult {
            response: response.content.clone(),
            processing_time_ms,
            message_id: reply.id,
            conversation_id,
            modes: response.modes().into_iter().cloned().collect(),
        })
    }

    async fn load(
        &self,
        cmd: &ProcessTurnCommand,
        text: &str,
        now: Timestamp,
    ) -> Result<LoadedTurn, PipelineFailure> {
        let conversation = self.resolve_conversation(cmd, now).await?;

        let state = match self.repos.states.latest(&conversation.id).await? {
            Some(state) => state,
            None => {
                let goals = self.repos.goals.find_by_conversation(&conversation.id).await?;
                ConversationState::initial(conversation.current_mode.clone(), now).with_goals(goals)
            }
        };
        let recent = self
            .repos
            .messages
            .recent(&conversation.id, self.settings.recent_window)
            .await?;
        let pending = self.pending_clarifications(&conversation.id, now).await?;

        let user_message = Message::user(conversation.id, text, now);

        Ok(LoadedTurn {
            conversation,
            state,
            recent,
            pending,
            user_message,
        })
    }

    async fn resolve_conversation(
        &self,
        cmd: &ProcessTurnCommand,
        now: Timestamp,
    ) -> Result<Conversation, PipelineFailure> {
        let conversations = &self.repos.conversations;

        if let Some(id) = cmd.conversation_id {
            let conversation = conversations
                .find_by_id(&id)
                .await?
                .filter(|c| c.user_id == cmd.user_id)
                .ok_or(PipelineFailure::ConversationNotFound(id))?;
            if !conversation.is_active() {
                return Err(PipelineFailure::ConversationEnded(id));
            }
            return Ok(conversation);
        }

        if let Some(active) = conversations.find_active_by_user(&cmd.user_id).await? {
            if !cmd.force_new_conversation {
                return Ok(active);
            }
            conversations.update(&active.ended(now)).await?;
            info!(previous = %active.id, "Ended conversation on request");
        }

        let conversation = Conversation::start(cmd.user_id.clone(), now);
        conversations.create(&conversation).await?;
        info!(conversation_id = %conversation.id, "Started conversation");
        Ok(conversation)
    }

    /// Pending clarifications of every enabled domain.
    async fn pending_clarifications(
        &self,
        conversation_id: &ConversationId,
        now: Timestamp,
    ) -> Result<Vec<ClarificationRecord>, PipelineFailure> {
        let lookups = self
            .enrichment
            .registry()
            .definitions()
            .iter()
            .filter(|d| d.enabled)
            .map(|d| {
                self.repos
                    .clarifications
                    .find_pending(conversation_id, &d.id, now)
            });
        let pending = try_join_all(lookups).await?;
        Ok(pending.into_iter().flatten().collect())
    }

    /// Stores the turn. The user message is only written here, so a turn
    /// that fails earlier leaves no unanswered message behind.
    async fn persist(
        &self,
        turn: &LoadedTurn,
        state: &ConversationState,
        changed_goals: &[GoalId],
        reply: &Message,
        now: Timestamp,
    ) -> Result<(), PipelineFailure> {
        let conversation = &turn.conversation;
        self.repos.states.append_snapshot(&conversation.id, state).await?;
        for goal in state.goals.iter().filter(|g| changed_goals.contains(&g.id)) {
            self.repos.goals.upsert(&conversation.id, goal).await?;
        }
        self.repos.messages.append(&turn.user_message).await?;
        self.repos.messages.append(reply).await?;
        self.repos
            .conversations
            .update(&conversation.touched(state.mode.clone(), now))
            .await?;
        Ok(())
    }
}

/// Applies accepted goal-domain records to the goal list in order.
fn apply_goal_records(
    state: ConversationState,
    accepted: &[ExtractionRecord],
    now: Timestamp,
) -> (ConversationState, Vec<GoalId>) {
    let goals_domain = goals_domain_id();
    let mut goals = state.goals.clone();
    let mut changed = Vec::new();

    for record in accepted.iter().filter(|r| r.domain_id == goals_domain) {
        match serde_json::from_value::<GoalExtraction>(record.payload.clone()) {
            Ok(extraction) => {
                let change = apply_goal_extraction(&goals, &extraction, now);
                goals = change.goals;
                changed.extend(change.changed);
            }
            Err(err) => warn!(error = %err, "Skipping unreadable goal extraction"),
        }
    }

    (state.with_goals(goals), changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::adapters::memory::{
        InMemoryClarificationRepository, InMemoryConversationRepository,
        InMemoryExtractionRepository, InMemoryGoalRepository, InMemoryMessageRepository,
        InMemoryStateRepository,
    };
    use crate::application::enrichment::goals::register_goals;
    use crate::application::enrichment::{DomainRegistry, EnrichmentSettings};
    use crate::application::modes::ModeRegistry;
    use crate::application::orchestration::{
        LlmMultiIntentDetector, OrchestratorSettings, ResponseComposer,
    };
    use crate::domain::classification::{RuleBasedIntentClassifier, RuleBasedSafetyClassifier};
    use crate::domain::enrichment::KeywordRelevanceDetector;
    use crate::domain::orchestration::ConflictPolicy;
    use crate::ports::{GenerationPurpose, RepositoryError};
    use async_trait::async_trait;
    use serde_json::json;

    struct Fixture {
        conversations: Arc<InMemoryConversationRepository>,
        messages: Arc<InMemoryMessageRepository>,
        states: Arc<InMemoryStateRepository>,
        goals: Arc<InMemoryGoalRepository>,
    }

    fn handler_with(
        generator: &MockTextGenerator,
        states: Arc<dyn StateRepository>,
    ) -> (ProcessTurnHandler, Fixture) {
        let shared: Arc<MockTextGenerator> = Arc::new(generator.clone());
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let goals = Arc::new(InMemoryGoalRepository::new());
        let clarifications = Arc::new(InMemoryClarificationRepository::new());
        let in_memory_states = Arc::new(InMemoryStateRepository::new());

        let registry = register_goals(DomainRegistry::builder(), shared.clone())
            .unwrap()
            .build()
            .unwrap();
        let enrichment = EnrichmentCoordinator::new(
            Arc::new(registry),
            Arc::new(KeywordRelevanceDetector),
            Arc::new(InMemoryExtractionRepository::new()),
            clarifications.clone(),
            DecayPolicy::default(),
            EnrichmentSettings::default(),
        );
        let orchestrator = ResponseOrchestrator::new(
            Arc::new(ModeRegistry::with_defaults(shared.clone()).unwrap()),
            ResponseComposer::new(shared.clone(), ConflictPolicy::default()),
            OrchestratorSettings::default(),
        );

        let handler = ProcessTurnHandler::new(
            TurnRepositories {
                conversations: conversations.clone(),
                messages: messages.clone(),
                states,
                goals: goals.clone(),
                clarifications,
            },
            ClassificationService::new(
                Arc::new(RuleBasedSafetyClassifier),
                Arc::new(RuleBasedIntentClassifier),
            ),
            enrichment,
            Arc::new(LlmMultiIntentDetector::new(shared)),
            orchestrator,
            DecayPolicy::default(),
            TurnSettings::default(),
        );

        (
            handler,
            Fixture {
                conversations,
                messages,
                states: in_memory_states,
                goals,
            },
        )
    }

    fn handler(generator: &MockTextGenerator) -> (ProcessTurnHandler, Fixture) {
        let states = Arc::new(InMemoryStateRepository::new());
        let (handler, fixture) = handler_with(generator, states.clone());
        (handler, Fixture { states, ..fixture })
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    struct FailingStateRepository;

    #[async_trait]
    impl StateRepository for FailingStateRepository {
        async fn append_snapshot(
            &self,
            _conversation_id: &ConversationId,
            _state: &ConversationState,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Storage("disk full".to_string()))
        }

        async fn latest(
            &self,
            _conversation_id: &ConversationId,
        ) -> Result<Option<ConversationState>, RepositoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn first_turn_starts_conversation_and_persists_everything() {
        let generator = MockTextGenerator::new().with_response_for(
            GenerationPurpose::ModeResponse(ResponseMode::casual()),
            "Glad to hear it!",
        );
        let (handler, fixture) = handler(&generator);

        let result = handler
            .handle(ProcessTurnCommand::new(user(), "What a nice day"))
            .await
            .unwrap();

        assert_eq!(result.response, "Glad to hear it!");
        let id = result.conversation_id;
        assert_eq!(fixture.conversations.count().await, 1);
        assert_eq!(fixture.messages.all(&id).await.len(), 2);
        assert_eq!(fixture.states.snapshot_count(&id).await, 1);
        let conversation = fixture
            .conversations
            .find_by_id(&id)
            .await
            .unwrap()
            .unwrap();
        assert!(conversation.is_active());
        assert_eq!(result.message_id, fixture.messages.all(&id).await[1].id);
    }

    #[tokio::test]
    async fn second_turn_reuses_active_conversation() {
        let generator = MockTextGenerator::new();
        let (handler, fixture) = handler(&generator);

        let first = handler.handle(ProcessTurnCommand::new(user(), "hi")).await.unwrap();
        let second = handler.handle(ProcessTurnCommand::new(user(), "how are you")).await.unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);
        let id = second.conversation_id;
        assert_eq!(fixture.states.snapshot_count(&id).await, 2);
        assert_eq!(fixture.messages.all(&id).await.len(), 4);
    }

    #[tokio::test]
    async fn force_new_conversation_ends_previous() {
        let generator = MockTextGenerator::new();
        let (handler, fixture) = handler(&generator);

        let first = handler.handle(ProcessTurnCommand::new(user(), "hi")).await.unwrap();
        let second = handler
            .handle(ProcessTurnCommand::new(user(), "start over").starting_new())
            .await
            .unwrap();

        assert_ne!(first.conversation_id, second.conversation_id);
        let previous = fixture
            .conversations
            .find_by_id(&first.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!previous.is_active());
    }

    #[tokio::test]
    async fn unknown_conversation_fails_at_load() {
        let generator = MockTextGenerator::new();
        let (handler, _) = handler(&generator);

        let err = handler
            .handle(ProcessTurnCommand::new(user(), "hi").in_conversation(ConversationId::new()))
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Load);
        assert!(matches!(err.source, PipelineFailure::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let generator = MockTextGenerator::new();
        let (handler, fixture) = handler(&generator);

        let err = handler
            .handle(ProcessTurnCommand::new(user(), "   "))
            .await
            .unwrap_err();

        assert!(err.source.is_client_error());
        assert_eq!(fixture.conversations.count().await, 0);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn snapshot_failure_is_reported_as_persist_stage() {
        let generator = MockTextGenerator::new();
        let (handler, fixture) = handler_with(&generator, Arc::new(FailingStateRepository));

        let err = handler
            .handle(ProcessTurnCommand::new(user(), "hello"))
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Persist);
        assert!(matches!(err.source, PipelineFailure::Repository(_)));
        let conversation = fixture
            .conversations
            .find_active_by_user(&user())
            .await
            .unwrap()
            .unwrap();
        assert!(fixture.messages.all(&conversation.id).await.is_empty());
    }

    #[tokio::test]
    async fn accepted_goal_extraction_is_stored() {
        let goals_purpose = GenerationPurpose::DomainExtraction(goals_domain_id());
        let generator = MockTextGenerator::new().with_json_for(
            goals_purpose,
            json!({
                "action": "set_goal",
                "goalTitle": "Read 12 books this year",
                "confidence": 0.9
            }),
        );
        let (handler, fixture) = handler(&generator);

        let result = handler
            .handle(ProcessTurnCommand::new(user(), "I want to set a goal to read 12 books"))
            .await
            .unwrap();

        let goals = fixture
            .goals
            .find_by_conversation(&result.conversation_id)
            .await
            .unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].target_value, Some(12.0));

        let state = fixture.states.latest(&result.conversation_id).await.unwrap().unwrap();
        assert_eq!(state.goals.len(), 1);
        assert_eq!(state.extractions_for(&goals_domain_id()).len(), 1);
        assert!(state.steering_hints.is_some());
    }

    #[test]
    fn goal_records_from_other_domains_are_ignored() {
        let now = Timestamp::now();
        let state = ConversationState::initial(ResponseMode::casual(), now);
        let other = ExtractionRecord::new(
            crate::domain::foundation::DomainId::new("sleep").unwrap(),
            json!({ "action": "set_goal", "goalTitle": "Sleep 8 hours" }),
            0.9,
            None,
            now,
        );

        let (state, changed) = apply_goal_records(state, &[other], now);

        assert!(state.goals.is_empty());
        assert!(changed.is_empty());
    }
}
