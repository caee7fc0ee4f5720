//! Goal domain extractor
//!
//! Asks the text generator for a structured goal action, fills in a
//! numeric target from the goal title when the model leaves it out, and
//! manages the `goal_selection` clarification when a progress update could
//! refer to more than one active goal.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::conversation::{
    find_target_goal, Goal, GoalAction, GoalExtraction, GoalTarget,
};
use crate::domain::enrichment::{
    ClarificationRecord, ClarificationRequest, DomainExtractor, ExtractionContext,
    ExtractionError, ExtractionOutcome,
};
use crate::domain::foundation::GoalId;
use crate::ports::{
    parse_json_object, ChatMessage, ChatRole, GenerationPurpose, GenerationRequest, TextGenerator,
};

/// Clarification type raised when a goal update is ambiguous.
pub const GOAL_SELECTION: &str = "goal_selection";

/// Confidence used when the model omits one.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Floor applied once the user has picked a goal from a clarification.
const RESOLVED_CONFIDENCE: f64 = 0.8;

/// First whole number in `text`, e.g. `12` in "Read 12 books".
pub fn first_integer(text: &str) -> Option<f64> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(|n| n as f64)
}

/// Reads the model payload into a goal extraction and its confidence.
///
/// A `goalId` that is not a valid id is dropped rather than failing the
/// whole extraction.
pub fn parse_goal_payload(content: &str) -> Result<(GoalExtraction, f64), String> {
    let mut value: Value = parse_json_object(content)?;

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    if let Some(object) = value.as_object_mut() {
        let invalid_id = object
            .get("goalId")
            .is_some_and(|id| serde_json::from_value::<GoalId>(id.clone()).is_err());
        if invalid_id {
            object.remove("goalId");
        }
    }

    let mut extraction: GoalExtraction =
        serde_json::from_value(value).map_err(|e| format!("Invalid goal payload: {}", e))?;
    if extraction.target_value.is_none() && extraction.action == GoalAction::SetGoal {
        extraction.target_value = extraction.goal_title.as_deref().and_then(first_integer);
    }

    Ok((extraction, confidence))
}

/// Candidates listed in a `goal_selection` clarification.
fn clarification_candidates(record: &ClarificationRecord) -> Vec<(GoalId, String)> {
    record
        .payload
        .get("candidates")
        .and_then(Value::as_array)
        .map(|candidates| {
            candidates
                .iter()
                .filter_map(|c| {
                    let id = serde_json::from_value::<GoalId>(c.get("id")?.clone()).ok()?;
                    let description = c.get("description")?.as_str()?.to_string();
                    Some((id, description))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn significant_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_string)
        .collect()
}

/// The single candidate whose description shares a significant word with
/// the user's answer.
fn chosen_candidate(candidates: &[(GoalId, String)], answer: &str) -> Option<GoalId> {
    let answer_words = significant_tokens(answer);
    let mut matching = candidates.iter().filter(|(_, description)| {
        significant_tokens(description)
            .iter()
            .any(|w| answer_words.contains(w))
    });
    match (matching.next(), matching.next()) {
        (Some((id, _)), None) => Some(*id),
        _ => None,
    }
}

fn goal_selection_request(goals: &[Goal], candidates: &[GoalId], extraction: &GoalExtraction) -> ClarificationRequest {
    let candidates: Vec<Value> = goals
        .iter()
        .filter(|g| candidates.contains(&g.id))
        .map(|g| json!({ "id": g.id, "description": g.description }))
        .collect();
    ClarificationRequest::new(
        GOAL_SELECTION,
        json!({
            "candidates": candidates,
            "action": extraction.action,
            "progressValue": extraction.progress_value,
        }),
    )
}

fn system_prompt(goals: &[&Goal], pending: Option<&ClarificationRecord>) -> String {
    let goal_list = if goals.is_empty() {
        "(none)".to_string()
    } else {
        goals
            .iter()
            .map(|g| match g.target_value {
                Some(target) => format!("- {} | {} | progress {}/{}", g.id, g.description, g.progress, target),
                None => format!("- {} | {} | progress {}", g.id, g.description, g.progress),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let question = match pending {
        Some(_) => "\nThe user was just asked which goal they meant; their message may be the answer.",
        None => "",
    };

    format!(
        r#"You extract personal goal updates from messages to a companion app.
Active goals (id | description | progress):
{}{}

Respond with JSON only:
{{
  "action": "set_goal" | "update_progress" | "complete_goal" | "abandon_goal" | "none",
  "goalTitle": "short goal description or null",
  "targetValue": number or null,
  "progressValue": number or null,
  "goalId": "id of the goal this refers to, or null",
  "confidence": 0.0-1.0
}}"#,
        goal_list, question
    )
}

/// Goal extractor using the text generator
pub struct LlmGoalExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl LlmGoalExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl DomainExtractor for LlmGoalExtractor {
    async fn extract(
        &self,
        context: &ExtractionContext<'_>,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let active: Vec<&Goal> = context.state.active_goals().collect();
        let pending = context
            .pending_clarification
            .filter(|c| c.state_type == GOAL_SELECTION);

        let request = GenerationRequest::new(GenerationPurpose::DomainExtraction(
            context.domain.id.clone(),
        ))
        .with_system_prompt(system_prompt(&active, pending))
        .with_messages(context.recent_messages.iter().map(ChatMessage::from))
        .with_message(ChatRole::User, context.message)
        .with_temperature(0.0)
        .with_max_tokens(300)
        .json();

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| ExtractionError::Generation(e.to_string()))?;
        let (mut extraction, mut confidence) =
            parse_goal_payload(&response.content).map_err(ExtractionError::InvalidResponse)?;

        // An answer to an earlier question.
        if let Some(pending) = pending {
            let chosen = extraction
                .goal_id
                .filter(|id| clarification_candidates(pending).iter().any(|(c, _)| c == id))
                .or_else(|| chosen_candidate(&clarification_candidates(pending), context.message));
            if let Some(goal_id) = chosen {
                if matches!(extraction.action, GoalAction::None | GoalAction::SetGoal) {
                    extraction.action = pending
                        .payload
                        .get("action")
                        .and_then(|a| serde_json::from_value(a.clone()).ok())
                        .unwrap_or(GoalAction::UpdateProgress);
                }
                if extraction.progress_value.is_none() {
                    extraction.progress_value =
                        pending.payload.get("progressValue").and_then(Value::as_f64);
                }
                extraction.goal_id = Some(goal_id);
                confidence = confidence.max(RESOLVED_CONFIDENCE);

                let payload = serde_json::to_value(&extraction)
                    .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;
                return Ok(ExtractionOutcome::new(payload, confidence).resolving(pending.id));
            }
        }

        let payload = serde_json::to_value(&extraction)
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;
        let mut outcome = ExtractionOutcome::new(payload, confidence);

        let targets_existing = matches!(
            extraction.action,
            GoalAction::UpdateProgress | GoalAction::CompleteGoal | GoalAction::AbandonGoal
        );
        if targets_existing {
            if let GoalTarget::Ambiguous(candidates) = find_target_goal(&context.state.goals, &extraction) {
                outcome = outcome.with_clarification(goal_selection_request(
                    &context.state.goals,
                    &candidates,
                    &extraction,
                ));
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::domain::conversation::{ConversationState, ResponseMode};
    use crate::domain::enrichment::DomainDefinition;
    use crate::domain::foundation::{ConversationId, DomainId, MessageId, Timestamp};

    fn goals_domain() -> DomainDefinition {
        DomainDefinition::new(DomainId::new("goals").unwrap(), "Goals")
    }

    fn purpose() -> GenerationPurpose {
        GenerationPurpose::DomainExtraction(DomainId::new("goals").unwrap())
    }

    fn context<'a>(
        message: &'a str,
        state: &'a ConversationState,
        domain: &'a DomainDefinition,
        pending: Option<&'a ClarificationRecord>,
    ) -> ExtractionContext<'a> {
        ExtractionContext {
            conversation_id: ConversationId::new(),
            message_id: MessageId::new(),
            message,
            recent_messages: &[],
            state,
            domain,
            pending_clarification: pending,
        }
    }

    #[test]
    fn first_integer_reads_whole_numbers() {
        assert_eq!(first_integer("Read 12 books this year"), Some(12.0));
        assert_eq!(first_integer("Run 5k twice, 3 times"), Some(5.0));
        assert_eq!(first_integer("Meditate daily"), None);
    }

    #[test]
    fn missing_target_is_parsed_from_title() {
        let (extraction, confidence) = parse_goal_payload(
            r#"{"action":"set_goal","goalTitle":"Read 12 books this year","confidence":0.9}"#,
        )
        .unwrap();
        assert_eq!(extraction.target_value, Some(12.0));
        assert_eq!(confidence, 0.9);
    }

    #[test]
    fn invalid_goal_id_is_dropped() {
        let (extraction, confidence) = parse_goal_payload(
            r#"{"action":"update_progress","goalId":"goal-1","progressValue":3}"#,
        )
        .unwrap();
        assert_eq!(extraction.goal_id, None);
        assert_eq!(extraction.progress_value, Some(3.0));
        assert_eq!(confidence, DEFAULT_CONFIDENCE);
    }

    #[tokio::test]
    async fn extracts_new_goal() {
        let generator = MockTextGenerator::new().with_json_for(
            purpose(),
            json!({
                "action": "set_goal",
                "goalTitle": "Read 12 books this year",
                "confidence": 0.9
            }),
        );
        let extractor = LlmGoalExtractor::new(Arc::new(generator.clone()));
        let state = ConversationState::initial(ResponseMode::casual(), Timestamp::now());
        let domain = goals_domain();

        let outcome = extractor
            .extract(&context("I want to read 12 books this year", &state, &domain, None))
            .await
            .unwrap();

        assert_eq!(outcome.payload["action"], "set_goal");
        assert_eq!(outcome.payload["targetValue"], 12.0);
        assert!(outcome.clarification.is_none());
        assert_eq!(generator.calls_for(&purpose()), 1);
    }

    #[tokio::test]
    async fn ambiguous_update_raises_goal_selection() {
        let now = Timestamp::now();
        let state = ConversationState::initial(ResponseMode::casual(), now).with_goals(vec![
            Goal::new("Read 12 books", Some(12.0), now),
            Goal::new("Run 100 miles", Some(100.0), now),
        ]);
        let generator = MockTextGenerator::new().with_json_for(
            purpose(),
            json!({ "action": "update_progress", "progressValue": 3, "confidence": 0.8 }),
        );
        let extractor = LlmGoalExtractor::new(Arc::new(generator));
        let domain = goals_domain();

        let outcome = extractor
            .extract(&context("I made progress, did 3 more", &state, &domain, None))
            .await
            .unwrap();

        let request = outcome.clarification.unwrap();
        assert_eq!(request.state_type, GOAL_SELECTION);
        assert_eq!(request.payload["candidates"].as_array().unwrap().len(), 2);
        assert_eq!(request.payload["progressValue"], 3.0);
    }

    #[tokio::test]
    async fn answer_resolves_pending_clarification() {
        let now = Timestamp::now();
        let reading = Goal::new("Read 12 books", Some(12.0), now);
        let running = Goal::new("Run 100 miles", Some(100.0), now);
        let state = ConversationState::initial(ResponseMode::casual(), now)
            .with_goals(vec![reading.clone(), running.clone()]);
        let pending = ClarificationRecord::open(
            ConversationId::new(),
            DomainId::new("goals").unwrap(),
            goal_selection_request(
                &state.goals,
                &[reading.id, running.id],
                &GoalExtraction {
                    action: GoalAction::UpdateProgress,
                    goal_title: None,
                    target_value: None,
                    progress_value: Some(3.0),
                    goal_id: None,
                },
            ),
            600,
            now,
        );
        let generator = MockTextGenerator::new()
            .with_json_for(purpose(), json!({ "action": "none", "confidence": 0.2 }));
        let extractor = LlmGoalExtractor::new(Arc::new(generator));
        let domain = goals_domain();

        let outcome = extractor
            .extract(&context("The books one", &state, &domain, Some(&pending)))
            .await
            .unwrap();

        assert_eq!(outcome.resolved_clarification, Some(pending.id));
        assert_eq!(outcome.confidence, RESOLVED_CONFIDENCE);
        let extraction: GoalExtraction = serde_json::from_value(outcome.payload).unwrap();
        assert_eq!(extraction.action, GoalAction::UpdateProgress);
        assert_eq!(extraction.goal_id, Some(reading.id));
        assert_eq!(extraction.progress_value, Some(3.0));
    }

    #[tokio::test]
    async fn unclear_answer_leaves_clarification_open() {
        let now = Timestamp::now();
        let reading = Goal::new("Read 12 books", Some(12.0), now);
        let running = Goal::new("Run 100 miles", Some(100.0), now);
        let state = ConversationState::initial(ResponseMode::casual(), now)
            .with_goals(vec![reading.clone(), running.clone()]);
        let pending = ClarificationRecord::open(
            ConversationId::new(),
            DomainId::new("goals").unwrap(),
            ClarificationRequest::new(
                GOAL_SELECTION,
                json!({ "candidates": [
                    { "id": reading.id, "description": reading.description },
                    { "id": running.id, "description": running.description }
                ] }),
            ),
            600,
            now,
        );
        let generator = MockTextGenerator::new()
            .with_json_for(purpose(), json!({ "action": "none", "confidence": 0.2 }));
        let extractor = LlmGoalExtractor::new(Arc::new(generator));
        let domain = goals_domain();

        let outcome = extractor
            .extract(&context("Not sure yet", &state, &domain, Some(&pending)))
            .await
            .unwrap();

        assert!(outcome.resolved_clarification.is_none());
    }

    #[tokio::test]
    async fn malformed_reply_is_invalid_response() {
        let generator = MockTextGenerator::new().with_response_for(purpose(), "no idea");
        let extractor = LlmGoalExtractor::new(Arc::new(generator));
        let state = ConversationState::initial(ResponseMode::casual(), Timestamp::now());
        let domain = goals_domain();

        let result = extractor
            .extract(&context("goal", &state, &domain, None))
            .await;

        assert!(matches!(result, Err(ExtractionError::InvalidResponse(_))));
    }
}
