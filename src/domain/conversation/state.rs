//! Conversation state snapshots.
//!
//! One snapshot exists per turn. Pipeline stages never mutate a snapshot
//! another stage can see; they derive a new one with the `with_*` methods.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::enrichment::{ExtractionRecord, SuggestionBundle};
use crate::domain::foundation::{DomainId, Timestamp};
use crate::domain::memory::ContextElement;

use super::goal::Goal;
use super::mode::ResponseMode;

/// Most recent extraction records kept per domain.
pub const MAX_EXTRACTIONS_PER_DOMAIN: usize = 20;

/// Immutable snapshot of everything the agent remembers about a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub mode: ResponseMode,
    pub context_elements: Vec<ContextElement>,
    pub goals: Vec<Goal>,
    pub extractions: BTreeMap<DomainId, Vec<ExtractionRecord>>,
    pub steering_hints: Option<SuggestionBundle>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub last_activity_at: Timestamp,
}

impl ConversationState {
    /// Empty state for a brand new conversation.
    pub fn initial(mode: ResponseMode, now: Timestamp) -> Self {
        Self {
            mode,
            context_elements: Vec::new(),
            goals: Vec::new(),
            extractions: BTreeMap::new(),
            steering_hints: None,
            metadata: serde_json::Map::new(),
            last_activity_at: now,
        }
    }

    pub fn with_mode(self, mode: ResponseMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_context_elements(self, context_elements: Vec<ContextElement>) -> Self {
        Self {
            context_elements,
            ..self
        }
    }

    pub fn with_goals(self, goals: Vec<Goal>) -> Self {
        Self { goals, ..self }
    }

    /// Appends an extraction record, keeping only the most recent ones.
    pub fn with_extraction(mut self, record: ExtractionRecord) -> Self {
        let records = self.extractions.entry(record.domain_id.clone()).or_default();
        records.push(record);
        if records.len() > MAX_EXTRACTIONS_PER_DOMAIN {
            let overflow = records.len() - MAX_EXTRACTIONS_PER_DOMAIN;
            records.drain(..overflow);
        }
        self
    }

    pub fn with_steering_hints(self, steering_hints: Option<SuggestionBundle>) -> Self {
        Self {
            steering_hints,
            ..self
        }
    }

    /// Merges keys into `metadata`; incoming keys overwrite existing ones.
    pub fn with_metadata_updates(mut self, updates: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata.extend(updates);
        self
    }

    pub fn touched(self, now: Timestamp) -> Self {
        Self {
            last_activity_at: now,
            ..self
        }
    }

    pub fn active_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.is_active())
    }

    pub fn context_element(&self, key: &str) -> Option<&ContextElement> {
        self.context_elements.iter().find(|e| e.key == key)
    }

    pub fn extractions_for(&self, domain_id: &DomainId) -> &[ExtractionRecord] {
        self.extractions
            .get(domain_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn latest_extraction(&self, domain_id: &DomainId) -> Option<&ExtractionRecord> {
        self.extractions_for(domain_id).last()
    }

    /// Context elements ordered by weight, strongest first.
    pub fn strongest_context(&self, limit: usize) -> Vec<&ContextElement> {
        let mut elements: Vec<&ContextElement> = self.context_elements.iter().collect();
        elements.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        elements.truncate(limit);
        elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::MessageId;
    use crate::domain::memory::ContextType;
    use serde_json::json;

    fn goals_domain() -> DomainId {
        DomainId::new("goals").unwrap()
    }

    #[test]
    fn initial_state_is_empty() {
        let state = ConversationState::initial(ResponseMode::casual(), Timestamp::now());
        assert!(state.context_elements.is_empty());
        assert!(state.goals.is_empty());
        assert!(state.extractions.is_empty());
        assert!(state.steering_hints.is_none());
    }

    #[test]
    fn with_extraction_caps_history() {
        let now = Timestamp::now();
        let mut state = ConversationState::initial(ResponseMode::casual(), now);
        for i in 0..(MAX_EXTRACTIONS_PER_DOMAIN + 5) {
            state = state.with_extraction(ExtractionRecord::new(
                goals_domain(),
                json!({ "n": i }),
                0.9,
                Some(MessageId::new()),
                now,
            ));
        }

        let records = state.extractions_for(&goals_domain());
        assert_eq!(records.len(), MAX_EXTRACTIONS_PER_DOMAIN);
        assert_eq!(state.latest_extraction(&goals_domain()).unwrap().payload, json!({ "n": 24 }));
    }

    #[test]
    fn metadata_updates_overwrite_keys() {
        let now = Timestamp::now();
        let mut first = serde_json::Map::new();
        first.insert("a".into(), json!(1));
        first.insert("b".into(), json!(1));
        let mut second = serde_json::Map::new();
        second.insert("b".into(), json!(2));

        let state = ConversationState::initial(ResponseMode::casual(), now)
            .with_metadata_updates(first)
            .with_metadata_updates(second);

        assert_eq!(state.metadata["a"], json!(1));
        assert_eq!(state.metadata["b"], json!(2));
    }

    #[test]
    fn strongest_context_sorts_by_weight() {
        let now = Timestamp::now();
        let state = ConversationState::initial(ResponseMode::casual(), now).with_context_elements(vec![
            ContextElement::new("topic:a", json!(1), 0.3, ContextType::Topic, now),
            ContextElement::new("topic:b", json!(1), 0.9, ContextType::Topic, now),
            ContextElement::new("topic:c", json!(1), 0.6, ContextType::Topic, now),
        ]);

        let keys: Vec<_> = state.strongest_context(2).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["topic:b", "topic:c"]);
    }

    #[test]
    fn state_roundtrips_through_json() {
        let now = Timestamp::now();
        let state = ConversationState::initial(ResponseMode::smalltalk(), now)
            .with_extraction(ExtractionRecord::new(goals_domain(), json!({}), 0.8, None, now));

        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
