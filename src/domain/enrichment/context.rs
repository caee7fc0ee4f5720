//! Rule-based global context extraction from classification signals.

use serde_json::json;

use crate::domain::classification::{
    IntentResult, SafetyLevel, SafetyResult, CLASSIFIER_UNAVAILABLE_SIGNAL,
};
use crate::domain::memory::{ContextObservation, ContextType};

const CRISIS_WEIGHT: f64 = 1.0;
const EMOTIONAL_WEIGHT: f64 = 0.8;
const TOPIC_WEIGHT: f64 = 0.6;

/// Facts observed this turn: crisis and emotional tags from the safety
/// signals, topic tags from the intent entities.
pub fn observations_from_classification(
    safety: &SafetyResult,
    intent: &IntentResult,
) -> Vec<ContextObservation> {
    let mut observations = Vec::new();

    let signal_type = match safety.level {
        SafetyLevel::Crisis => Some((ContextType::Crisis, CRISIS_WEIGHT)),
        SafetyLevel::Concern => Some((ContextType::Emotional, EMOTIONAL_WEIGHT)),
        SafetyLevel::Safe => None,
    };
    if let Some((context_type, weight)) = signal_type {
        for signal in safety
            .signals
            .iter()
            .filter(|s| s.as_str() != CLASSIFIER_UNAVAILABLE_SIGNAL)
        {
            observations.push(ContextObservation::tagged(
                context_type,
                signal,
                json!({ "level": safety.level.to_string(), "signal": signal }),
                weight,
            ));
        }
    }

    for entity in intent.entities.iter().filter(|e| !e.trim().is_empty()) {
        observations.push(ContextObservation::tagged(
            ContextType::Topic,
            entity,
            json!(entity.trim()),
            TOPIC_WEIGHT,
        ));
    }

    observations
}
