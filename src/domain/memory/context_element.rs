//! Context elements: weighted, decaying memory facts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Category of a context element. Each category decays at its own rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Crisis,
    Emotional,
    Topic,
    Preference,
    General,
}

impl ContextType {
    /// Prefix used when building element keys (e.g. `topic:stress`).
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ContextType::Crisis => "crisis",
            ContextType::Emotional => "emotion",
            ContextType::Topic => "topic",
            ContextType::Preference => "preference",
            ContextType::General => "general",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextType::Crisis => "crisis",
            ContextType::Emotional => "emotional",
            ContextType::Topic => "topic",
            ContextType::Preference => "preference",
            ContextType::General => "general",
        };
        write!(f, "{}", s)
    }
}

/// A remembered fact about the conversation.
///
/// `key` is semantically unique per fact; observing the same key again
/// reinforces the existing element instead of adding a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextElement {
    pub key: String,
    pub value: serde_json::Value,
    /// Always within `[0.0, 1.0]`.
    pub weight: f64,
    pub context_type: ContextType,
    pub created_at: Timestamp,
    pub last_accessed_at: Timestamp,
    /// When `weight` was last brought up to date by a decay pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decayed_at: Option<Timestamp>,
}

impl ContextElement {
    /// Creates a fresh element; the weight is clamped into `[0, 1]`.
    pub fn new(
        key: impl Into<String>,
        value: serde_json::Value,
        weight: f64,
        context_type: ContextType,
        now: Timestamp,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            weight: clamp_weight(weight),
            context_type,
            created_at: now,
            last_accessed_at: now,
            decayed_at: None,
        }
    }

    /// Instant from which the stored weight still has to be decayed.
    ///
    /// Time already accounted for by an earlier decay pass is not counted
    /// again.
    pub fn decay_reference(&self) -> Timestamp {
        match self.decayed_at {
            Some(decayed_at) => decayed_at.max(self.last_accessed_at),
            None => self.last_accessed_at,
        }
    }
}

/// A fact observed during the current turn, not yet merged into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextObservation {
    pub key: String,
    pub value: serde_json::Value,
    pub context_type: ContextType,
    /// Weight used when the key is not yet remembered.
    pub initial_weight: f64,
}

impl ContextObservation {
    /// Builds an observation keyed as `<prefix>:<label>`.
    pub fn tagged(
        context_type: ContextType,
        label: &str,
        value: serde_json::Value,
        initial_weight: f64,
    ) -> Self {
        Self {
            key: format!("{}:{}", context_type.key_prefix(), normalize_label(label)),
            value,
            context_type,
            initial_weight,
        }
    }
}

pub(crate) fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_element_clamps_weight() {
        let now = Timestamp::now();
        let high = ContextElement::new("topic:a", json!(true), 3.0, ContextType::Topic, now);
        let low = ContextElement::new("topic:b", json!(true), -1.0, ContextType::Topic, now);
        let nan = ContextElement::new("topic:c", json!(true), f64::NAN, ContextType::Topic, now);

        assert_eq!(high.weight, 1.0);
        assert_eq!(low.weight, 0.0);
        assert_eq!(nan.weight, 0.0);
    }

    #[test]
    fn new_element_starts_accessed_at_creation() {
        let now = Timestamp::now();
        let element = ContextElement::new("general:x", json!(1), 0.5, ContextType::General, now);
        assert_eq!(element.created_at, element.last_accessed_at);
        assert_eq!(element.decay_reference(), now);
    }

    #[test]
    fn decay_reference_is_latest_of_access_and_decay() {
        let start = Timestamp::now();
        let mut element = ContextElement::new("general:x", json!(1), 0.5, ContextType::General, start);

        element.decayed_at = Some(start.plus_hours(3));
        assert_eq!(element.decay_reference(), start.plus_hours(3));

        element.last_accessed_at = start.plus_hours(5);
        assert_eq!(element.decay_reference(), start.plus_hours(5));
    }

    #[test]
    fn snapshot_without_decay_time_still_deserializes() {
        let element = ContextElement::new("topic:a", json!(true), 0.5, ContextType::Topic, Timestamp::now());
        let mut value = serde_json::to_value(&element).unwrap();
        assert!(value.get("decayed_at").is_none());

        value["weight"] = json!(0.25);
        let parsed: ContextElement = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.decayed_at, None);
        assert_eq!(parsed.weight, 0.25);
    }

    #[test]
    fn tagged_observation_builds_normalised_key() {
        let obs = ContextObservation::tagged(ContextType::Topic, "  Work Stress ", json!("work stress"), 0.6);
        assert_eq!(obs.key, "topic:work_stress");

        let emotion = ContextObservation::tagged(ContextType::Emotional, "anxious", json!(true), 0.7);
        assert_eq!(emotion.key, "emotion:anxious");
    }

    #[test]
    fn context_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ContextType::Preference).unwrap(), "\"preference\"");
        assert_eq!(ContextType::Emotional.to_string(), "emotional");
    }
}
