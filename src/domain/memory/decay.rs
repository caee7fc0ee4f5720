//! Decay and reinforcement of context elements.
//!
//! Weights follow a half-life curve per [`ContextType`]:
//! `weight' = weight * 0.5^(age / half_life)`, where `age` is measured from
//! the later of the element's last access and its last decay pass, so
//! repeated passes compose to the same curve as a single one. Reinforcement is the only operation that
//! raises a weight, and it is bounded at 1.0.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ConversationState, GoalStatus};
use crate::domain::foundation::Timestamp;

use super::context_element::{clamp_weight, ContextElement, ContextObservation, ContextType};

/// Elements at or below this weight are forgotten.
pub const DEFAULT_WEIGHT_FLOOR: f64 = 0.1;

/// Multiplier applied when a known fact is observed again.
pub const DEFAULT_REINFORCEMENT_FACTOR: f64 = 1.2;

/// Half-life per context type, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfLives {
    pub crisis_hours: f64,
    pub emotional_hours: f64,
    pub topic_hours: f64,
    pub preference_hours: f64,
    pub general_hours: f64,
}

impl HalfLives {
    /// Half-life for the given type.
    pub fn for_type(&self, context_type: ContextType) -> f64 {
        match context_type {
            ContextType::Crisis => self.crisis_hours,
            ContextType::Emotional => self.emotional_hours,
            ContextType::Topic => self.topic_hours,
            ContextType::Preference => self.preference_hours,
            ContextType::General => self.general_hours,
        }
    }
}

impl Default for HalfLives {
    fn default() -> Self {
        Self {
            crisis_hours: 72.0,
            emotional_hours: 24.0,
            topic_hours: 6.0,
            preference_hours: 720.0,
            general_hours: 12.0,
        }
    }
}

/// Rules for forgetting and strengthening conversation memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayPolicy {
    pub half_lives: HalfLives,
    pub weight_floor: f64,
    pub reinforcement_factor: f64,
    /// Active goals older than this many days are dropped.
    pub goal_expiry_days: i64,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            half_lives: HalfLives::default(),
            weight_floor: DEFAULT_WEIGHT_FLOOR,
            reinforcement_factor: DEFAULT_REINFORCEMENT_FACTOR,
            goal_expiry_days: 90,
        }
    }
}

impl DecayPolicy {
    /// Weight of `element` at `now`, ignoring the floor.
    pub fn decayed_weight(&self, element: &ContextElement, now: Timestamp) -> f64 {
        let age_hours = now.hours_since(&element.decay_reference());
        let half_life = self.half_lives.for_type(element.context_type);
        if half_life <= 0.0 {
            return 0.0;
        }
        let factor = 0.5_f64.powf(age_hours / half_life);
        clamp_weight(element.weight * factor)
    }

    /// Decays every element and drops those at or below the floor.
    ///
    /// Survivors are stamped with `now` as their decay time.
    pub fn decay_elements(&self, elements: &[ContextElement], now: Timestamp) -> Vec<ContextElement> {
        elements
            .iter()
            .filter_map(|element| {
                let weight = self.decayed_weight(element, now);
                if weight <= self.weight_floor {
                    None
                } else {
                    Some(ContextElement {
                        weight,
                        decayed_at: Some(now),
                        ..element.clone()
                    })
                }
            })
            .collect()
    }

    /// Produces the decayed snapshot of `state` at `now`.
    ///
    /// Context elements decay and are pruned; active goals past the expiry
    /// window are dropped regardless of any weight.
    pub fn apply_decay(&self, state: &ConversationState, now: Timestamp) -> ConversationState {
        let context_elements = self.decay_elements(&state.context_elements, now);
        let expiry_hours = self.goal_expiry_days as f64 * 24.0;
        let goals = state
            .goals
            .iter()
            .filter(|goal| {
                goal.status != GoalStatus::Active || now.hours_since(&goal.created_at) <= expiry_hours
            })
            .cloned()
            .collect();

        ConversationState {
            context_elements,
            goals,
            ..state.clone()
        }
    }

    /// Strengthens a re-observed element.
    ///
    /// The value is replaced with the latest observation and the access time
    /// reset, so the next decay pass measures age from `now`.
    pub fn reinforce(
        &self,
        existing: &ContextElement,
        observed_value: serde_json::Value,
        now: Timestamp,
    ) -> ContextElement {
        ContextElement {
            value: observed_value,
            weight: (existing.weight * self.reinforcement_factor).min(1.0),
            last_accessed_at: now,
            ..existing.clone()
        }
    }

    /// Merges one observation: reinforce on key match, insert otherwise.
    pub fn merge_observation(
        &self,
        elements: &[ContextElement],
        observation: &ContextObservation,
        now: Timestamp,
    ) -> Vec<ContextElement> {
        let mut merged = elements.to_vec();
        match merged.iter().position(|e| e.key == observation.key) {
            Some(index) => {
                merged[index] = self.reinforce(&merged[index], observation.value.clone(), now);
            }
            None => merged.push(ContextElement::new(
                observation.key.clone(),
                observation.value.clone(),
                observation.initial_weight,
                observation.context_type,
                now,
            )),
        }
        merged
    }

    /// Merges a batch of observations in order.
    pub fn merge_observations(
        &self,
        elements: &[ContextElement],
        observations: &[ContextObservation],
        now: Timestamp,
    ) -> Vec<ContextElement> {
        observations
            .iter()
            .fold(elements.to_vec(), |acc, obs| self.merge_observation(&acc, obs, now))
    }
}
