//! Conversation memory configuration

use serde::Deserialize;

use crate::domain::memory::{
    DecayPolicy, HalfLives, DEFAULT_REINFORCEMENT_FACTOR, DEFAULT_WEIGHT_FLOOR,
};

use super::error::ValidationError;

/// Decay and reinforcement tuning
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_crisis_half_life")]
    pub crisis_half_life_hours: f64,

    #[serde(default = "default_emotional_half_life")]
    pub emotional_half_life_hours: f64,

    #[serde(default = "default_topic_half_life")]
    pub topic_half_life_hours: f64,

    #[serde(default = "default_preference_half_life")]
    pub preference_half_life_hours: f64,

    #[serde(default = "default_general_half_life")]
    pub general_half_life_hours: f64,

    /// Elements at or below this weight are pruned
    #[serde(default = "default_weight_floor")]
    pub weight_floor: f64,

    #[serde(default = "default_reinforcement_factor")]
    pub reinforcement_factor: f64,

    /// Active goals older than this are dropped
    #[serde(default = "default_goal_expiry_days")]
    pub goal_expiry_days: i64,
}

impl MemoryConfig {
    /// Builds the decay policy used by the pipeline
    pub fn decay_policy(&self) -> DecayPolicy {
        DecayPolicy {
            half_lives: HalfLives {
                crisis_hours: self.crisis_half_life_hours,
                emotional_hours: self.emotional_half_life_hours,
                topic_hours: self.topic_half_life_hours,
                preference_hours: self.preference_half_life_hours,
                general_hours: self.general_half_life_hours,
            },
            weight_floor: self.weight_floor,
            reinforcement_factor: self.reinforcement_factor,
            goal_expiry_days: self.goal_expiry_days,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let half_lives = [
            ("memory.crisis_half_life_hours", self.crisis_half_life_hours),
            ("memory.emotional_half_life_hours", self.emotional_half_life_hours),
            ("memory.topic_half_life_hours", self.topic_half_life_hours),
            ("memory.preference_half_life_hours", self.preference_half_life_hours),
            ("memory.general_half_life_hours", self.general_half_life_hours),
        ];
        for (field, hours) in half_lives {
            if hours <= 0.0 {
                return Err(ValidationError::MustBePositive(field));
            }
        }
        if !(0.0..1.0).contains(&self.weight_floor) {
            return Err(ValidationError::out_of_range("memory.weight_floor", 0.0, 1.0));
        }
        if self.reinforcement_factor < 1.0 {
            return Err(ValidationError::out_of_range(
                "memory.reinforcement_factor",
                1.0,
                f64::MAX,
            ));
        }
        if self.goal_expiry_days <= 0 {
            return Err(ValidationError::MustBePositive("memory.goal_expiry_days"));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            crisis_half_life_hours: default_crisis_half_life(),
            emotional_half_life_hours: default_emotional_half_life(),
            topic_half_life_hours: default_topic_half_life(),
            preference_half_life_hours: default_preference_half_life(),
            general_half_life_hours: default_general_half_life(),
            weight_floor: default_weight_floor(),
            reinforcement_factor: default_reinforcement_factor(),
            goal_expiry_days: default_goal_expiry_days(),
        }
    }
}

fn default_crisis_half_life() -> f64 {
    HalfLives::default().crisis_hours
}

fn default_emotional_half_life() -> f64 {
    HalfLives::default().emotional_hours
}

fn default_topic_half_life() -> f64 {
    HalfLives::default().topic_hours
}

fn default_preference_half_life() -> f64 {
    HalfLives::default().preference_hours
}

fn default_general_half_life() -> f64 {
    HalfLives::default().general_hours
}

fn default_weight_floor() -> f64 {
    DEFAULT_WEIGHT_FLOOR
}

fn default_reinforcement_factor() -> f64 {
    DEFAULT_REINFORCEMENT_FACTOR
}

fn default_goal_expiry_days() -> i64 {
    90
}
