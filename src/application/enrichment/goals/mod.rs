//! Goals enrichment domain
//!
//! Tracks personal goals mentioned in conversation: an LLM extractor for
//! goal actions and two rule-based suggestion strategies.

mod extractor;
mod strategies;

use std::sync::Arc;

pub use extractor::{first_integer, parse_goal_payload, LlmGoalExtractor, GOAL_SELECTION};
pub use strategies::{GoalCheckInStrategy, GoalMilestoneStrategy};

use crate::domain::enrichment::DomainDefinition;
use crate::domain::foundation::DomainId;
use crate::ports::TextGenerator;

use super::{DomainRegistryBuilder, RegistryError};

/// Identifier of the goals domain.
pub const GOALS_DOMAIN: &str = "goals";

pub fn goals_domain_id() -> DomainId {
    DomainId::from_static(GOALS_DOMAIN)
}

/// Built-in definition; a domain file may override it.
pub fn goals_definition() -> DomainDefinition {
    DomainDefinition::new(goals_domain_id(), "Goals")
        .with_description("Personal goals, targets and progress updates")
        .with_keywords([
            "goal", "goals", "target", "progress", "finished", "read", "books", "habit",
            "track", "milestone",
        ])
        .with_threshold(0.6)
}

/// Registers the goals domain with its extractor and strategies.
pub fn register_goals(
    builder: DomainRegistryBuilder,
    generator: Arc<dyn TextGenerator>,
) -> Result<DomainRegistryBuilder, RegistryError> {
    Ok(builder
        .register(goals_definition(), Arc::new(LlmGoalExtractor::new(generator)))?
        .with_strategy(goals_domain_id(), Arc::new(GoalMilestoneStrategy))
        .with_strategy(goals_domain_id(), Arc::new(GoalCheckInStrategy)))
}
