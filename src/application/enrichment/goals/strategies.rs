//! Goal suggestion strategies
//!
//! Rule-based steering hints derived from an accepted goal extraction.

use async_trait::async_trait;

use crate::domain::conversation::{GoalAction, GoalExtraction};
use crate::domain::enrichment::{
    StrategyError, Suggestion, SuggestionContext, SuggestionStrategy,
};

fn goal_payload(context: &SuggestionContext<'_>) -> Result<GoalExtraction, StrategyError> {
    serde_json::from_value(context.extraction.payload.clone())
        .map_err(|e| StrategyError::UnusablePayload(e.to_string()))
}

/// Formats a per-period amount without trailing zeros ("1", "2.5").
fn amount(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Breaks a numeric yearly target into monthly and weekly milestones.
pub struct GoalMilestoneStrategy;

#[async_trait]
impl SuggestionStrategy for GoalMilestoneStrategy {
    fn name(&self) -> &str {
        "goal_milestones"
    }

    async fn suggest(
        &self,
        context: &SuggestionContext<'_>,
    ) -> Result<Vec<Suggestion>, StrategyError> {
        let goal = goal_payload(context)?;
        if goal.action != GoalAction::SetGoal {
            return Ok(Vec::new());
        }
        let Some(target) = goal.target_value.filter(|t| *t > 0.0) else {
            return Ok(Vec::new());
        };
        let title = goal.goal_title.as_deref().unwrap_or("this goal");
        let domain = context.domain.id.clone();

        let mut suggestions = vec![Suggestion::new(
            domain.clone(),
            self.name(),
            format!(
                "Suggest breaking \"{}\" into about {} per month",
                title,
                amount(target / 12.0)
            ),
        )];
        if target >= 52.0 {
            suggestions.push(Suggestion::new(
                domain,
                self.name(),
                format!("A weekly pace of {} keeps \"{}\" on track", amount(target / 52.0), title),
            ));
        }
        Ok(suggestions)
    }
}

/// Offers a progress check-in while goals are active.
pub struct GoalCheckInStrategy;

#[async_trait]
impl SuggestionStrategy for GoalCheckInStrategy {
    fn name(&self) -> &str {
        "goal_check_in"
    }

    async fn suggest(
        &self,
        context: &SuggestionContext<'_>,
    ) -> Result<Vec<Suggestion>, StrategyError> {
        let goal = goal_payload(context)?;
        let domain = context.domain.id.clone();

        let text = match goal.action {
            GoalAction::UpdateProgress => {
                "Acknowledge the progress and ask what helped this time".to_string()
            }
            GoalAction::CompleteGoal => "Celebrate finishing the goal and ask what is next".to_string(),
            GoalAction::SetGoal => "Offer to check in on progress in a week".to_string(),
            GoalAction::AbandonGoal | GoalAction::None => {
                let active = context.state.active_goals().count();
                if active == 0 {
                    return Ok(Vec::new());
                }
                format!("Ask how the {} active goal(s) are going", active)
            }
        };

        Ok(vec![Suggestion::new(domain, self.name(), text)])
    }
}
