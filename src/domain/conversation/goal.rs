//! User goals and the goal-domain extraction payload.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GoalId, Timestamp};

/// Lifecycle of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

/// A goal the user has stated in conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub description: String,
    pub status: GoalStatus,
    pub target_value: Option<f64>,
    pub progress: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Goal {
    /// Creates a new active goal with no progress.
    pub fn new(description: impl Into<String>, target_value: Option<f64>, now: Timestamp) -> Self {
        Self {
            id: GoalId::new(),
            description: description.into(),
            status: GoalStatus::Active,
            target_value,
            progress: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    /// Completion ratio in `[0, 1]`, if the goal has a numeric target.
    pub fn completion_ratio(&self) -> Option<f64> {
        self.target_value
            .filter(|t| *t > 0.0)
            .map(|t| (self.progress / t).clamp(0.0, 1.0))
    }

    fn matches_title(&self, title: &str) -> bool {
        let needle = title.trim().to_lowercase();
        !needle.is_empty() && self.description.to_lowercase().contains(&needle)
    }
}

/// What the user wants to do with a goal this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalAction {
    SetGoal,
    UpdateProgress,
    CompleteGoal,
    AbandonGoal,
    None,
}

/// Structured payload produced by the goal domain extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalExtraction {
    pub action: GoalAction,
    #[serde(default)]
    pub goal_title: Option<String>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub progress_value: Option<f64>,
    #[serde(default)]
    pub goal_id: Option<GoalId>,
}

/// Which existing goal an extraction refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalTarget {
    Found(GoalId),
    Ambiguous(Vec<GoalId>),
    Missing,
}

/// Resolves the goal an update/complete/abandon action refers to.
///
/// An explicit id wins, then a title match, then the only active goal.
pub fn find_target_goal(goals: &[Goal], extraction: &GoalExtraction) -> GoalTarget {
    let active: Vec<&Goal> = goals.iter().filter(|g| g.is_active()).collect();

    if let Some(id) = extraction.goal_id {
        if active.iter().any(|g| g.id == id) {
            return GoalTarget::Found(id);
        }
    }

    if let Some(title) = extraction.goal_title.as_deref() {
        let matches: Vec<GoalId> = active
            .iter()
            .filter(|g| g.matches_title(title))
            .map(|g| g.id)
            .collect();
        match matches.len() {
            1 => return GoalTarget::Found(matches[0]),
            n if n > 1 => return GoalTarget::Ambiguous(matches),
            _ => {}
        }
    }

    match active.len() {
        0 => GoalTarget::Missing,
        1 => GoalTarget::Found(active[0].id),
        _ => GoalTarget::Ambiguous(active.iter().map(|g| g.id).collect()),
    }
}

/// Result of applying an extraction to the goal list.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalChange {
    pub goals: Vec<Goal>,
    /// Goals created or modified, in order of change.
    pub changed: Vec<GoalId>,
}

/// Applies a goal extraction, returning the new goal list.
///
/// Ambiguous or missing targets leave the list unchanged; the extractor is
/// responsible for asking the user which goal they meant.
pub fn apply_goal_extraction(
    goals: &[Goal],
    extraction: &GoalExtraction,
    now: Timestamp,
) -> GoalChange {
    let mut updated = goals.to_vec();
    let mut changed = Vec::new();

    match extraction.action {
        GoalAction::None => {}
        GoalAction::SetGoal => {
            let Some(title) = extraction
                .goal_title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
            else {
                return GoalChange { goals: updated, changed };
            };

            let existing = updated
                .iter_mut()
                .find(|g| g.is_active() && g.description.eq_ignore_ascii_case(title));
            match existing {
                Some(goal) => {
                    if extraction.target_value.is_some() {
                        goal.target_value = extraction.target_value;
                    }
                    goal.updated_at = now;
                    changed.push(goal.id);
                }
                None => {
                    let goal = Goal::new(title, extraction.target_value, now);
                    changed.push(goal.id);
                    updated.push(goal);
                }
            }
        }
        GoalAction::UpdateProgress | GoalAction::CompleteGoal | GoalAction::AbandonGoal => {
            let GoalTarget::Found(id) = find_target_goal(&updated, extraction) else {
                return GoalChange { goals: updated, changed };
            };
            if let Some(goal) = updated.iter_mut().find(|g| g.id == id) {
                match extraction.action {
                    GoalAction::UpdateProgress => {
                        if let Some(progress) = extraction.progress_value {
                            goal.progress = progress.max(0.0);
                        }
                        if goal.target_value.is_some_and(|t| goal.progress >= t) {
                            goal.status = GoalStatus::Completed;
                        }
                    }
                    GoalAction::CompleteGoal => {
                        goal.status = GoalStatus::Completed;
                        if let Some(target) = goal.target_value {
                            goal.progress = goal.progress.max(target);
                        }
                    }
                    _ => goal.status = GoalStatus::Abandoned,
                }
                goal.updated_at = now;
                changed.push(goal.id);
            }
        }
    }

    GoalChange { goals: updated, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extraction(action: GoalAction) -> GoalExtraction {
        GoalExtraction {
            action,
            goal_title: None,
            target_value: None,
            progress_value: None,
            goal_id: None,
        }
    }

    #[test]
    fn payload_deserializes_from_camel_case() {
        let payload: GoalExtraction = serde_json::from_value(json!({
            "action": "set_goal",
            "goalTitle": "Read 12 books this year",
            "targetValue": 12
        }))
        .unwrap();

        assert_eq!(payload.action, GoalAction::SetGoal);
        assert_eq!(payload.goal_title.as_deref(), Some("Read 12 books this year"));
        assert_eq!(payload.target_value, Some(12.0));
        assert!(payload.progress_value.is_none());
    }

    #[test]
    fn set_goal_creates_active_goal() {
        let now = Timestamp::now();
        let change = apply_goal_extraction(
            &[],
            &GoalExtraction {
                goal_title: Some("Read 12 books".into()),
                target_value: Some(12.0),
                ..extraction(GoalAction::SetGoal)
            },
            now,
        );

        assert_eq!(change.goals.len(), 1);
        assert_eq!(change.changed, vec![change.goals[0].id]);
        assert!(change.goals[0].is_active());
        assert_eq!(change.goals[0].target_value, Some(12.0));
    }

    #[test]
    fn set_goal_with_same_title_updates_instead_of_duplicating() {
        let now = Timestamp::now();
        let goal = Goal::new("Read 12 books", Some(12.0), now);
        let change = apply_goal_extraction(
            &[goal.clone()],
            &GoalExtraction {
                goal_title: Some("read 12 BOOKS".into()),
                target_value: Some(15.0),
                ..extraction(GoalAction::SetGoal)
            },
            now,
        );

        assert_eq!(change.goals.len(), 1);
        assert_eq!(change.goals[0].target_value, Some(15.0));
        assert_eq!(change.changed, vec![goal.id]);
    }

    #[test]
    fn progress_reaching_target_completes_goal() {
        let now = Timestamp::now();
        let goal = Goal::new("Read 12 books", Some(12.0), now);
        let change = apply_goal_extraction(
            &[goal],
            &GoalExtraction {
                progress_value: Some(12.0),
                ..extraction(GoalAction::UpdateProgress)
            },
            now,
        );

        assert_eq!(change.goals[0].status, GoalStatus::Completed);
        assert_eq!(change.goals[0].completion_ratio(), Some(1.0));
    }

    #[test]
    fn ambiguous_update_changes_nothing() {
        let now = Timestamp::now();
        let goals = vec![
            Goal::new("Read 12 books", Some(12.0), now),
            Goal::new("Run 100 km", Some(100.0), now),
        ];
        let update = GoalExtraction {
            progress_value: Some(3.0),
            ..extraction(GoalAction::UpdateProgress)
        };

        assert!(matches!(find_target_goal(&goals, &update), GoalTarget::Ambiguous(ids) if ids.len() == 2));
        let change = apply_goal_extraction(&goals, &update, now);
        assert!(change.changed.is_empty());
        assert_eq!(change.goals, goals);
    }

    #[test]
    fn title_match_disambiguates() {
        let now = Timestamp::now();
        let goals = vec![
            Goal::new("Read 12 books", Some(12.0), now),
            Goal::new("Run 100 km", Some(100.0), now),
        ];
        let update = GoalExtraction {
            goal_title: Some("run".into()),
            ..extraction(GoalAction::AbandonGoal)
        };

        assert_eq!(find_target_goal(&goals, &update), GoalTarget::Found(goals[1].id));
        let change = apply_goal_extraction(&goals, &update, now);
        assert_eq!(change.goals[1].status, GoalStatus::Abandoned);
        assert_eq!(change.goals[0].status, GoalStatus::Active);
    }

    #[test]
    fn missing_target_when_no_active_goals() {
        let update = extraction(GoalAction::CompleteGoal);
        assert_eq!(find_target_goal(&[], &update), GoalTarget::Missing);
    }
}
