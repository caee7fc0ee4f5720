//! Steering suggestions and their cross-domain merge.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::{DomainId, Timestamp};

/// One proactive hint for the response generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub domain_id: DomainId,
    /// Name of the strategy that produced it.
    pub strategy: String,
    pub text: String,
}

impl Suggestion {
    pub fn new(domain_id: DomainId, strategy: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            domain_id,
            strategy: strategy.into(),
            text: text.into(),
        }
    }

    fn dedup_key(&self) -> String {
        self.text.trim().to_lowercase()
    }
}

/// Merged steering hints attached to the conversation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBundle {
    pub suggestions: Vec<Suggestion>,
    pub generated_at: Timestamp,
}

impl SuggestionBundle {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.suggestions.iter().map(|s| s.text.as_str())
    }
}

/// Merges per-domain suggestions in order, dropping blanks and duplicates
/// (trimmed, case-insensitive) and keeping at most `max` entries.
pub fn merge_suggestions<I>(groups: I, max: usize, now: Timestamp) -> SuggestionBundle
where
    I: IntoIterator<Item = Vec<Suggestion>>,
{
    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for suggestion in groups.into_iter().flatten() {
        if suggestions.len() >= max {
            break;
        }
        let key = suggestion.dedup_key();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        suggestions.push(Suggestion {
            text: suggestion.text.trim().to_string(),
            ..suggestion
        });
    }

    SuggestionBundle {
        suggestions,
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(domain: &str, text: &str) -> Suggestion {
        Suggestion::new(DomainId::new(domain).unwrap(), "test", text)
    }

    #[test]
    fn merge_dedups_case_insensitively() {
        let bundle = merge_suggestions(
            vec![
                vec![suggestion("goals", "Check in on reading")],
                vec![
                    suggestion("health", "  check IN on reading "),
                    suggestion("health", "Drink water"),
                ],
            ],
            5,
            Timestamp::now(),
        );

        let texts: Vec<_> = bundle.texts().collect();
        assert_eq!(texts, vec!["Check in on reading", "Drink water"]);
    }

    #[test]
    fn merge_caps_at_max() {
        let many: Vec<Suggestion> = (0..10).map(|i| suggestion("goals", &format!("tip {}", i))).collect();
        let bundle = merge_suggestions(vec![many], 5, Timestamp::now());
        assert_eq!(bundle.suggestions.len(), 5);
        assert_eq!(bundle.suggestions[4].text, "tip 4");
    }

    #[test]
    fn merge_skips_blank_text() {
        let bundle = merge_suggestions(vec![vec![suggestion("goals", "   ")]], 5, Timestamp::now());
        assert!(bundle.is_empty());
    }
}
