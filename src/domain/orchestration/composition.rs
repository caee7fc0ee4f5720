//! Composition of several mode segments into one reply.
//!
//! Conflict detection is a shared-word heuristic: two responses that reuse
//! many of the same long words are probably saying the same thing and
//! need a merge instead of being stacked.

use std::collections::HashSet;

use super::segment::ModeSegment;

/// Separator between concatenated segments.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

/// Words longer than this many characters count as significant.
pub const SIGNIFICANT_WORD_LENGTH: usize = 4;

/// Lower-cased words longer than four characters, punctuation trimmed.
pub fn significant_words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > SIGNIFICANT_WORD_LENGTH)
        .collect()
}

/// Thresholds for [`detect_conflict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictPolicy {
    /// Only responses longer than this (in chars) are compared.
    pub min_length: usize,
    /// A pair sharing more than this many significant words conflicts.
    pub shared_word_limit: usize,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            min_length: 50,
            shared_word_limit: 5,
        }
    }
}

/// True when any pair of long-enough responses shares more than
/// `shared_word_limit` significant words.
pub fn detect_conflict(responses: &[&str], policy: ConflictPolicy) -> bool {
    let candidates: Vec<HashSet<String>> = responses
        .iter()
        .filter(|r| r.chars().count() > policy.min_length)
        .map(|r| significant_words(r))
        .collect();

    for (i, left) in candidates.iter().enumerate() {
        for right in &candidates[i + 1..] {
            if left.intersection(right).count() > policy.shared_word_limit {
                return true;
            }
        }
    }
    false
}

/// Segments ordered primary-first (by priority, stable).
pub fn ordered(segments: &[ModeSegment]) -> Vec<&ModeSegment> {
    let mut ordered: Vec<&ModeSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.priority);
    ordered
}

/// Joins segment contents primary-first with paragraph breaks.
pub fn concatenate(segments: &[ModeSegment]) -> String {
    ordered(segments)
        .iter()
        .map(|s| s.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

/// Merges every segment's state updates in priority order; later segments
/// overwrite earlier keys.
pub fn merge_state_updates(segments: &[ModeSegment]) -> serde_json::Map<String, serde_json::Value> {
    let mut merged = serde_json::Map::new();
    for segment in ordered(segments) {
        if let Some(updates) = &segment.metadata.state_updates {
            for (key, value) in updates {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
