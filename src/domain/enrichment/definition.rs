//! Topic domain definitions and relevance scoring.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainId;

fn default_threshold() -> f64 {
    0.6
}

fn default_enabled() -> bool {
    true
}

/// A topic domain the agent can enrich conversations with.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDefinition {
    pub id: DomainId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lower-case keywords that mark a message as relevant.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Minimum extractor confidence for a result to be accepted.
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl DomainDefinition {
    pub fn new(id: DomainId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            keywords: Vec::new(),
            confidence_threshold: default_threshold(),
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    pub fn with_threshold(mut self, confidence_threshold: f64) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether an extractor result with `confidence` is accepted.
    pub fn accepts(&self, confidence: f64) -> bool {
        confidence >= self.confidence_threshold
    }

    /// Keyword relevance of `message` to this domain, if any keyword matches.
    ///
    /// Single-word keywords must match a whole word; multi-word keywords
    /// match as a phrase.
    pub fn keyword_relevance(&self, message: &str) -> Option<DomainRelevance> {
        let lowercase = message.to_lowercase();
        let words: Vec<&str> = lowercase
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let matched: Vec<String> = self
            .keywords
            .iter()
            .filter(|keyword| {
                if keyword.contains(' ') {
                    lowercase.contains(keyword.as_str())
                } else {
                    words.iter().any(|w| w == *keyword)
                }
            })
            .cloned()
            .collect();

        if matched.is_empty() {
            return None;
        }

        let score = (0.5 + 0.2 * (matched.len() as f64 - 1.0)).min(1.0);
        Some(DomainRelevance {
            domain_id: self.id.clone(),
            score,
            matched_keywords: matched,
        })
    }
}

/// Why a domain applies to the current message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRelevance {
    pub domain_id: DomainId,
    pub score: f64,
    pub matched_keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goals() -> DomainDefinition {
        DomainDefinition::new(DomainId::new("goals").unwrap(), "Goals")
            .with_keywords(["goal", "books", "read", "make progress"])
    }

    #[test]
    fn keywords_match_whole_words() {
        let relevance = goals()
            .keyword_relevance("I want to set a goal to read 12 books")
            .unwrap();
        assert_eq!(relevance.matched_keywords, vec!["goal", "books", "read"]);
        assert!((relevance.score - 0.9).abs() < 1e-9);

        assert!(goals().keyword_relevance("goalkeeper training").is_none());
    }

    #[test]
    fn phrases_match_as_substrings() {
        let relevance = goals().keyword_relevance("Did I make progress today?").unwrap();
        assert_eq!(relevance.matched_keywords, vec!["make progress"]);
        assert_eq!(relevance.score, 0.5);
    }

    #[test]
    fn threshold_is_inclusive() {
        let domain = goals().with_threshold(0.7);
        assert!(domain.accepts(0.7));
        assert!(!domain.accepts(0.69));
    }

    #[test]
    fn definition_deserializes_with_defaults() {
        let domain: DomainDefinition = serde_yaml::from_str("id: Goals\nname: Goals\n").unwrap();
        assert_eq!(domain.id.as_str(), "goals");
        assert_eq!(domain.confidence_threshold, 0.6);
        assert!(domain.enabled);
        assert!(domain.keywords.is_empty());
    }
}
