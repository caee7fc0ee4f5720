//! Multi-intent detection results.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::ResponseMode;

/// Confidence attached to the fallback single-mode result.
pub const FALLBACK_DETECTION_CONFIDENCE: f64 = 0.3;

/// A mode and how confident the detector is that it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeScore {
    pub mode: ResponseMode,
    pub confidence: f64,
}

impl ModeScore {
    pub fn new(mode: ResponseMode, confidence: f64) -> Self {
        Self {
            mode,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// How multiple segments should be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionStrategy {
    /// Concatenate primary-first unless the segments conflict.
    Sequential,
    /// Always merge through the text generator.
    Blended,
}

/// Which modes a message needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiIntentResult {
    pub primary: ModeScore,
    pub secondary: Vec<ModeScore>,
    pub requires_orchestration: bool,
    pub composition_strategy: Option<CompositionStrategy>,
}

impl MultiIntentResult {
    /// A single-mode result; never requires orchestration.
    pub fn single(primary: ModeScore) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
            requires_orchestration: false,
            composition_strategy: None,
        }
    }

    /// Result used when detection fails.
    pub fn fallback(mode: ResponseMode) -> Self {
        Self::single(ModeScore::new(mode, FALLBACK_DETECTION_CONFIDENCE))
    }

    /// Builds a result from raw scores.
    ///
    /// Secondaries equal to the primary and repeated modes are dropped.
    /// Orchestration is required only when some secondary reaches
    /// `min_secondary_confidence`.
    pub fn from_scores(
        primary: ModeScore,
        secondary: Vec<ModeScore>,
        min_secondary_confidence: f64,
        composition_strategy: Option<CompositionStrategy>,
    ) -> Self {
        let mut unique: Vec<ModeScore> = Vec::new();
        for score in secondary {
            if score.mode == primary.mode {
                continue;
            }
            match unique.iter_mut().find(|s| s.mode == score.mode) {
                Some(existing) => existing.confidence = existing.confidence.max(score.confidence),
                None => unique.push(score),
            }
        }

        let requires_orchestration = unique
            .iter()
            .any(|s| s.confidence >= min_secondary_confidence);

        Self {
            primary,
            composition_strategy: if requires_orchestration {
                Some(composition_strategy.unwrap_or(CompositionStrategy::Sequential))
            } else {
                None
            },
            secondary: unique,
            requires_orchestration,
        }
    }

    /// Every mode involved, primary first.
    pub fn modes(&self) -> Vec<&ResponseMode> {
        std::iter::once(&self.primary.mode)
            .chain(self.secondary.iter().map(|s| &s.mode))
            .collect()
    }
}
