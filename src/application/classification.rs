//! ClassificationService - safety and intent signals for one turn
//!
//! Runs the safety classifier, then the intent classifier, replaces
//! failures with the conservative fallbacks and arbitrates the result.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::classification::{
    arbitrate, ArbiterDecision, ClassificationInput, IntentClassifier, IntentResult,
    SafetyClassifier, SafetyResult,
};
use crate::domain::foundation::Timestamp;

/// Everything classification produced this turn
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub decision: ArbiterDecision,
    pub safety: SafetyResult,
    pub intent: IntentResult,
}

/// Sequential safety-then-intent classification with fallbacks
pub struct ClassificationService {
    safety: Arc<dyn SafetyClassifier>,
    intent: Arc<dyn IntentClassifier>,
}

impl ClassificationService {
    pub fn new(safety: Arc<dyn SafetyClassifier>, intent: Arc<dyn IntentClassifier>) -> Self {
        Self { safety, intent }
    }

    /// Never fails; a broken classifier degrades to its fallback.
    pub async fn classify(&self, input: &ClassificationInput, now: Timestamp) -> ClassificationOutcome {
        let safety = match self.safety.classify(input).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Safety classification failed, using fallback");
                SafetyResult::fallback()
            }
        };

        let intent = match self.intent.classify(input).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Intent classification failed, using fallback");
                IntentResult::fallback()
            }
        };

        let decision = arbitrate(&safety, &intent, now);
        debug!(
            level = %safety.level,
            safety_fallback = safety.is_fallback(),
            intent = %intent.intent,
            mode = %decision.final_mode,
            "Turn classified"
        );

        ClassificationOutcome {
            decision,
            safety,
            intent,
        }
    }
}
