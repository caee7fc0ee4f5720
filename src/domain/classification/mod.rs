//! Classification domain module.
//!
//! Safety and intent signals, the arbitration rule that turns them into a
//! single per-turn decision, and the classifier service traits.

mod arbiter;
mod errors;
mod services;
mod values;

pub use arbiter::{
    arbitrate, crisis_resources, crisis_response, ArbiterDecision, CrisisResource, SafetyContext,
};
pub use errors::ClassificationError;
pub use services::{
    IntentClassifier, RuleBasedIntentClassifier, RuleBasedSafetyClassifier, SafetyClassifier,
};
pub use values::{
    ClassificationInput, IntentResult, SafetyLevel, SafetyResult, Tone,
    CLASSIFIER_UNAVAILABLE_SIGNAL, FALLBACK_INTENT_CONFIDENCE, UNCLEAR_INTENT,
};
