//! Domain enrichment module.
//!
//! Topic domains, their extraction records and suggestion bundles, the
//! clarifications they raise, and the plugin traits they implement.

mod clarification;
mod context;
mod definition;
mod errors;
mod extraction;
mod services;
mod suggestion;

pub use clarification::{ClarificationRecord, ClarificationRequest};
pub use context::observations_from_classification;
pub use definition::{DomainDefinition, DomainRelevance};
pub use errors::{ExtractionError, RelevanceError, StrategyError};
pub use extraction::{ExtractionOutcome, ExtractionRecord};
pub use services::{
    domain_ids, DomainExtractor, ExtractionContext, KeywordRelevanceDetector, RelevanceDetector,
    SuggestionContext, SuggestionStrategy,
};
pub use suggestion::{merge_suggestions, Suggestion, SuggestionBundle};
