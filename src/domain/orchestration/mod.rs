//! Response orchestration domain module.
//!
//! Multi-intent results, mode segments, the composition rules that merge
//! segments into one reply, and the handler/detector service traits.

pub mod composition;
mod errors;
mod segment;
mod services;
mod values;

pub use composition::{
    concatenate, detect_conflict, merge_state_updates, significant_words, ConflictPolicy,
    SEGMENT_SEPARATOR,
};
pub use errors::{CompositionError, DetectionError, HandlerError};
pub use segment::{ContentType, ModeSegment, SegmentMetadata, PRIMARY_PRIORITY};
pub use services::{
    DetectionInput, HandlerRequest, ModeDescriptor, ModeHandler, MultiIntentDetector,
};
pub use values::{
    CompositionStrategy, ModeScore, MultiIntentResult, FALLBACK_DETECTION_CONFIDENCE,
};
