//! Conversation memory.
//!
//! Context elements are facts with a weight that fades over time and is
//! strengthened when the fact comes up again.

mod context_element;
mod decay;

pub use context_element::{ContextElement, ContextObservation, ContextType};
pub use decay::{DecayPolicy, HalfLives, DEFAULT_REINFORCEMENT_FACTOR, DEFAULT_WEIGHT_FLOOR};
