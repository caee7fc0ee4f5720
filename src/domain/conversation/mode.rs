//! Response modes.
//!
//! A mode names the generator that answers a turn. Modes are discovered
//! from the registered handlers, so this is an open identifier rather than
//! a closed enum; the well-known ids below are the ones shipped by default.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

pub const SMALLTALK: &str = "smalltalk";
pub const GOAL_TRACKING: &str = "goal_tracking";
pub const EMOTIONAL_SUPPORT: &str = "emotional_support";
pub const CASUAL: &str = "casual";

/// Identifier of a response mode, normalised to `snake_case`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMode(String);

impl ResponseMode {
    /// Parses a mode id, accepting `SMALLTALK`, `goal-tracking`, `Goal Tracking`...
    pub fn new(id: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = id
            .as_ref()
            .trim()
            .to_lowercase()
            .replace(['-', ' '], "_");
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("mode"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "mode",
                format!("'{}' is not a valid mode id", id.as_ref()),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn smalltalk() -> Self {
        Self(SMALLTALK.to_string())
    }

    pub fn goal_tracking() -> Self {
        Self(GOAL_TRACKING.to_string())
    }

    pub fn emotional_support() -> Self {
        Self(EMOTIONAL_SUPPORT.to_string())
    }

    /// The default mode used when intent is unclear.
    pub fn casual() -> Self {
        Self(CASUAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResponseMode {
    fn default() -> Self {
        Self::casual()
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
