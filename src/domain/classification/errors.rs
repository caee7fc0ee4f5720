//! Error types for classification

/// Classification errors. Callers replace these with the conservative
/// fallbacks; they never abort a turn.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ClassificationError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("Classifier timed out after {0}ms")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_error_displays_cause() {
        let err = ClassificationError::InvalidResponse("missing level".to_string());
        assert_eq!(err.to_string(), "Invalid classifier response: missing level");
    }
}
