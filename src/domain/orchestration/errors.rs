//! Error types for response orchestration

/// Mode handler errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum HandlerError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Handler timed out after {0}ms")]
    Timeout(u64),

    #[error("No handler registered for mode '{0}'")]
    NotRegistered(String),
}

/// Multi-intent detection errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DetectionError {
    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Invalid detector response: {0}")]
    InvalidResponse(String),
}

/// Composition errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CompositionError {
    #[error("Nothing to compose")]
    Empty,

    #[error("Blending failed: {0}")]
    Blending(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_timeout_displays_millis() {
        assert_eq!(HandlerError::Timeout(8000).to_string(), "Handler timed out after 8000ms");
    }

    #[test]
    fn missing_handler_names_mode() {
        let err = HandlerError::NotRegistered("poetry".to_string());
        assert!(err.to_string().contains("'poetry'"));
    }
}
