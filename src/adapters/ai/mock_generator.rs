//! Mock Text Generator for testing.
//!
//! Responses are scripted per [`GenerationPurpose`] label so that concurrent
//! callers (secondary mode handlers, domain extractors) each get their own
//! answer regardless of scheduling order.
//!
//! # Features
//!
//! - Per-purpose response queues, with a shared fallback queue
//! - Simulated delays, global or per purpose, for timeout testing
//! - Error injection for resilience testing
//! - Call tracking, including which calls ran to completion
//!
//! # Example
//!
//! ```ignore
//! let generator = MockTextGenerator::new()
//!     .with_response_for(GenerationPurpose::ModeResponse(ResponseMode::smalltalk()), "Hi!")
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    FinishReason, GenerationError, GenerationPurpose, GenerationRequest, GenerationResponse,
    GeneratorInfo, TextGenerator, TokenUsage,
};

/// Content returned when nothing was scripted.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Error(GenerationError),
}

#[derive(Debug, Default)]
struct Script {
    by_purpose: HashMap<String, VecDeque<MockResponse>>,
    fallback: VecDeque<MockResponse>,
    delays: HashMap<String, Duration>,
}

/// Scripted text generator for tests.
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    script: Arc<Mutex<Script>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
    completed: Arc<Mutex<Vec<String>>>,
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a response for any purpose without its own script.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .fallback
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Queues a response for one purpose.
    pub fn with_response_for(self, purpose: GenerationPurpose, content: impl Into<String>) -> Self {
        self.push_for(purpose, MockResponse::Success(content.into()));
        self
    }

    /// Queues a JSON response for one purpose.
    pub fn with_json_for(self, purpose: GenerationPurpose, value: serde_json::Value) -> Self {
        self.push_for(purpose, MockResponse::Success(value.to_string()));
        self
    }

    /// Queues an error for any purpose without its own script.
    pub fn with_error(self, error: GenerationError) -> Self {
        self.script
            .lock()
            .unwrap()
            .fallback
            .push_back(MockResponse::Error(error));
        self
    }

    /// Queues an error for one purpose.
    pub fn with_error_for(self, purpose: GenerationPurpose, error: GenerationError) -> Self {
        self.push_for(purpose, MockResponse::Error(error));
        self
    }

    /// Sets simulated latency for every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets simulated latency for one purpose, overriding the global delay.
    pub fn with_delay_for(self, purpose: GenerationPurpose, delay: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(purpose.label(), delay);
        self
    }

    fn push_for(&self, purpose: GenerationPurpose, response: MockResponse) {
        self.script
            .lock()
            .unwrap()
            .by_purpose
            .entry(purpose.label())
            .or_default()
            .push_back(response);
    }

    /// Returns the number of calls started.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns the number of calls started for one purpose.
    pub fn calls_for(&self, purpose: &GenerationPurpose) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.purpose == purpose)
            .count()
    }

    /// Returns the number of calls for one purpose that ran to completion.
    ///
    /// A call whose future was dropped (e.g. by a timeout) never completes.
    pub fn completed_for(&self, purpose: &GenerationPurpose) -> usize {
        let label = purpose.label();
        self.completed
            .lock()
            .unwrap()
            .iter()
            .filter(|l| **l == label)
            .count()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.completed.lock().unwrap().clear();
    }

    fn delay_for(&self, label: &str) -> Duration {
        self.script
            .lock()
            .unwrap()
            .delays
            .get(label)
            .copied()
            .unwrap_or(self.delay)
    }

    fn next_response(&self, label: &str) -> MockResponse {
        let mut script = self.script.lock().unwrap();
        if let Some(response) = script.by_purpose.get_mut(label).and_then(VecDeque::pop_front) {
            return response;
        }
        script
            .fallback
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(DEFAULT_MOCK_RESPONSE.to_string()))
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let label = request.purpose.label();
        self.calls.lock().unwrap().push(request);

        let delay = self.delay_for(&label);
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let response = self.next_response(&label);
        self.completed.lock().unwrap().push(label);

        match response {
            MockResponse::Success(content) => Ok(GenerationResponse {
                content,
                usage: TokenUsage::new(10, 20),
                model: "mock-model-1".to_string(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn generator_info(&self) -> GeneratorInfo {
        GeneratorInfo::new("mock", "mock-model-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ResponseMode;

    fn request(purpose: GenerationPurpose) -> GenerationRequest {
        GenerationRequest::new(purpose).with_message(crate::ports::ChatRole::User, "Hello")
    }

    fn smalltalk() -> GenerationPurpose {
        GenerationPurpose::ModeResponse(ResponseMode::smalltalk())
    }

    #[tokio::test]
    async fn returns_responses_in_order() {
        let generator = MockTextGenerator::new().with_response("First").with_response("Second");

        let r1 = generator.generate(request(GenerationPurpose::Composition)).await.unwrap();
        let r2 = generator.generate(request(GenerationPurpose::Composition)).await.unwrap();
        let r3 = generator.generate(request(GenerationPurpose::Composition)).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
        assert_eq!(r3.content, DEFAULT_MOCK_RESPONSE);
    }

    #[tokio::test]
    async fn routes_by_purpose_before_fallback() {
        let generator = MockTextGenerator::new()
            .with_response("fallback")
            .with_response_for(smalltalk(), "smalltalk reply");

        let other = generator.generate(request(GenerationPurpose::Composition)).await.unwrap();
        let routed = generator.generate(request(smalltalk())).await.unwrap();

        assert_eq!(other.content, "fallback");
        assert_eq!(routed.content, "smalltalk reply");
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let generator =
            MockTextGenerator::new().with_error_for(smalltalk(), GenerationError::rate_limited(30));

        let err = generator.generate(request(smalltalk())).await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn tracks_calls_per_purpose() {
        let generator = MockTextGenerator::new();
        generator.generate(request(smalltalk())).await.unwrap();
        generator.generate(request(GenerationPurpose::Composition)).await.unwrap();

        assert_eq!(generator.call_count(), 2);
        assert_eq!(generator.calls_for(&smalltalk()), 1);
        assert_eq!(generator.completed_for(&smalltalk()), 1);

        generator.clear_calls();
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_call_never_completes() {
        let generator =
            MockTextGenerator::new().with_delay_for(smalltalk(), Duration::from_secs(10));

        let result =
            tokio::time::timeout(Duration::from_secs(1), generator.generate(request(smalltalk()))).await;

        assert!(result.is_err());
        assert_eq!(generator.calls_for(&smalltalk()), 1);
        assert_eq!(generator.completed_for(&smalltalk()), 0);
    }
}
