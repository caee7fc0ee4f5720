//! Text Generation Adapters.
//!
//! Implementations of the TextGenerator port, plus classifiers built on it.
//!
//! ## Available Adapters
//!
//! - `MockTextGenerator` - Scripted mock for testing
//! - `OpenAIGenerator` - OpenAI-compatible chat completions
//! - `LlmSafetyClassifier` / `LlmIntentClassifier` - model-backed classification

mod llm_classifiers;
mod mock_generator;
mod openai_generator;

pub use llm_classifiers::{LlmIntentClassifier, LlmSafetyClassifier};
pub use mock_generator::{MockResponse, MockTextGenerator, DEFAULT_MOCK_RESPONSE};
pub use openai_generator::{OpenAIConfig, OpenAIGenerator};
