//! ModeRegistry - dispatch table from response mode to handler
//!
//! Built once at startup. The `casual` handler is the catch-all for modes
//! without their own handler, so every registry must contain one.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::conversation::ResponseMode;
use crate::domain::orchestration::{HandlerError, ModeDescriptor, ModeHandler};
use crate::ports::TextGenerator;

use super::handler::PromptedModeHandler;

#[derive(Debug, Error, PartialEq)]
pub enum ModeRegistryError {
    #[error("Mode '{0}' is registered twice")]
    Duplicate(ResponseMode),

    #[error("A '{}' handler is required as the fallback", ResponseMode::casual())]
    MissingCasual,
}

/// Immutable mode → handler table
#[derive(Clone)]
pub struct ModeRegistry {
    handlers: BTreeMap<ResponseMode, Arc<dyn ModeHandler>>,
}

impl ModeRegistry {
    /// Builds a registry; fails on duplicate modes or without `casual`.
    pub fn new(handlers: Vec<Arc<dyn ModeHandler>>) -> Result<Self, ModeRegistryError> {
        let mut table = BTreeMap::new();
        for handler in handlers {
            let mode = handler.mode().clone();
            if table.insert(mode.clone(), handler).is_some() {
                return Err(ModeRegistryError::Duplicate(mode));
            }
        }
        if !table.contains_key(&ResponseMode::casual()) {
            return Err(ModeRegistryError::MissingCasual);
        }
        Ok(Self { handlers: table })
    }

    /// The four built-in modes, all backed by `generator`.
    pub fn with_defaults(generator: Arc<dyn TextGenerator>) -> Result<Self, ModeRegistryError> {
        Self::new(
            default_handlers(generator)
                .into_iter()
                .map(|h| Arc::new(h) as Arc<dyn ModeHandler>)
                .collect(),
        )
    }

    pub fn get(&self, mode: &ResponseMode) -> Option<&Arc<dyn ModeHandler>> {
        self.handlers.get(mode)
    }

    /// Handler for `mode`, or the casual handler when none is registered.
    pub fn handler_for(&self, mode: &ResponseMode) -> Result<Arc<dyn ModeHandler>, HandlerError> {
        if let Some(handler) = self.handlers.get(mode) {
            return Ok(handler.clone());
        }
        debug!(mode = %mode, "No handler for mode, using casual");
        self.handlers
            .get(&ResponseMode::casual())
            .cloned()
            .ok_or_else(|| HandlerError::NotRegistered(mode.to_string()))
    }

    /// Registered modes with descriptions, for classifiers and the detector.
    pub fn descriptors(&self) -> Vec<ModeDescriptor> {
        self.handlers
            .values()
            .map(|h| ModeDescriptor {
                mode: h.mode().clone(),
                description: h.description().to_string(),
            })
            .collect()
    }

    pub fn modes(&self) -> impl Iterator<Item = &ResponseMode> {
        self.handlers.keys()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// smalltalk, goal_tracking, emotional_support and casual.
pub fn default_handlers(generator: Arc<dyn TextGenerator>) -> Vec<PromptedModeHandler> {
    vec![
        PromptedModeHandler::new(
            ResponseMode::smalltalk(),
            "Greetings, pleasantries and light chat",
            "Respond to greetings and light chat briefly and warmly, in one or two sentences.",
            generator.clone(),
        )
        .with_max_tokens(150),
        PromptedModeHandler::new(
            ResponseMode::goal_tracking(),
            "Setting personal goals and reporting progress on them",
            "Help the user set and track personal goals. Acknowledge new goals and progress \
             concretely and suggest a realistic next step.",
            generator.clone(),
        ),
        PromptedModeHandler::new(
            ResponseMode::emotional_support(),
            "Stress, sadness, worry and other difficult feelings",
            "Listen closely and validate the user's feelings before offering anything else. \
             Ask gentle open questions; do not rush to fix things.",
            generator.clone(),
        ),
        PromptedModeHandler::new(
            ResponseMode::casual(),
            "General conversation that fits no other mode",
            "Have a natural, friendly conversation and follow the user's lead.",
            generator,
        ),
    ]
}
