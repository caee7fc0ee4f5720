//! ResponseComposer - turns several mode segments into one reply

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::orchestration::{
    composition::ordered, concatenate, detect_conflict, CompositionError, CompositionStrategy,
    ConflictPolicy, ModeSegment,
};
use crate::ports::{ChatRole, GenerationPurpose, GenerationRequest, TextGenerator};

const BLEND_PROMPT: &str = "You merge draft replies from a companion app into one reply. \
Keep everything the first draft says and fold in the other drafts without repeating any point. \
The first draft answers the main intent of the message and takes priority. \
Reply with the merged text only.";

pub struct ResponseComposer {
    generator: Arc<dyn TextGenerator>,
    policy: ConflictPolicy,
}

impl ResponseComposer {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: ConflictPolicy) -> Self {
        Self { generator, policy }
    }

    /// Composes segments primary-first.
    ///
    /// Non-conflicting sequential segments are joined without a generator
    /// call. Otherwise the generator blends them; if blending fails the
    /// primary segment is returned verbatim.
    pub async fn compose(
        &self,
        segments: &[ModeSegment],
        strategy: CompositionStrategy,
    ) -> Result<String, CompositionError> {
        let ordered = ordered(segments);
        let primary = ordered.first().ok_or(CompositionError::Empty)?;
        if ordered.len() == 1 {
            return Ok(primary.content.clone());
        }

        let contents: Vec<&str> = ordered.iter().map(|s| s.content.as_str()).collect();
        let conflict = detect_conflict(&contents, self.policy);
        if !conflict && strategy != CompositionStrategy::Blended {
            debug!(segments = ordered.len(), "Concatenating segments");
            return Ok(concatenate(segments));
        }

        debug!(conflict, ?strategy, "Blending segments");
        match self.blend(&contents).await {
            Ok(blended) => Ok(blended),
            Err(err) => {
                warn!(error = %err, "Blending failed, using primary response");
                Ok(primary.content.clone())
            }
        }
    }

    async fn blend(&self, contents: &[&str]) -> Result<String, CompositionError> {
        let drafts = contents
            .iter()
            .enumerate()
            .map(|(i, c)| format!("Draft {}:\n{}", i + 1, c))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = GenerationRequest::new(GenerationPurpose::Composition)
            .with_system_prompt(BLEND_PROMPT)
            .with_message(ChatRole::User, drafts)
            .with_temperature(0.3)
            .with_max_tokens(600);

        let response = self
            .generator
            .generate(request)
            .await
            .map_err(|e| CompositionError::Blending(e.to_string()))?;

        let blended = response.content.trim();
        if blended.is_empty() {
            return Err(CompositionError::Blending("empty response".to_string()));
        }
        Ok(blended.to_string())
    }
}
