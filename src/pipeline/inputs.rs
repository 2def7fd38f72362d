//! Single-shot drafting of the three bible seed premises.
//!
//! Runs synchronously in the caller's context — no job is involved, the
//! result goes straight back to the user for editing before a bible run.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::synthesis::{DecodeError, SynthesisRequest, Synthesizer};

use super::{PipelineError, ProjectBrief, prompts};

/// The user-editable premises every bible run starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibleInputs {
    /// Who the story follows.
    #[serde(default)]
    pub protagonist: String,
    /// The protagonist's unfair advantage.
    #[serde(default)]
    pub cheat: String,
    /// The world's progression ladder.
    #[serde(default)]
    pub power_system: String,
}

/// Ask the synthesizer to draft [`BibleInputs`] from project basics.
#[instrument(skip(synthesizer, brief), fields(project = brief.project_id))]
pub async fn draft_bible_inputs(
    synthesizer: &dyn Synthesizer,
    brief: &ProjectBrief,
) -> Result<BibleInputs, PipelineError> {
    let request = SynthesisRequest::structured(prompts::bible_inputs_prompt(brief))
        .with_system_role(prompts::SYSTEM_WRITING_ASSISTANT);
    let response = synthesizer
        .generate(request)
        .await
        .map_err(|e| PipelineError::synthesis("inputs", e))?;
    serde_json::from_str(&response)
        .map_err(|e| PipelineError::decode("inputs", DecodeError::from(e)))
}
