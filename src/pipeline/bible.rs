//! World-bible generation: characters → realms → items.
//!
//! Each phase synthesizes one category of lore, decodes the structured
//! response, and commits the whole batch in a single store transaction
//! before the next phase starts. Partial progress is intentionally durable
//! per phase: a failure in "realms" leaves the committed "characters" batch
//! in place and marks the job failed.

use std::sync::Arc;

use tracing::instrument;

use crate::jobs::{JobId, JobRegistry};
use crate::store::models::{LoreCategory, NewLoreItem};
use crate::store::DocumentStore;
use crate::synthesis::{EntityBatch, SynthesisRequest, Synthesizer};

use super::{BibleInputs, PipelineError, prompts};

/// The fixed phase sequence of a bible run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BiblePhase {
    Characters,
    Realms,
    Items,
}

impl BiblePhase {
    const ALL: [BiblePhase; 3] = [BiblePhase::Characters, BiblePhase::Realms, BiblePhase::Items];

    /// JSON key the response nests its entity list under.
    fn key(&self) -> &'static str {
        match self {
            BiblePhase::Characters => "characters",
            BiblePhase::Realms => "realms",
            BiblePhase::Items => "items",
        }
    }

    fn category(&self) -> LoreCategory {
        match self {
            BiblePhase::Characters => LoreCategory::Character,
            BiblePhase::Realms => LoreCategory::Realm,
            BiblePhase::Items => LoreCategory::Item,
        }
    }

    /// Progress checkpoint reported when the phase starts.
    fn checkpoint(&self) -> u8 {
        match self {
            BiblePhase::Characters => 10,
            BiblePhase::Realms => 40,
            BiblePhase::Items => 80,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            BiblePhase::Characters => "Sketching the core cast and their entanglements...",
            BiblePhase::Realms => "Deriving realm tiers and breakthrough laws...",
            BiblePhase::Items => "Forging signature treasures and techniques...",
        }
    }

    fn prompt(&self, inputs: &BibleInputs) -> String {
        match self {
            BiblePhase::Characters => prompts::characters_prompt(inputs),
            BiblePhase::Realms => prompts::realms_prompt(inputs),
            BiblePhase::Items => prompts::items_prompt(inputs),
        }
    }
}

/// Fire-and-forget world-bible generator.
#[derive(Clone)]
pub struct BiblePipeline {
    synthesizer: Arc<dyn Synthesizer>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<JobRegistry>,
}

impl BiblePipeline {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            synthesizer,
            store,
            registry,
        }
    }

    /// Start a run on its own task and return the job id immediately.
    /// Completion is observed only through the registry.
    pub fn spawn(&self, project_id: i64, inputs: BibleInputs) -> JobId {
        let job_id = self.registry.create_job();
        let pipeline = self.clone();
        tokio::spawn(async move {
            if let Err(err) = pipeline.run(job_id, project_id, &inputs).await {
                tracing::warn!(job = %job_id, phase = err.phase(), error = %err, "bible generation failed");
            }
        });
        job_id
    }

    /// Drive all phases under an existing job entry.
    ///
    /// The job always reaches a terminal state: completed on success, failed
    /// with the phase's error recorded otherwise.
    #[instrument(skip(self, inputs), fields(job = %job_id))]
    pub async fn run(
        &self,
        job_id: JobId,
        project_id: i64,
        inputs: &BibleInputs,
    ) -> Result<(), PipelineError> {
        for phase in BiblePhase::ALL {
            if let Err(err) = self.run_phase(job_id, project_id, inputs, phase).await {
                let _ = self.registry.fail(
                    job_id,
                    format!("Generation failed while working on {}", phase.key()),
                    err.to_string(),
                );
                return Err(err);
            }
        }
        let _ = self.registry.complete(job_id, "World bible complete");
        Ok(())
    }

    async fn run_phase(
        &self,
        job_id: JobId,
        project_id: i64,
        inputs: &BibleInputs,
        phase: BiblePhase,
    ) -> Result<(), PipelineError> {
        let _ = self
            .registry
            .update(job_id, phase.checkpoint(), phase.message());

        let request = SynthesisRequest::structured(phase.prompt(inputs))
            .with_system_role(prompts::SYSTEM_WRITING_ASSISTANT);
        let response = self
            .synthesizer
            .generate(request)
            .await
            .map_err(|e| PipelineError::synthesis(phase.key(), e))?;

        // Decode fully before touching the store: a malformed response must
        // leave this phase without a single write.
        let batch = EntityBatch::decode(&response, phase.key())
            .map_err(|e| PipelineError::decode(phase.key(), e))?;
        let items: Vec<NewLoreItem> = batch
            .0
            .into_iter()
            .map(|draft| NewLoreItem {
                category: phase.category(),
                name: draft.name,
                description: draft.description,
                content: draft.content,
                ai_generated: true,
            })
            .collect();

        self.store
            .insert_lore_batch(project_id, items)
            .await
            .map_err(|e| PipelineError::store(phase.key(), e))?;
        Ok(())
    }
}
