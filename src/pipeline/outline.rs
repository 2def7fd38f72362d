//! Outline generation: one volume per phase over a compressed context.
//!
//! Unlike the bible run, the outline document is replaced atomically at the
//! very end. A failure in any phase aborts the run and leaves the previous
//! outline (if one exists) untouched — no partial document is ever
//! persisted.

use std::sync::Arc;

use tracing::instrument;

use crate::config::PipelineConfig;
use crate::jobs::{JobId, JobRegistry};
use crate::store::models::{Outline, OutlineContent, OutlineStatus, VolumeOutline};
use crate::store::DocumentStore;
use crate::synthesis::{SynthesisRequest, Synthesizer, VolumePayload};

use super::{PipelineError, ProjectBrief, context::ContextWindow, prompts};

/// Fire-and-forget outline generator.
#[derive(Clone)]
pub struct OutlinePipeline {
    synthesizer: Arc<dyn Synthesizer>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<JobRegistry>,
    volumes: usize,
}

impl OutlinePipeline {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<JobRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            synthesizer,
            store,
            registry,
            volumes: config.outline_volumes,
        }
    }

    /// Start a run on its own task and return the job id immediately.
    pub fn spawn(&self, brief: ProjectBrief, instruction: Option<String>) -> JobId {
        let job_id = self.registry.create_job();
        let pipeline = self.clone();
        tokio::spawn(async move {
            if let Err(err) = pipeline.run(job_id, &brief, instruction.as_deref()).await {
                tracing::warn!(job = %job_id, phase = err.phase(), error = %err, "outline generation failed");
            }
        });
        job_id
    }

    /// Drive all volume phases under an existing job entry and commit the
    /// assembled document as a single replacement.
    #[instrument(skip(self, brief, instruction), fields(job = %job_id, project = brief.project_id))]
    pub async fn run(
        &self,
        job_id: JobId,
        brief: &ProjectBrief,
        instruction: Option<&str>,
    ) -> Result<Outline, PipelineError> {
        match self.assemble(job_id, brief, instruction).await {
            Ok(outline) => {
                let _ = self.registry.complete(job_id, "Outline generated");
                Ok(outline)
            }
            Err(err) => {
                let _ = self.registry.fail(
                    job_id,
                    format!("Outline generation failed in {}", err.phase()),
                    err.to_string(),
                );
                Err(err)
            }
        }
    }

    async fn assemble(
        &self,
        job_id: JobId,
        brief: &ProjectBrief,
        instruction: Option<&str>,
    ) -> Result<Outline, PipelineError> {
        let lore = self
            .store
            .lore_for_project(brief.project_id)
            .await
            .map_err(|e| PipelineError::store("context", e))?;
        let lore_context = prompts::lore_context(&lore);
        let instruction = instruction.unwrap_or(prompts::DEFAULT_INSTRUCTION);

        let mut window = ContextWindow::new();
        let mut volumes: Vec<VolumeOutline> = Vec::with_capacity(self.volumes);

        for volume_no in 1..=self.volumes {
            let phase = format!("volume {volume_no}");
            let _ = self.registry.update(
                job_id,
                self.checkpoint(volume_no),
                format!("Outlining volume {volume_no} of {}...", self.volumes),
            );

            let prompt = prompts::outline_volume_prompt(
                brief,
                &lore_context,
                &window.render(),
                volume_no,
                instruction,
            );
            let request = SynthesisRequest::structured(prompt)
                .with_system_role(prompts::SYSTEM_WRITING_ASSISTANT);
            let response = self
                .synthesizer
                .generate(request)
                .await
                .map_err(|e| PipelineError::synthesis(phase.clone(), e))?;
            let volume =
                VolumePayload::decode(&response).map_err(|e| PipelineError::decode(phase, e))?;

            window.push(volume_no, &volume.title, volume.chapters.len());
            volumes.push(volume);
        }

        // Single atomic replacement: earlier volumes only exist in memory
        // until every phase has succeeded.
        self.store
            .put_outline(
                brief.project_id,
                &format!("{} outline", brief.title),
                OutlineContent { volumes },
                OutlineStatus::Generated,
            )
            .await
            .map_err(|e| PipelineError::store("commit", e))
    }

    /// Progress reported at the start of each volume phase.
    fn checkpoint(&self, volume_no: usize) -> u8 {
        (((volume_no - 1) * 100) / self.volumes) as u8
    }
}
