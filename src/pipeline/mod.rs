//! Multi-phase synthesis pipelines.
//!
//! Two variants share one shape: a pipeline owns its injected collaborators
//! (synthesizer, store, registry), runs its phases strictly sequentially, and
//! reports progress only through the job registry.
//!
//! - [`BiblePipeline`] builds the project's world bible in three phases
//!   (characters, realms, items), committing each phase's artifacts before
//!   the next begins — a mid-run failure keeps every finished phase.
//! - [`OutlinePipeline`] synthesizes one volume per phase over a compressed
//!   digest of the volumes before it, and replaces the outline document
//!   atomically only after every phase succeeded.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;
use crate::synthesis::{DecodeError, SynthesisError};

pub mod bible;
pub mod context;
pub mod inputs;
pub mod outline;
pub mod prompts;

pub use bible::BiblePipeline;
pub use context::ContextWindow;
pub use inputs::{BibleInputs, draft_bible_inputs};
pub use outline::OutlinePipeline;

/// The project facts a pipeline needs; record CRUD lives with the
/// surrounding system, so callers pass the brief in rather than an id to
/// dereference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBrief {
    pub project_id: i64,
    pub title: String,
    pub genre: String,
    pub target_words: i64,
    #[serde(default)]
    pub description: String,
}

/// A phase failure, caught at the pipeline boundary and converted into
/// terminal job state — it never propagates as an unhandled fault, so
/// progress committed by earlier phases is never lost.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("synthesis failed in phase {phase}: {source}")]
    #[diagnostic(code(storyloom::pipeline::synthesis))]
    Synthesis {
        phase: String,
        #[source]
        source: SynthesisError,
    },

    #[error("unusable synthesizer output in phase {phase}: {source}")]
    #[diagnostic(
        code(storyloom::pipeline::decode),
        help("The provider returned malformed structured output; rerunning the job usually suffices.")
    )]
    Decode {
        phase: String,
        #[source]
        source: DecodeError,
    },

    #[error("persistence failed in phase {phase}: {source}")]
    #[diagnostic(code(storyloom::pipeline::store))]
    Store {
        phase: String,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    pub(crate) fn synthesis(phase: impl Into<String>, source: SynthesisError) -> Self {
        Self::Synthesis {
            phase: phase.into(),
            source,
        }
    }

    pub(crate) fn decode(phase: impl Into<String>, source: DecodeError) -> Self {
        Self::Decode {
            phase: phase.into(),
            source,
        }
    }

    pub(crate) fn store(phase: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            phase: phase.into(),
            source,
        }
    }

    /// The phase this failure occurred in.
    pub fn phase(&self) -> &str {
        match self {
            PipelineError::Synthesis { phase, .. }
            | PipelineError::Decode { phase, .. }
            | PipelineError::Store { phase, .. } => phase,
        }
    }
}
