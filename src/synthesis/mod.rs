//! Content synthesizer seam.
//!
//! The pipelines depend on the [`Synthesizer`] trait, never on a concrete
//! provider: production wires in the rig-backed client (behind the `llm`
//! feature), tests substitute a scripted fake. The synthesizer is a
//! constructed dependency handed to each pipeline — there is no global
//! client instance.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use miette::Diagnostic;
use thiserror::Error;

pub mod decode;
#[cfg(feature = "llm")]
pub mod rig_client;

pub use decode::{DecodeError, EntityBatch, EntityDraft, VolumePayload};
#[cfg(feature = "llm")]
pub use rig_client::RigSynthesizer;

/// Finite, non-restartable sequence of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String, SynthesisError>>;

/// One request against the external text-generation capability.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub prompt: String,
    pub system_role: String,
    pub temperature: f64,
    pub max_output: u32,
    /// Ask the provider for parseable (JSON) output. The response may still
    /// be malformed; callers decode defensively.
    pub structured: bool,
}

impl SynthesisRequest {
    pub const DEFAULT_SYSTEM_ROLE: &'static str =
        "You are a helpful creative writing assistant.";
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_MAX_OUTPUT: u32 = 2000;

    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_role: Self::DEFAULT_SYSTEM_ROLE.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_output: Self::DEFAULT_MAX_OUTPUT,
            structured: false,
        }
    }

    /// A request expecting structured (JSON) output.
    pub fn structured(prompt: impl Into<String>) -> Self {
        let mut request = Self::new(prompt);
        request.structured = true;
        request
    }

    #[must_use]
    pub fn with_system_role(mut self, system_role: impl Into<String>) -> Self {
        self.system_role = system_role.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_output(mut self, max_output: u32) -> Self {
        self.max_output = max_output;
        self
    }
}

/// Failures of the synthesis collaborator. All of them abort the calling
/// phase; none of them are retried automatically within a run.
#[derive(Debug, Error, Diagnostic)]
pub enum SynthesisError {
    #[error("provider {provider} call failed: {message}")]
    #[diagnostic(code(storyloom::synthesis::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("synthesis call timed out after {seconds}s")]
    #[diagnostic(
        code(storyloom::synthesis::timeout),
        help("Raise SYNTHESIS_TIMEOUT_SECS or reduce max_output for this phase.")
    )]
    Timeout { seconds: u64 },

    #[error("synthesizer unavailable: {reason}")]
    #[diagnostic(
        code(storyloom::synthesis::unavailable),
        help("Check SYNTHESIS_API_KEY and SYNTHESIS_BASE_URL.")
    )]
    Unavailable { reason: String },
}

/// Thin interface over an external text-generation capability.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Generate a complete response for the request.
    async fn generate(&self, request: SynthesisRequest) -> Result<String, SynthesisError>;

    /// Generate a streaming response. The default implementation degrades to
    /// a single-fragment stream over [`Synthesizer::generate`]; providers
    /// with native streaming override it.
    async fn generate_stream(
        &self,
        request: SynthesisRequest,
    ) -> Result<TextStream, SynthesisError> {
        let text = self.generate(request).await?;
        let stream =
            futures_util::stream::once(async move { Ok::<String, SynthesisError>(text) });
        Ok(Box::pin(stream))
    }
}
