//! Runtime configuration for synthesis, pipelines, and progress streaming.
//!
//! All settings resolve from the environment (via `dotenvy`) with sensible
//! defaults, and every struct offers `with_*` builders so tests and embedders
//! can override without touching the environment.

use std::time::Duration;

/// Connection settings for the external synthesis provider.
///
/// The provider is OpenAI-compatible; the timeout applies to each individual
/// synthesis call and is treated as a synthesizer failure when exceeded.
#[derive(Clone, Debug)]
pub struct SynthesisConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl SynthesisConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Resolve configuration from the environment.
    ///
    /// Reads `SYNTHESIS_API_KEY`, `SYNTHESIS_BASE_URL`, `SYNTHESIS_MODEL`,
    /// and `SYNTHESIS_TIMEOUT_SECS`. A missing API key is allowed — the
    /// rig-backed client reports `Unavailable` at call time instead of
    /// failing construction.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let timeout_secs = std::env::var("SYNTHESIS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);
        Self {
            api_key: std::env::var("SYNTHESIS_API_KEY").ok(),
            base_url: std::env::var("SYNTHESIS_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
            model: std::env::var("SYNTHESIS_MODEL")
                .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Tuning for the phase pipelines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of sequential volume phases an outline run generates.
    pub outline_volumes: usize,
}

impl PipelineConfig {
    pub const DEFAULT_OUTLINE_VOLUMES: usize = 3;

    #[must_use]
    pub fn new() -> Self {
        Self {
            outline_volumes: Self::DEFAULT_OUTLINE_VOLUMES,
        }
    }

    #[must_use]
    pub fn with_outline_volumes(mut self, outline_volumes: usize) -> Self {
        self.outline_volumes = outline_volumes.max(1);
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Polling cadence for job progress streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressConfig {
    pub poll_interval: Duration,
}

impl ProgressConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self::new()
    }
}
