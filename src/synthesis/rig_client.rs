//! Rig-backed synthesizer against an OpenAI-compatible endpoint.
//!
//! Enabled by the `llm` feature. The client is constructed from
//! [`SynthesisConfig`] and injected into pipelines like any other
//! [`Synthesizer`]; a missing API key produces a client that reports
//! [`SynthesisError::Unavailable`] at call time instead of failing at
//! construction.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{AssistantContent, CompletionModel};
use rig::providers::openai;
use serde_json::json;
use tracing::instrument;

use super::{SynthesisError, SynthesisRequest, Synthesizer};
use crate::config::SynthesisConfig;

const PROVIDER: &str = "openai-compatible";

/// Production synthesizer backed by `rig-core`.
pub struct RigSynthesizer {
    client: Option<openai::Client>,
    model: String,
    timeout: std::time::Duration,
}

impl std::fmt::Debug for RigSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigSynthesizer")
            .field("model", &self.model)
            .field("configured", &self.client.is_some())
            .finish()
    }
}

impl RigSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        let client = config
            .api_key
            .as_deref()
            .map(|key| openai::Client::from_url(key, &config.base_url));
        if client.is_none() {
            tracing::warn!("SYNTHESIS_API_KEY not set; synthesis calls will fail as unavailable");
        }
        Self {
            client,
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Synthesizer for RigSynthesizer {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(&self, request: SynthesisRequest) -> Result<String, SynthesisError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SynthesisError::Unavailable {
                reason: "no API key configured".to_string(),
            })?;
        let model = client.completion_model(&self.model);

        let mut builder = model
            .completion_request(rig::completion::Message::user(request.prompt))
            .preamble(request.system_role)
            .temperature(request.temperature)
            .max_tokens(request.max_output as u64);
        if request.structured {
            builder =
                builder.additional_params(json!({"response_format": {"type": "json_object"}}));
        }
        let completion_request = builder.build();

        let response = tokio::time::timeout(self.timeout, model.completion(completion_request))
            .await
            .map_err(|_| SynthesisError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| SynthesisError::Provider {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let text: String = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }
}
