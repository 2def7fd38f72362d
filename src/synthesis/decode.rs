//! Defensive decoding of structured synthesizer responses.
//!
//! Providers asked for JSON still return it in more than one shape; the
//! decoders here absorb that tolerance so the pipelines never see it. A
//! response that fits none of the accepted shapes is a [`DecodeError`],
//! which the pipelines treat as an ordinary phase failure — never a crash.

use serde::Deserialize;
use serde_json::Value;

use miette::Diagnostic;
use thiserror::Error;

use crate::store::models::VolumeOutline;

/// Failures turning raw response text into typed phase output.
#[derive(Debug, Error, Diagnostic)]
pub enum DecodeError {
    #[error("response is not valid JSON: {source}")]
    #[diagnostic(code(storyloom::decode::json))]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("response missing expected key \"{key}\"")]
    #[diagnostic(code(storyloom::decode::missing_key))]
    MissingKey { key: &'static str },

    #[error("response shape not recognized: {detail}")]
    #[diagnostic(code(storyloom::decode::shape))]
    Shape { detail: String },
}

/// One generated entity before persistence assigns identity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
}

/// A keyed list of entities, e.g. `{"characters": [{...}, {...}]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBatch(pub Vec<EntityDraft>);

impl EntityBatch {
    /// Parse `{"<key>": [{name, description, content}, ...]}`.
    pub fn decode(text: &str, key: &'static str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let items = value.get(key).ok_or(DecodeError::MissingKey { key })?;
        let drafts: Vec<EntityDraft> = serde_json::from_value(items.clone())?;
        Ok(Self(drafts))
    }
}

/// Decoder for a single outline volume.
pub struct VolumePayload;

impl VolumePayload {
    /// Accepts `{"volume": {...}}` or `{"volumes": [{...}, ...]}` — the
    /// wrapped-list shape is unwrapped to its first element and treated as
    /// equivalent.
    pub fn decode(text: &str) -> Result<VolumeOutline, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let node = match value.get("volume") {
            Some(node) if !node.is_null() => node.clone(),
            _ => value
                .get("volumes")
                .and_then(Value::as_array)
                .and_then(|list| list.first())
                .cloned()
                .ok_or_else(|| DecodeError::Shape {
                    detail: "expected a \"volume\" object or a non-empty \"volumes\" list"
                        .to_string(),
                })?,
        };
        Ok(serde_json::from_value(node)?)
    }
}
