//! Guarded outline updates.
//!
//! The outline is shared between terminals; an edit only lands if the editor
//! saw the current version. No merge is attempted on conflict — the caller
//! refetches, shows the latest version, and retries.

use serde_json::Value;
use tracing::instrument;

use crate::store::models::{Outline, OutlineContent};
use crate::store::DocumentStore;

use super::DocumentError;

/// Replace the outline's content if `expected_version` still matches.
///
/// The raw value is validated and decoded before any store call, so a
/// malformed tree is rejected without a write. On version mismatch the
/// store's conflict error carries the stored version for the caller to
/// surface.
#[instrument(skip(store, content), fields(project = project_id, expected = expected_version))]
pub async fn apply_update(
    store: &dyn DocumentStore,
    project_id: i64,
    expected_version: i64,
    content: Value,
) -> Result<Outline, DocumentError> {
    let content = decode_content(content)?;
    Ok(store
        .replace_outline_content(project_id, expected_version, content)
        .await?)
}

/// Decode a wire-shape content tree into the typed outline content.
pub fn decode_content(value: Value) -> Result<OutlineContent, DocumentError> {
    let volumes = value
        .get("volumes")
        .ok_or_else(|| DocumentError::Validation {
            detail: "missing \"volumes\"".to_string(),
        })?;
    if !volumes.is_array() {
        return Err(DocumentError::Validation {
            detail: "\"volumes\" must be a list".to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| DocumentError::Validation {
        detail: e.to_string(),
    })
}
