//! Chapter snapshot service: capture, inspect, roll back.
//!
//! Snapshots are immutable once created; rolling back copies a snapshot's
//! captured content and word count onto the live chapter and never touches
//! the history itself. Whether a rollback first protects the current state
//! with an `auto` snapshot is the caller's policy, expressed through
//! [`RollbackOptions`].

use std::sync::Arc;

use tracing::instrument;

use crate::store::models::{Chapter, ChapterSnapshot, SnapshotType};
use crate::store::{DocumentStore, StoreError};

use super::DocumentError;

/// Label stamped on automatic pre-rollback captures.
const PRE_ROLLBACK_LABEL: &str = "pre-rollback";

/// Per-call rollback policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    safety_snapshot: bool,
}

impl RollbackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the chapter's pre-rollback state as an `auto` snapshot before
    /// restoring. Off by default.
    #[must_use]
    pub fn with_safety_snapshot(mut self) -> Self {
        self.safety_snapshot = true;
        self
    }
}

/// Snapshot operations over an injected store.
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn DocumentStore>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Capture the chapter's current content as a `manual` snapshot.
    #[instrument(skip(self, label), fields(chapter = chapter_id))]
    pub async fn create_manual(
        &self,
        chapter_id: i64,
        label: Option<&str>,
    ) -> Result<ChapterSnapshot, DocumentError> {
        Ok(self
            .store
            .create_snapshot(chapter_id, SnapshotType::Manual, label)
            .await?)
    }

    /// All snapshots of a chapter, newest first.
    pub async fn list(&self, chapter_id: i64) -> Result<Vec<ChapterSnapshot>, DocumentError> {
        Ok(self.store.snapshots_for_chapter(chapter_id).await?)
    }

    /// One snapshot with its full captured content.
    pub async fn get(&self, snapshot_id: i64) -> Result<ChapterSnapshot, DocumentError> {
        Ok(self
            .store
            .snapshot(snapshot_id)
            .await?
            .ok_or(StoreError::NotFound { what: "snapshot" })?)
    }

    /// Restore the snapshot's captured content onto its chapter.
    ///
    /// Idempotent in content: rolling back twice to the same snapshot yields
    /// the same chapter content and word count.
    #[instrument(skip(self, options), fields(snapshot = snapshot_id))]
    pub async fn rollback(
        &self,
        snapshot_id: i64,
        options: RollbackOptions,
    ) -> Result<Chapter, DocumentError> {
        if options.safety_snapshot {
            let snapshot = self
                .store
                .snapshot(snapshot_id)
                .await?
                .ok_or(StoreError::NotFound { what: "snapshot" })?;
            self.store
                .create_snapshot(
                    snapshot.chapter_id,
                    SnapshotType::Auto,
                    Some(PRE_ROLLBACK_LABEL),
                )
                .await?;
        }
        Ok(self.store.rollback_snapshot(snapshot_id).await?)
    }

    /// Remove one history entry. The live chapter is untouched.
    pub async fn delete(&self, snapshot_id: i64) -> Result<(), DocumentError> {
        Ok(self.store.delete_snapshot(snapshot_id).await?)
    }
}
