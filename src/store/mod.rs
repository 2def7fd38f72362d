//! Persistence collaborator interface for the versioned-content subsystem.
//!
//! The core never talks to a database directly; it consumes the
//! [`DocumentStore`] trait. Two backends are provided:
//!
//! - [`MemoryStore`] — volatile, single-mutex tables for tests and development
//! - `SqliteStore` — durable sqlx-backed storage (behind the `sqlite` feature)
//!
//! Both backends guarantee the same transactional contracts: the outline
//! version check-and-increment is atomic with respect to concurrent writers,
//! and snapshot capture/rollback never observes a half-written chapter.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub mod memory;
pub mod models;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
pub use models::{
    Chapter, ChapterSnapshot, ChapterStub, LoreCategory, LoreItem, NewLoreItem, Outline,
    OutlineContent, OutlineStatus, SnapshotType, VolumeOutline, word_count,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Errors surfaced by any [`DocumentStore`] backend.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("{what} not found")]
    #[diagnostic(code(storyloom::store::not_found))]
    NotFound { what: &'static str },

    #[error("stale outline version: expected {expected}, stored {stored}")]
    #[diagnostic(
        code(storyloom::store::version_conflict),
        help("The outline was modified elsewhere. Refetch it and retry with the current version.")
    )]
    VersionConflict { expected: i64, stored: i64 },

    #[error("backend error: {message}")]
    #[diagnostic(code(storyloom::store::backend))]
    Backend { message: String },

    #[error("serialization failed: {source}")]
    #[diagnostic(code(storyloom::store::serde))]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Transactional storage for outlines, lore items, chapters, and snapshots.
///
/// Integer ids are store-assigned. Ownership scoping (which caller may touch
/// which project) is the surrounding system's responsibility; the store only
/// scopes queries by the ids it is handed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a batch of lore entries in a single transaction.
    ///
    /// All-or-nothing: a failure writes none of the batch. This is the unit
    /// of durability for one pipeline phase.
    async fn insert_lore_batch(
        &self,
        project_id: i64,
        items: Vec<NewLoreItem>,
    ) -> Result<Vec<LoreItem>>;

    /// All lore entries for a project, oldest first.
    async fn lore_for_project(&self, project_id: i64) -> Result<Vec<LoreItem>>;

    /// The project's outline, if one exists.
    async fn outline_for_project(&self, project_id: i64) -> Result<Option<Outline>>;

    /// Create the project's outline, or replace its content wholesale.
    ///
    /// Replacing bumps `version` by 1 like any other content replacement;
    /// creation starts at version 1. The stored title is kept on replacement
    /// (the caller's title only seeds new documents).
    async fn put_outline(
        &self,
        project_id: i64,
        title: &str,
        content: OutlineContent,
        status: OutlineStatus,
    ) -> Result<Outline>;

    /// Compare-and-swap outline content.
    ///
    /// Atomically verifies `expected_version` against the stored version and,
    /// on match, replaces the content and increments the version by 1.
    /// Returns [`StoreError::VersionConflict`] (and writes nothing) when the
    /// stored version differs.
    async fn replace_outline_content(
        &self,
        project_id: i64,
        expected_version: i64,
        content: OutlineContent,
    ) -> Result<Outline>;

    async fn create_chapter(
        &self,
        project_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Chapter>;

    async fn chapter(&self, chapter_id: i64) -> Result<Option<Chapter>>;

    /// Overwrite a chapter's content, recomputing the derived word count.
    async fn update_chapter_content(&self, chapter_id: i64, content: &str) -> Result<Chapter>;

    /// Delete a chapter and, by cascade, all of its snapshots.
    async fn delete_chapter(&self, chapter_id: i64) -> Result<()>;

    /// Capture the chapter's current content and word count as a snapshot.
    ///
    /// The capture reads and writes inside one transaction, so a concurrent
    /// content overwrite can never produce a snapshot of mixed state.
    async fn create_snapshot(
        &self,
        chapter_id: i64,
        snapshot_type: SnapshotType,
        label: Option<&str>,
    ) -> Result<ChapterSnapshot>;

    /// All snapshots of a chapter, newest first.
    async fn snapshots_for_chapter(&self, chapter_id: i64) -> Result<Vec<ChapterSnapshot>>;

    async fn snapshot(&self, snapshot_id: i64) -> Result<Option<ChapterSnapshot>>;

    /// Copy a snapshot's captured content and word count back onto the live
    /// chapter. The snapshot itself is never mutated or deleted.
    async fn rollback_snapshot(&self, snapshot_id: i64) -> Result<Chapter>;

    async fn delete_snapshot(&self, snapshot_id: i64) -> Result<()>;
}
