//! Domain records for the versioned-content subsystem.
//!
//! These are serde-friendly shapes shared by every persistence backend and by
//! the pipelines that produce them. Backends convert to and from their own
//! row representations; nothing here performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived length of a chapter's content.
///
/// Counted in `char`s rather than whitespace-delimited words: the service
/// targets CJK prose where each character is a "word" for quota purposes.
/// Must be recomputed on every content write, never lazily at read time.
pub fn word_count(content: &str) -> i64 {
    content.chars().count() as i64
}

/// Category a generated lore entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoreCategory {
    Character,
    Realm,
    Item,
}

impl LoreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoreCategory::Character => "character",
            LoreCategory::Realm => "realm",
            LoreCategory::Item => "item",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "character" => Some(LoreCategory::Character),
            "realm" => Some(LoreCategory::Realm),
            "item" => Some(LoreCategory::Item),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted lore entry (character, realm, or item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreItem {
    pub id: i64,
    pub project_id: i64,
    pub category: LoreCategory,
    pub name: String,
    pub description: String,
    pub content: String,
    /// Marks entries produced by a synthesis pipeline rather than the author.
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable lore entry, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoreItem {
    pub category: LoreCategory,
    pub name: String,
    pub description: String,
    pub content: String,
    pub ai_generated: bool,
}

/// Lifecycle tag of an outline document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineStatus {
    Generated,
    Approved,
}

impl OutlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlineStatus::Generated => "generated",
            OutlineStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generated" => Some(OutlineStatus::Generated),
            "approved" => Some(OutlineStatus::Approved),
            _ => None,
        }
    }
}

/// One chapter stub inside an outline volume: a title and a working summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterStub {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Explicit ordering from the wire shape; sequence position rules when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_no: Option<u32>,
}

/// One planned volume: a title plus its ordered chapter stubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeOutline {
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<ChapterStub>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_no: Option<u32>,
}

/// The structured content tree of an outline document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineContent {
    #[serde(default)]
    pub volumes: Vec<VolumeOutline>,
}

/// The outline document owned 1:1 by a project.
///
/// `version` starts at 1 and increases by exactly 1 on every successful
/// content replacement; a replacement is only accepted when the caller's
/// expected version matches the stored one at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub content: OutlineContent,
    pub status: OutlineStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A live chapter with its mutable content and derived word count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub content: String,
    pub word_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Who initiated a snapshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotType {
    /// Explicit user action.
    Manual,
    /// System-initiated capture, e.g. before an AI rewrite or rollback.
    Auto,
}

impl SnapshotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotType::Manual => "manual",
            SnapshotType::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(SnapshotType::Manual),
            "auto" => Some(SnapshotType::Auto),
            _ => None,
        }
    }
}

/// An immutable point-in-time copy of a chapter's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSnapshot {
    pub id: i64,
    pub chapter_id: i64,
    pub content: String,
    pub word_count: i64,
    pub snapshot_type: SnapshotType,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}
