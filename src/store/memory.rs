//! Volatile in-memory [`DocumentStore`] for testing and development.
//!
//! One mutex guards every table, which makes each operation trivially
//! transactional: the outline compare-and-swap, snapshot capture, and cascade
//! delete all happen under a single critical section.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::models::{
    Chapter, ChapterSnapshot, LoreItem, NewLoreItem, Outline, OutlineContent, OutlineStatus,
    SnapshotType, word_count,
};
use super::{DocumentStore, Result, StoreError};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    lore: Vec<LoreItem>,
    /// Keyed by project id — the outline is 1:1 with its project.
    outlines: FxHashMap<i64, Outline>,
    chapters: FxHashMap<i64, Chapter>,
    snapshots: FxHashMap<i64, ChapterSnapshot>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_lore_batch(
        &self,
        project_id: i64,
        items: Vec<NewLoreItem>,
    ) -> Result<Vec<LoreItem>> {
        let mut tables = self.tables.lock();
        let inserted: Vec<LoreItem> = items
            .into_iter()
            .map(|item| LoreItem {
                id: tables.allocate_id(),
                project_id,
                category: item.category,
                name: item.name,
                description: item.description,
                content: item.content,
                ai_generated: item.ai_generated,
                created_at: Utc::now(),
            })
            .collect();
        tables.lore.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn lore_for_project(&self, project_id: i64) -> Result<Vec<LoreItem>> {
        let tables = self.tables.lock();
        Ok(tables
            .lore
            .iter()
            .filter(|item| item.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn outline_for_project(&self, project_id: i64) -> Result<Option<Outline>> {
        Ok(self.tables.lock().outlines.get(&project_id).cloned())
    }

    async fn put_outline(
        &self,
        project_id: i64,
        title: &str,
        content: OutlineContent,
        status: OutlineStatus,
    ) -> Result<Outline> {
        let mut tables = self.tables.lock();
        match tables.outlines.get_mut(&project_id) {
            Some(outline) => {
                outline.content = content;
                outline.status = status;
                outline.version += 1;
                outline.updated_at = Some(Utc::now());
                Ok(outline.clone())
            }
            None => {
                let outline = Outline {
                    id: tables.allocate_id(),
                    project_id,
                    title: title.to_string(),
                    content,
                    status,
                    version: 1,
                    created_at: Utc::now(),
                    updated_at: None,
                };
                tables.outlines.insert(project_id, outline.clone());
                Ok(outline)
            }
        }
    }

    async fn replace_outline_content(
        &self,
        project_id: i64,
        expected_version: i64,
        content: OutlineContent,
    ) -> Result<Outline> {
        let mut tables = self.tables.lock();
        let outline = tables
            .outlines
            .get_mut(&project_id)
            .ok_or(StoreError::NotFound { what: "outline" })?;
        if outline.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                stored: outline.version,
            });
        }
        outline.content = content;
        outline.version += 1;
        outline.updated_at = Some(Utc::now());
        Ok(outline.clone())
    }

    async fn create_chapter(
        &self,
        project_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Chapter> {
        let mut tables = self.tables.lock();
        let chapter = Chapter {
            id: tables.allocate_id(),
            project_id,
            title: title.to_string(),
            content: content.to_string(),
            word_count: word_count(content),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.chapters.insert(chapter.id, chapter.clone());
        Ok(chapter)
    }

    async fn chapter(&self, chapter_id: i64) -> Result<Option<Chapter>> {
        Ok(self.tables.lock().chapters.get(&chapter_id).cloned())
    }

    async fn update_chapter_content(&self, chapter_id: i64, content: &str) -> Result<Chapter> {
        let mut tables = self.tables.lock();
        let chapter = tables
            .chapters
            .get_mut(&chapter_id)
            .ok_or(StoreError::NotFound { what: "chapter" })?;
        chapter.content = content.to_string();
        chapter.word_count = word_count(content);
        chapter.updated_at = Some(Utc::now());
        Ok(chapter.clone())
    }

    async fn delete_chapter(&self, chapter_id: i64) -> Result<()> {
        let mut tables = self.tables.lock();
        if tables.chapters.remove(&chapter_id).is_none() {
            return Err(StoreError::NotFound { what: "chapter" });
        }
        tables
            .snapshots
            .retain(|_, snapshot| snapshot.chapter_id != chapter_id);
        Ok(())
    }

    async fn create_snapshot(
        &self,
        chapter_id: i64,
        snapshot_type: SnapshotType,
        label: Option<&str>,
    ) -> Result<ChapterSnapshot> {
        let mut tables = self.tables.lock();
        let (content, captured_count) = {
            let chapter = tables
                .chapters
                .get(&chapter_id)
                .ok_or(StoreError::NotFound { what: "chapter" })?;
            (chapter.content.clone(), chapter.word_count)
        };
        let snapshot = ChapterSnapshot {
            id: tables.allocate_id(),
            chapter_id,
            content,
            word_count: captured_count,
            snapshot_type,
            label: label.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    async fn snapshots_for_chapter(&self, chapter_id: i64) -> Result<Vec<ChapterSnapshot>> {
        let tables = self.tables.lock();
        if !tables.chapters.contains_key(&chapter_id) {
            return Err(StoreError::NotFound { what: "chapter" });
        }
        let mut snapshots: Vec<ChapterSnapshot> = tables
            .snapshots
            .values()
            .filter(|snapshot| snapshot.chapter_id == chapter_id)
            .cloned()
            .collect();
        // Ids are allocated monotonically, so they break created_at ties.
        snapshots.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(snapshots)
    }

    async fn snapshot(&self, snapshot_id: i64) -> Result<Option<ChapterSnapshot>> {
        Ok(self.tables.lock().snapshots.get(&snapshot_id).cloned())
    }

    async fn rollback_snapshot(&self, snapshot_id: i64) -> Result<Chapter> {
        let mut tables = self.tables.lock();
        let (chapter_id, content, captured_count) = {
            let snapshot = tables
                .snapshots
                .get(&snapshot_id)
                .ok_or(StoreError::NotFound { what: "snapshot" })?;
            (
                snapshot.chapter_id,
                snapshot.content.clone(),
                snapshot.word_count,
            )
        };
        let chapter = tables
            .chapters
            .get_mut(&chapter_id)
            .ok_or(StoreError::NotFound { what: "chapter" })?;
        chapter.content = content;
        chapter.word_count = captured_count;
        chapter.updated_at = Some(Utc::now());
        Ok(chapter.clone())
    }

    async fn delete_snapshot(&self, snapshot_id: i64) -> Result<()> {
        let mut tables = self.tables.lock();
        tables
            .snapshots
            .remove(&snapshot_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { what: "snapshot" })
    }
}
