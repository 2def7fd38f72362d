/*!
SQLite Document Store

Async [`DocumentStore`] implementation backed by an `sqlx` SQLite pool.

## Behavior

- The outline compare-and-swap runs as a single conditional `UPDATE`
  (`... WHERE project_id = ? AND version = ?`) inside a transaction; a zero
  row count is resolved into `NotFound` or `VersionConflict` without ever
  writing.
- Snapshot capture and rollback each read and write inside one transaction,
  so concurrent chapter writes cannot interleave with a capture.
- Chapter deletion cascades to snapshots with explicit statements rather than
  relying on the connection's foreign-key pragma.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) are executed on connect;
  disabling the feature assumes external migration orchestration.

Pure data shapes live in `store::models`; this module is database I/O only.
*/

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::instrument;

use super::models::{
    Chapter, ChapterSnapshot, LoreItem, NewLoreItem, Outline, OutlineContent, OutlineStatus,
    SnapshotType, word_count,
};
use super::{DocumentStore, Result, StoreError};

/// SQLite-backed document store.
pub struct SqliteStore {
    /// Shared pool for concurrent document operations.
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish()
    }
}

fn backend(context: &str, err: sqlx::Error) -> StoreError {
    StoreError::Backend {
        message: format!("{context}: {err}"),
    }
}

fn outline_from_row(row: &SqliteRow) -> Result<Outline> {
    let content_json: String = row
        .try_get("content")
        .map_err(|e| backend("outline content read", e))?;
    let content: OutlineContent = serde_json::from_str(&content_json)?;
    let status_raw: String = row
        .try_get("status")
        .map_err(|e| backend("outline status read", e))?;
    let status = OutlineStatus::parse(&status_raw).ok_or_else(|| StoreError::Backend {
        message: format!("unknown outline status: {status_raw}"),
    })?;
    Ok(Outline {
        id: row.try_get("id").map_err(|e| backend("outline id read", e))?,
        project_id: row
            .try_get("project_id")
            .map_err(|e| backend("outline project_id read", e))?,
        title: row
            .try_get("title")
            .map_err(|e| backend("outline title read", e))?,
        content,
        status,
        version: row
            .try_get("version")
            .map_err(|e| backend("outline version read", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| backend("outline created_at read", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| backend("outline updated_at read", e))?,
    })
}

fn chapter_from_row(row: &SqliteRow) -> Result<Chapter> {
    Ok(Chapter {
        id: row.try_get("id").map_err(|e| backend("chapter id read", e))?,
        project_id: row
            .try_get("project_id")
            .map_err(|e| backend("chapter project_id read", e))?,
        title: row
            .try_get("title")
            .map_err(|e| backend("chapter title read", e))?,
        content: row
            .try_get("content")
            .map_err(|e| backend("chapter content read", e))?,
        word_count: row
            .try_get("word_count")
            .map_err(|e| backend("chapter word_count read", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| backend("chapter created_at read", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| backend("chapter updated_at read", e))?,
    })
}

fn snapshot_from_row(row: &SqliteRow) -> Result<ChapterSnapshot> {
    let type_raw: String = row
        .try_get("snapshot_type")
        .map_err(|e| backend("snapshot type read", e))?;
    let snapshot_type = SnapshotType::parse(&type_raw).ok_or_else(|| StoreError::Backend {
        message: format!("unknown snapshot type: {type_raw}"),
    })?;
    Ok(ChapterSnapshot {
        id: row
            .try_get("id")
            .map_err(|e| backend("snapshot id read", e))?,
        chapter_id: row
            .try_get("chapter_id")
            .map_err(|e| backend("snapshot chapter_id read", e))?,
        content: row
            .try_get("content")
            .map_err(|e| backend("snapshot content read", e))?,
        word_count: row
            .try_get("word_count")
            .map_err(|e| backend("snapshot word_count read", e))?,
        snapshot_type,
        label: row
            .try_get("label")
            .map_err(|e| backend("snapshot label read", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| backend("snapshot created_at read", e))?,
    })
}

fn lore_from_row(row: &SqliteRow) -> Result<LoreItem> {
    let category_raw: String = row
        .try_get("category")
        .map_err(|e| backend("lore category read", e))?;
    let category =
        super::models::LoreCategory::parse(&category_raw).ok_or_else(|| StoreError::Backend {
            message: format!("unknown lore category: {category_raw}"),
        })?;
    Ok(LoreItem {
        id: row.try_get("id").map_err(|e| backend("lore id read", e))?,
        project_id: row
            .try_get("project_id")
            .map_err(|e| backend("lore project_id read", e))?,
        category,
        name: row
            .try_get("name")
            .map_err(|e| backend("lore name read", e))?,
        description: row
            .try_get("description")
            .map_err(|e| backend("lore description read", e))?,
        content: row
            .try_get("content")
            .map_err(|e| backend("lore content read", e))?,
        ai_generated: row
            .try_get("ai_generated")
            .map_err(|e| backend("lore ai_generated read", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| backend("lore created_at read", e))?,
    })
}

impl SqliteStore {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: "sqlite://storyloom.db?mode=rwc"
    #[must_use = "store must be used to persist documents"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| backend("connect", e))?;
        // Run embedded migrations only if the feature is enabled (idempotent).
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(StoreError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        #[cfg(not(feature = "sqlite-migrations"))]
        {
            // Feature disabled: assume external migration orchestration already applied schema.
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Wrap an existing pool. The schema must already be in place.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_outline(&self, project_id: i64) -> Result<Option<Outline>> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, content, status, version, created_at, updated_at
            FROM outlines
            WHERE project_id = ?1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| backend("select outline", e))?;
        row.as_ref().map(outline_from_row).transpose()
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    #[instrument(skip(self, items), err)]
    async fn insert_lore_batch(
        &self,
        project_id: i64,
        items: Vec<NewLoreItem>,
    ) -> Result<Vec<LoreItem>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO lore_items (project_id, category, name, description, content, ai_generated, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(project_id)
            .bind(item.category.as_str())
            .bind(&item.name)
            .bind(&item.description)
            .bind(&item.content)
            .bind(item.ai_generated)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend("insert lore item", e))?;
            inserted.push(LoreItem {
                id: result.last_insert_rowid(),
                project_id,
                category: item.category,
                name: item.name,
                description: item.description,
                content: item.content,
                ai_generated: item.ai_generated,
                created_at: now,
            });
        }

        tx.commit().await.map_err(|e| backend("tx commit", e))?;
        Ok(inserted)
    }

    async fn lore_for_project(&self, project_id: i64) -> Result<Vec<LoreItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, category, name, description, content, ai_generated, created_at
            FROM lore_items
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| backend("select lore", e))?;
        rows.iter().map(lore_from_row).collect()
    }

    async fn outline_for_project(&self, project_id: i64) -> Result<Option<Outline>> {
        self.fetch_outline(project_id).await
    }

    #[instrument(skip(self, title, content), err)]
    async fn put_outline(
        &self,
        project_id: i64,
        title: &str,
        content: OutlineContent,
        status: OutlineStatus,
    ) -> Result<Outline> {
        let content_json = serde_json::to_string(&content)?;
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE outlines
            SET content = ?1, status = ?2, version = version + 1, updated_at = ?3
            WHERE project_id = ?4
            "#,
        )
        .bind(&content_json)
        .bind(status.as_str())
        .bind(now)
        .bind(project_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend("replace outline", e))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO outlines (project_id, title, content, status, version, created_at)
                VALUES (?1, ?2, ?3, ?4, 1, ?5)
                "#,
            )
            .bind(project_id)
            .bind(title)
            .bind(&content_json)
            .bind(status.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend("insert outline", e))?;
        }

        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, content, status, version, created_at, updated_at
            FROM outlines
            WHERE project_id = ?1
            "#,
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| backend("reselect outline", e))?;
        let outline = outline_from_row(&row)?;

        tx.commit().await.map_err(|e| backend("tx commit", e))?;
        Ok(outline)
    }

    #[instrument(skip(self, content), err)]
    async fn replace_outline_content(
        &self,
        project_id: i64,
        expected_version: i64,
        content: OutlineContent,
    ) -> Result<Outline> {
        let content_json = serde_json::to_string(&content)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        // The version check and increment are one statement; concurrent
        // writers race on rows_affected, never on a read-then-write gap.
        let updated = sqlx::query(
            r#"
            UPDATE outlines
            SET content = ?1, version = version + 1, updated_at = ?2
            WHERE project_id = ?3 AND version = ?4
            "#,
        )
        .bind(&content_json)
        .bind(Utc::now())
        .bind(project_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend("cas outline", e))?;

        if updated.rows_affected() == 0 {
            let stored: Option<i64> =
                sqlx::query_scalar("SELECT version FROM outlines WHERE project_id = ?1")
                    .bind(project_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| backend("select outline version", e))?;
            return Err(match stored {
                None => StoreError::NotFound { what: "outline" },
                Some(stored) => StoreError::VersionConflict {
                    expected: expected_version,
                    stored,
                },
            });
        }

        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, content, status, version, created_at, updated_at
            FROM outlines
            WHERE project_id = ?1
            "#,
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| backend("reselect outline", e))?;
        let outline = outline_from_row(&row)?;

        tx.commit().await.map_err(|e| backend("tx commit", e))?;
        Ok(outline)
    }

    async fn create_chapter(
        &self,
        project_id: i64,
        title: &str,
        content: &str,
    ) -> Result<Chapter> {
        let now = Utc::now();
        let count = word_count(content);
        let result = sqlx::query(
            r#"
            INSERT INTO chapters (project_id, title, content, word_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(project_id)
        .bind(title)
        .bind(content)
        .bind(count)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| backend("insert chapter", e))?;
        Ok(Chapter {
            id: result.last_insert_rowid(),
            project_id,
            title: title.to_string(),
            content: content.to_string(),
            word_count: count,
            created_at: now,
            updated_at: None,
        })
    }

    async fn chapter(&self, chapter_id: i64) -> Result<Option<Chapter>> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, content, word_count, created_at, updated_at
            FROM chapters
            WHERE id = ?1
            "#,
        )
        .bind(chapter_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| backend("select chapter", e))?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    #[instrument(skip(self, content), err)]
    async fn update_chapter_content(&self, chapter_id: i64, content: &str) -> Result<Chapter> {
        let updated = sqlx::query(
            r#"
            UPDATE chapters
            SET content = ?1, word_count = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(content)
        .bind(word_count(content))
        .bind(Utc::now())
        .bind(chapter_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| backend("update chapter", e))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound { what: "chapter" });
        }
        self.chapter(chapter_id)
            .await?
            .ok_or(StoreError::NotFound { what: "chapter" })
    }

    #[instrument(skip(self), err)]
    async fn delete_chapter(&self, chapter_id: i64) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        sqlx::query("DELETE FROM chapter_snapshots WHERE chapter_id = ?1")
            .bind(chapter_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend("cascade snapshots", e))?;
        let deleted = sqlx::query("DELETE FROM chapters WHERE id = ?1")
            .bind(chapter_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend("delete chapter", e))?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound { what: "chapter" });
        }

        tx.commit().await.map_err(|e| backend("tx commit", e))
    }

    #[instrument(skip(self, label), err)]
    async fn create_snapshot(
        &self,
        chapter_id: i64,
        snapshot_type: SnapshotType,
        label: Option<&str>,
    ) -> Result<ChapterSnapshot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        let live = sqlx::query("SELECT content, word_count FROM chapters WHERE id = ?1")
            .bind(chapter_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| backend("select chapter", e))?
            .ok_or(StoreError::NotFound { what: "chapter" })?;
        let content: String = live
            .try_get("content")
            .map_err(|e| backend("chapter content read", e))?;
        let captured_count: i64 = live
            .try_get("word_count")
            .map_err(|e| backend("chapter word_count read", e))?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chapter_snapshots (chapter_id, content, word_count, snapshot_type, label, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(chapter_id)
        .bind(&content)
        .bind(captured_count)
        .bind(snapshot_type.as_str())
        .bind(label)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend("insert snapshot", e))?;

        tx.commit().await.map_err(|e| backend("tx commit", e))?;
        Ok(ChapterSnapshot {
            id: result.last_insert_rowid(),
            chapter_id,
            content,
            word_count: captured_count,
            snapshot_type,
            label: label.map(str::to_string),
            created_at: now,
        })
    }

    async fn snapshots_for_chapter(&self, chapter_id: i64) -> Result<Vec<ChapterSnapshot>> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM chapters WHERE id = ?1")
            .bind(chapter_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| backend("select chapter", e))?;
        if exists.is_none() {
            return Err(StoreError::NotFound { what: "chapter" });
        }

        let rows = sqlx::query(
            r#"
            SELECT id, chapter_id, content, word_count, snapshot_type, label, created_at
            FROM chapter_snapshots
            WHERE chapter_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(chapter_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| backend("select snapshots", e))?;
        rows.iter().map(snapshot_from_row).collect()
    }

    async fn snapshot(&self, snapshot_id: i64) -> Result<Option<ChapterSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT id, chapter_id, content, word_count, snapshot_type, label, created_at
            FROM chapter_snapshots
            WHERE id = ?1
            "#,
        )
        .bind(snapshot_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| backend("select snapshot", e))?;
        row.as_ref().map(snapshot_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn rollback_snapshot(&self, snapshot_id: i64) -> Result<Chapter> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("tx begin", e))?;

        let snapshot = sqlx::query(
            "SELECT chapter_id, content, word_count FROM chapter_snapshots WHERE id = ?1",
        )
        .bind(snapshot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend("select snapshot", e))?
        .ok_or(StoreError::NotFound { what: "snapshot" })?;
        let chapter_id: i64 = snapshot
            .try_get("chapter_id")
            .map_err(|e| backend("snapshot chapter_id read", e))?;
        let content: String = snapshot
            .try_get("content")
            .map_err(|e| backend("snapshot content read", e))?;
        let captured_count: i64 = snapshot
            .try_get("word_count")
            .map_err(|e| backend("snapshot word_count read", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE chapters
            SET content = ?1, word_count = ?2, updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(&content)
        .bind(captured_count)
        .bind(Utc::now())
        .bind(chapter_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend("restore chapter", e))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound { what: "chapter" });
        }

        let row = sqlx::query(
            r#"
            SELECT id, project_id, title, content, word_count, created_at, updated_at
            FROM chapters
            WHERE id = ?1
            "#,
        )
        .bind(chapter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| backend("reselect chapter", e))?;
        let chapter = chapter_from_row(&row)?;

        tx.commit().await.map_err(|e| backend("tx commit", e))?;
        Ok(chapter)
    }

    #[instrument(skip(self), err)]
    async fn delete_snapshot(&self, snapshot_id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM chapter_snapshots WHERE id = ?1")
            .bind(snapshot_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| backend("delete snapshot", e))?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound { what: "snapshot" });
        }
        Ok(())
    }
}
