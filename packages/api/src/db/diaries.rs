//! PostgreSQL-backed diary store.
//!
//! Ids cross the API as strings; an id that is not a valid UUID can never match
//! a row and is treated as not found.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use store::{DiaryDraft, DiaryEntry, DiaryStore, StoreError};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct DiaryRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    analysis: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DiaryRow> for DiaryEntry {
    fn from(row: DiaryRow) -> Self {
        DiaryEntry {
            id: row.id.to_string(),
            user_id: row.user_id.to_string(),
            title: row.title,
            content: row.content,
            analysis: row.analysis,
            category: row.category,
            tags: row.tags,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    tracing::error!("Diary query failed: {}", e);
    StoreError::Backend(e.to_string())
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

fn require_id(id: &str) -> Result<Uuid, StoreError> {
    parse_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
}

/// Diary entries in the `diaries` table.
#[derive(Debug, Clone)]
pub struct PgDiaryStore {
    pool: PgPool,
}

impl PgDiaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DiaryStore for PgDiaryStore {
    async fn insert(&self, user_id: &str, draft: DiaryDraft) -> Result<DiaryEntry, StoreError> {
        let user_uuid = Uuid::parse_str(user_id).map_err(|e| StoreError::Backend(e.to_string()))?;

        let row: DiaryRow = sqlx::query_as(
            "INSERT INTO diaries (user_id, title, content, category, tags)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(user_uuid)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        draft: DiaryDraft,
    ) -> Result<DiaryEntry, StoreError> {
        let (Some(user_uuid), Some(diary_id)) = (parse_id(user_id), parse_id(id)) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let row: Option<DiaryRow> = sqlx::query_as(
            "UPDATE diaries SET
                title = $3,
                content = $4,
                category = $5,
                tags = $6,
                updated_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING *",
        )
        .bind(diary_id)
        .bind(user_uuid)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(&draft.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Into::into)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<DiaryEntry>, StoreError> {
        let (Some(user_uuid), Some(diary_id)) = (parse_id(user_id), parse_id(id)) else {
            return Ok(None);
        };

        let row: Option<DiaryRow> = sqlx::query_as(
            "SELECT * FROM diaries WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(diary_id)
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Into::into))
    }

    async fn list_active(&self, user_id: &str) -> Result<Vec<DiaryEntry>, StoreError> {
        let Some(user_uuid) = parse_id(user_id) else {
            return Ok(Vec::new());
        };

        let rows: Vec<DiaryRow> = sqlx::query_as(
            "SELECT * FROM diaries
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC",
        )
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn soft_delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let (Some(user_uuid), Some(diary_id)) = (parse_id(user_id), parse_id(id)) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let result = sqlx::query(
            "UPDATE diaries SET deleted_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(diary_id)
        .bind(user_uuid)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_analysis(&self, id: &str, analysis: &str) -> Result<(), StoreError> {
        let diary_id = require_id(id)?;

        let result = sqlx::query("UPDATE diaries SET analysis = $2 WHERE id = $1")
            .bind(diary_id)
            .bind(analysis)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_tags(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let Some(user_uuid) = parse_id(user_id) else {
            return Ok(Vec::new());
        };

        sqlx::query_scalar(
            "SELECT DISTINCT tag FROM diaries, unnest(tags) AS tag
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY tag",
        )
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_converts_ids_to_strings() {
        let now = Utc::now();
        let row = DiaryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "晨跑".into(),
            content: "五公里".into(),
            analysis: None,
            category: Some("复盘".into()),
            tags: vec!["跑步".into()],
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let id = row.id.to_string();
        let entry: DiaryEntry = row.into();
        assert_eq!(entry.id, id);
        assert_eq!(entry.tags, vec!["跑步"]);
        assert!(!entry.is_deleted());
    }

    #[test]
    fn test_invalid_ids_are_not_found() {
        assert!(parse_id("not-a-uuid").is_none());
        assert_eq!(
            require_id("nope"),
            Err(StoreError::NotFound("nope".to_string()))
        );
    }
}
