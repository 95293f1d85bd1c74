use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::journal::{DiaryStore, StoreError};
use crate::models::{DiaryDraft, DiaryEntry};

/// In-memory DiaryStore for testing and local development without a database.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, DiaryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, including soft-deleted ones.
    #[cfg(test)]
    fn all_entries(&self) -> Vec<DiaryEntry> {
        self.entries.lock().unwrap().values().cloned().collect()
    }
}

impl DiaryStore for MemoryStore {
    async fn insert(&self, user_id: &str, draft: DiaryDraft) -> Result<DiaryEntry, StoreError> {
        let now = Utc::now();
        let entry = DiaryEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: draft.title,
            content: draft.content,
            analysis: None,
            category: draft.category,
            tags: draft.tags,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        draft: DiaryDraft,
    ) -> Result<DiaryEntry, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .get_mut(id)
            .filter(|e| e.user_id == user_id && !e.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.title = draft.title;
        entry.content = draft.content;
        entry.category = draft.category;
        entry.tags = draft.tags;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<DiaryEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(id)
            .filter(|e| e.user_id == user_id && !e.is_deleted())
            .cloned())
    }

    async fn list_active(&self, user_id: &str) -> Result<Vec<DiaryEntry>, StoreError> {
        let mut entries: Vec<DiaryEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id && !e.is_deleted())
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn soft_delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .get_mut(id)
            .filter(|e| e.user_id == user_id && !e.is_deleted())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn set_analysis(&self, id: &str, analysis: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.analysis = Some(analysis.to_string());
        Ok(())
    }

    async fn list_tags(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let tags: BTreeSet<String> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id && !e.is_deleted())
            .flat_map(|e| e.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();

        let entry = store
            .insert("alice", DiaryDraft::new("Hello", "World"))
            .await
            .unwrap();
        assert_eq!(entry.user_id, "alice");
        assert_eq!(entry.created_at, entry.updated_at);

        let fetched = store.get("alice", &entry.id).await.unwrap().unwrap();
        assert_eq!(fetched, entry);

        // Other users can't see it
        assert!(store.get("bob", &entry.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_newest_first() {
        let store = MemoryStore::new();

        let first = store.insert("alice", DiaryDraft::new("first", "")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.insert("alice", DiaryDraft::new("second", "")).await.unwrap();
        store.insert("bob", DiaryDraft::new("other", "")).await.unwrap();

        let listed = store.list_active("alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_row() {
        let store = MemoryStore::new();

        let keep = store.insert("alice", DiaryDraft::new("keep", "")).await.unwrap();
        let gone = store.insert("alice", DiaryDraft::new("gone", "")).await.unwrap();

        store.soft_delete("alice", &gone.id).await.unwrap();

        let listed = store.list_active("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
        assert!(store.get("alice", &gone.id).await.unwrap().is_none());

        let all = store.all_entries();
        assert_eq!(all.len(), 2);
        let row = all.iter().find(|e| e.id == gone.id).unwrap();
        assert!(row.deleted_at.is_some());
        assert_eq!(row.title, "gone");

        // Deleting twice is NotFound
        assert_eq!(
            store.soft_delete("alice", &gone.id).await,
            Err(StoreError::NotFound(gone.id.clone()))
        );
    }

    #[tokio::test]
    async fn test_soft_delete_requires_owner() {
        let store = MemoryStore::new();
        let entry = store.insert("alice", DiaryDraft::new("mine", "")).await.unwrap();

        assert!(store.soft_delete("bob", &entry.id).await.is_err());
        assert_eq!(store.list_active("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let store = MemoryStore::new();
        let entry = store.insert("alice", DiaryDraft::new("v1", "a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let updated = store
            .update("alice", &entry.id, DiaryDraft::new("v2", "b").with_category("知识"))
            .await
            .unwrap();
        assert_eq!(updated.title, "v2");
        assert_eq!(updated.category.as_deref(), Some("知识"));
        assert_eq!(updated.created_at, entry.created_at);
        assert!(updated.updated_at > entry.updated_at);
    }

    #[tokio::test]
    async fn test_list_tags_distinct_sorted() {
        let store = MemoryStore::new();
        store
            .insert("alice", DiaryDraft::new("a", "").with_tags(["work", "life"]))
            .await
            .unwrap();
        let deleted = store
            .insert("alice", DiaryDraft::new("b", "").with_tags(["secret"]))
            .await
            .unwrap();
        store
            .insert("alice", DiaryDraft::new("c", "").with_tags(["life", "books"]))
            .await
            .unwrap();
        store.soft_delete("alice", &deleted.id).await.unwrap();

        assert_eq!(
            store.list_tags("alice").await.unwrap(),
            vec!["books", "life", "work"]
        );
    }
}
