//! # Journal — save-then-analyze over an abstract diary store
//!
//! [`Journal`] ties together the two external collaborators of the application:
//! a [`DiaryStore`] that persists entries and an [`Analyzer`] that turns an entry's
//! content into a short reflective analysis.
//!
//! ## Save flow
//!
//! 1. [`Journal::save`] normalises the draft and commits it (insert or update).
//! 2. The saved entry is returned together with an [`AnalysisJob`]. Creating the
//!    job marks the entry in the [`AnalysisTracker`] so listings can show an
//!    "analyzing" badge straight away.
//! 3. The caller detaches the job (`tokio::spawn(job.run())` on the server).
//!    [`AnalysisJob::run`] performs exactly one analyzer call and, on success,
//!    writes the analysis back with [`DiaryStore::set_analysis`].
//!
//! A failed analysis never undoes the save: the entry keeps its previous analysis
//! (`None` for a new entry). The failure is logged and returned from `run()`.
//! The tracker keeps it until [`AnalysisTracker::take_failed`] reports it.
//! There is no retry; users can trigger [`Journal::reanalyze`] manually.
//!
//! ## Ownership
//!
//! Every read and write is scoped to a user id. A store must treat entries of
//! other users exactly like missing entries.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{DiaryDraft, DiaryEntry};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("diary entry {0} not found")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("analysis is not configured: {0}")]
    NotConfigured(String),
    #[error("analysis request failed: {0}")]
    Request(String),
    #[error("analysis provider returned status {0}")]
    Status(u16),
    #[error("analysis response contained no content")]
    EmptyResponse,
    #[error("failed to store analysis: {0}")]
    Store(String),
}

/// Persistence for diary entries.
pub trait DiaryStore: Send + Sync {
    /// Insert a new entry owned by `user_id`.
    fn insert(
        &self,
        user_id: &str,
        draft: DiaryDraft,
    ) -> impl Future<Output = Result<DiaryEntry, StoreError>> + Send;

    /// Replace the editable fields of an existing, non-deleted entry.
    fn update(
        &self,
        user_id: &str,
        id: &str,
        draft: DiaryDraft,
    ) -> impl Future<Output = Result<DiaryEntry, StoreError>> + Send;

    /// Fetch a non-deleted entry.
    fn get(
        &self,
        user_id: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<DiaryEntry>, StoreError>> + Send;

    /// All non-deleted entries of a user, newest first.
    fn list_active(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<DiaryEntry>, StoreError>> + Send;

    /// Mark an entry deleted. The row itself stays in storage.
    fn soft_delete(
        &self,
        user_id: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Record the analysis of an entry.
    fn set_analysis(
        &self,
        id: &str,
        analysis: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Distinct tags over a user's non-deleted entries, sorted.
    fn list_tags(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// Produces a reflective analysis of entry content.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, content: &str) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

/// Entries with an analysis currently in flight, and entries whose last
/// analysis failed.
///
/// Purely in-memory and per process; used for display only. An entry can have
/// several jobs at once (save followed by an edit); it stays flagged until the
/// last of them finishes.
#[derive(Clone, Debug, Default)]
pub struct AnalysisTracker {
    state: Arc<Mutex<TrackerState>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    active: HashMap<String, usize>,
    failed: HashSet<String>,
}

impl AnalysisTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flag `id` as being analyzed until the returned guard is dropped.
    ///
    /// A new job supersedes an earlier failure of the same entry.
    pub fn mark(&self, id: &str) -> AnalysisGuard {
        let mut state = self.lock();
        *state.active.entry(id.to_string()).or_insert(0) += 1;
        state.failed.remove(id);
        AnalysisGuard {
            tracker: self.clone(),
            id: id.to_string(),
        }
    }

    pub fn is_analyzing(&self, id: &str) -> bool {
        self.lock().active.contains_key(id)
    }

    /// Ids currently being analyzed, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().active.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn record_outcome(&self, id: &str, failed: bool) {
        let mut state = self.lock();
        if failed {
            state.failed.insert(id.to_string());
        } else {
            state.failed.remove(id);
        }
    }

    /// Remove and return the failed ids accepted by `owned`, sorted.
    ///
    /// Each failure is reported once; ids rejected by `owned` stay recorded.
    pub fn take_failed(&self, owned: impl Fn(&str) -> bool) -> Vec<String> {
        let mut state = self.lock();
        let mut taken: Vec<String> = state
            .failed
            .iter()
            .filter(|id| owned(id.as_str()))
            .cloned()
            .collect();
        for id in &taken {
            state.failed.remove(id);
        }
        taken.sort();
        taken
    }
}

/// Releases one "analyzing" mark for an entry on drop.
#[derive(Debug)]
pub struct AnalysisGuard {
    tracker: AnalysisTracker,
    id: String,
}

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        let remaining = state.active.get_mut(&self.id).map(|count| {
            *count -= 1;
            *count
        });
        if remaining == Some(0) {
            state.active.remove(&self.id);
        }
    }
}

/// Diary operations for the application, generic over storage and analysis.
pub struct Journal<S, A> {
    store: Arc<S>,
    analyzer: Arc<A>,
    tracker: AnalysisTracker,
}

impl<S, A> Clone for Journal<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            analyzer: Arc::clone(&self.analyzer),
            tracker: self.tracker.clone(),
        }
    }
}

impl<S: DiaryStore, A: Analyzer> Journal<S, A> {
    pub fn new(store: S, analyzer: A) -> Self {
        Self {
            store: Arc::new(store),
            analyzer: Arc::new(analyzer),
            tracker: AnalysisTracker::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tracker(&self) -> &AnalysisTracker {
        &self.tracker
    }

    /// Non-deleted entries of a user, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<DiaryEntry>, StoreError> {
        self.store.list_active(user_id).await
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<DiaryEntry, StoreError> {
        self.store
            .get(user_id, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Persist a draft and hand back the analysis job for the saved content.
    ///
    /// `id = None` creates a new entry, `Some(id)` updates an existing one.
    pub async fn save(
        &self,
        user_id: &str,
        id: Option<&str>,
        draft: DiaryDraft,
    ) -> Result<(DiaryEntry, AnalysisJob<S, A>), StoreError> {
        let draft = draft.normalized();
        let entry = match id {
            Some(id) => self.store.update(user_id, id, draft).await?,
            None => self.store.insert(user_id, draft).await?,
        };
        info!(entry_id = %entry.id, user_id, updated = id.is_some(), "diary entry saved");

        let job = self.job_for(&entry);
        Ok((entry, job))
    }

    /// Analysis job for an already stored entry.
    pub async fn reanalyze(&self, user_id: &str, id: &str) -> Result<AnalysisJob<S, A>, StoreError> {
        let entry = self.get(user_id, id).await?;
        Ok(self.job_for(&entry))
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.store.soft_delete(user_id, id).await?;
        info!(entry_id = id, user_id, "diary entry soft-deleted");
        Ok(())
    }

    pub async fn tags(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.store.list_tags(user_id).await
    }

    fn job_for(&self, entry: &DiaryEntry) -> AnalysisJob<S, A> {
        AnalysisJob {
            entry_id: entry.id.clone(),
            content: entry.content.clone(),
            store: Arc::clone(&self.store),
            analyzer: Arc::clone(&self.analyzer),
            guard: self.tracker.mark(&entry.id),
        }
    }
}

/// One pending analysis of a saved entry. Dropping it without running releases
/// its "analyzing" mark.
pub struct AnalysisJob<S, A> {
    entry_id: String,
    content: String,
    store: Arc<S>,
    analyzer: Arc<A>,
    guard: AnalysisGuard,
}

impl<S: DiaryStore, A: Analyzer> AnalysisJob<S, A> {
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Run the analysis and store the result.
    ///
    /// A failure is also recorded in the tracker so the owner can be told. A
    /// later success for the same entry clears it.
    pub async fn run(self) -> Result<String, AnalysisError> {
        let result = self.analyze_and_store().await;
        self.guard
            .tracker
            .record_outcome(&self.entry_id, result.is_err());
        result
    }

    async fn analyze_and_store(&self) -> Result<String, AnalysisError> {
        let analysis = match self.analyzer.analyze(&self.content).await {
            Ok(analysis) if analysis.trim().is_empty() => Err(AnalysisError::EmptyResponse),
            other => other,
        };

        let analysis = match analysis {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(entry_id = %self.entry_id, error = %e, "diary analysis failed");
                return Err(e);
            }
        };

        if let Err(e) = self.store.set_analysis(&self.entry_id, &analysis).await {
            warn!(entry_id = %self.entry_id, error = %e, "failed to store diary analysis");
            return Err(AnalysisError::Store(e.to_string()));
        }

        info!(entry_id = %self.entry_id, "diary analysis stored");
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    impl Analyzer for CountingAnalyzer {
        async fn analyze(&self, content: &str) -> Result<String, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("- 个人特质：{content}"))
        }
    }

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        async fn analyze(&self, _content: &str) -> Result<String, AnalysisError> {
            Err(AnalysisError::Status(500))
        }
    }

    /// Fails its first call, succeeds afterwards.
    #[derive(Default)]
    struct FlakyAnalyzer {
        calls: AtomicUsize,
    }

    impl Analyzer for FlakyAnalyzer {
        async fn analyze(&self, _content: &str) -> Result<String, AnalysisError> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(AnalysisError::Request("timeout".into())),
                _ => Ok("- 情绪：平静".to_string()),
            }
        }
    }

    struct BlankAnalyzer;

    impl Analyzer for BlankAnalyzer {
        async fn analyze(&self, _content: &str) -> Result<String, AnalysisError> {
            Ok("  ".to_string())
        }
    }

    fn draft() -> DiaryDraft {
        DiaryDraft::new("晨跑", "今天跑了五公里 #跑步")
            .with_category("复盘")
            .with_tags(["#跑步", "健康"])
    }

    #[tokio::test]
    async fn test_save_persists_fields_and_runs_one_analysis() {
        let journal = Journal::new(MemoryStore::new(), CountingAnalyzer::default());

        let (entry, job) = journal.save("alice", None, draft()).await.unwrap();
        assert_eq!(entry.title, "晨跑");
        assert_eq!(entry.content, "今天跑了五公里 #跑步");
        assert_eq!(entry.category.as_deref(), Some("复盘"));
        assert_eq!(entry.tags, vec!["跑步", "健康"]);
        assert!(entry.analysis.is_none());

        // Flagged as soon as the save returns.
        assert!(journal.tracker().is_analyzing(&entry.id));

        let analysis = job.run().await.unwrap();
        assert_eq!(journal.analyzer.calls.load(Ordering::SeqCst), 1);
        assert!(!journal.tracker().is_analyzing(&entry.id));

        let stored = journal.get("alice", &entry.id).await.unwrap();
        assert_eq!(stored.analysis.as_deref(), Some(analysis.as_str()));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_the_save() {
        let journal = Journal::new(MemoryStore::new(), FailingAnalyzer);

        let (entry, job) = journal.save("alice", None, draft()).await.unwrap();
        let err = job.run().await.unwrap_err();
        assert_eq!(err, AnalysisError::Status(500));

        let stored = journal.get("alice", &entry.id).await.unwrap();
        assert_eq!(stored.title, "晨跑");
        assert!(stored.analysis.is_none());
        assert!(!journal.tracker().is_analyzing(&entry.id));
    }

    #[tokio::test]
    async fn test_failed_reanalysis_keeps_previous_analysis() {
        let store = MemoryStore::new();
        let ok = Journal::new(store.clone(), CountingAnalyzer::default());
        let (entry, job) = ok.save("alice", None, draft()).await.unwrap();
        let first = job.run().await.unwrap();

        let failing = Journal::new(store, FailingAnalyzer);
        let (_, job) = failing
            .save("alice", Some(&entry.id), DiaryDraft::new("晨跑", "改过的内容"))
            .await
            .unwrap();
        assert!(job.run().await.is_err());

        let stored = failing.get("alice", &entry.id).await.unwrap();
        assert_eq!(stored.content, "改过的内容");
        assert_eq!(stored.analysis.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_blank_analysis_is_not_stored() {
        let journal = Journal::new(MemoryStore::new(), BlankAnalyzer);
        let (entry, job) = journal.save("alice", None, draft()).await.unwrap();
        assert_eq!(job.run().await.unwrap_err(), AnalysisError::EmptyResponse);
        assert!(journal.get("alice", &entry.id).await.unwrap().analysis.is_none());
    }

    #[tokio::test]
    async fn test_dropped_job_clears_flag() {
        let journal = Journal::new(MemoryStore::new(), CountingAnalyzer::default());
        let (entry, job) = journal.save("alice", None, draft()).await.unwrap();
        assert_eq!(journal.tracker().ids(), vec![entry.id.clone()]);
        drop(job);
        assert!(journal.tracker().ids().is_empty());
        assert_eq!(journal.analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlapping_jobs_keep_flag_until_last_finishes() {
        let journal = Journal::new(MemoryStore::new(), CountingAnalyzer::default());
        let (entry, first) = journal.save("alice", None, draft()).await.unwrap();
        let (_, second) = journal
            .save("alice", Some(&entry.id), DiaryDraft::new("晨跑", "又跑了一次"))
            .await
            .unwrap();

        first.run().await.unwrap();
        assert!(journal.tracker().is_analyzing(&entry.id));

        second.run().await.unwrap();
        assert!(!journal.tracker().is_analyzing(&entry.id));
        assert!(journal.tracker().ids().is_empty());
    }

    #[tokio::test]
    async fn test_failed_analysis_is_reported_once_to_owner() {
        let journal = Journal::new(MemoryStore::new(), FailingAnalyzer);
        let (entry, job) = journal.save("alice", None, draft()).await.unwrap();
        assert!(job.run().await.is_err());

        let tracker = journal.tracker();
        assert!(tracker.take_failed(|id| id == "someone-else").is_empty());
        assert_eq!(tracker.take_failed(|id| id == entry.id), vec![entry.id.clone()]);
        assert!(tracker.take_failed(|_| true).is_empty());
    }

    #[tokio::test]
    async fn test_new_job_clears_earlier_failure() {
        let store = MemoryStore::new();
        let failing = Journal::new(store.clone(), BlankAnalyzer);
        let (entry, job) = failing.save("alice", None, draft()).await.unwrap();
        assert!(job.run().await.is_err());

        let _job = failing.reanalyze("alice", &entry.id).await.unwrap();
        assert!(failing.tracker().take_failed(|_| true).is_empty());
    }

    #[tokio::test]
    async fn test_later_success_supersedes_overlapping_failure() {
        let journal = Journal::new(MemoryStore::new(), FlakyAnalyzer::default());
        let (entry, first) = journal.save("alice", None, draft()).await.unwrap();
        let second = journal.reanalyze("alice", &entry.id).await.unwrap();

        assert!(first.run().await.is_err());
        second.run().await.unwrap();

        assert!(journal.tracker().take_failed(|_| true).is_empty());
        let stored = journal.get("alice", &entry.id).await.unwrap();
        assert_eq!(stored.analysis.as_deref(), Some("- 情绪：平静"));
    }

    #[tokio::test]
    async fn test_update_of_foreign_entry_is_not_found() {
        let journal = Journal::new(MemoryStore::new(), CountingAnalyzer::default());
        let (entry, _job) = journal.save("alice", None, draft()).await.unwrap();

        let err = journal
            .save("mallory", Some(&entry.id), DiaryDraft::new("x", "y"))
            .await
            .err()
            .unwrap();
        assert_eq!(err, StoreError::NotFound(entry.id.clone()));
        assert!(journal.get("mallory", &entry.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_then_reanalyze_is_not_found() {
        let journal = Journal::new(MemoryStore::new(), CountingAnalyzer::default());
        let (entry, _job) = journal.save("alice", None, draft()).await.unwrap();
        journal.delete("alice", &entry.id).await.unwrap();

        assert!(journal.list("alice").await.unwrap().is_empty());
        assert!(matches!(
            journal.reanalyze("alice", &entry.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
