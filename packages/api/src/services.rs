//! Process-wide service instances used by the server functions.
//!
//! Clients are built lazily from [`crate::settings`]. The journal needs the
//! database pool, so it is initialised asynchronously on first use.

use std::sync::OnceLock;

use store::{AnalysisJob, AnalysisStatus, AnalysisTracker, Journal};
use tokio::sync::OnceCell;

use crate::analysis::ChatAnalyzer;
use crate::blob::BlobClient;
use crate::db::{get_pool, PgDiaryStore};
use crate::location::LocationClient;
use crate::settings::settings;

pub type AppJournal = Journal<PgDiaryStore, ChatAnalyzer>;

static JOURNAL: OnceCell<AppJournal> = OnceCell::const_new();
static ANALYZER: OnceLock<ChatAnalyzer> = OnceLock::new();
static BLOB: OnceLock<BlobClient> = OnceLock::new();
static LOCATION: OnceLock<LocationClient> = OnceLock::new();

pub fn analyzer() -> &'static ChatAnalyzer {
    ANALYZER.get_or_init(|| ChatAnalyzer::new(settings().analysis.clone()))
}

pub fn blob_client() -> &'static BlobClient {
    BLOB.get_or_init(|| BlobClient::new(settings().blob.clone()))
}

pub fn location_client() -> &'static LocationClient {
    LOCATION.get_or_init(|| LocationClient::new(settings().location.clone()))
}

pub async fn journal() -> Result<&'static AppJournal, sqlx::Error> {
    JOURNAL
        .get_or_try_init(|| async {
            let pool = get_pool().await?;
            Ok(Journal::new(
                PgDiaryStore::new(pool.clone()),
                analyzer().clone(),
            ))
        })
        .await
}

/// Detach an analysis job. The job logs its outcome and records failures in
/// the tracker, where [`analysis_status`] picks them up.
pub fn spawn_analysis(job: AnalysisJob<PgDiaryStore, ChatAnalyzer>) {
    let entry_id = job.entry_id().to_string();
    tokio::spawn(async move {
        if job.run().await.is_ok() {
            tracing::debug!("Analysis finished for {}", entry_id);
        }
    });
}

/// Running and failed analyses among `own` entry ids.
///
/// Failed ids are drained from the tracker, so each failure is reported once.
pub fn analysis_status(tracker: &AnalysisTracker, own: &[String]) -> AnalysisStatus {
    let is_own = |id: &str| own.iter().any(|o| o == id);
    AnalysisStatus {
        analyzing: tracker.ids().into_iter().filter(|id| is_own(id.as_str())).collect(),
        failed: tracker.take_failed(is_own),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{AnalysisError, Analyzer, DiaryDraft, MemoryStore};

    struct DownAnalyzer;

    impl Analyzer for DownAnalyzer {
        async fn analyze(&self, _content: &str) -> Result<String, AnalysisError> {
            Err(AnalysisError::Status(503))
        }
    }

    #[tokio::test]
    async fn test_status_reports_failure_to_owner_once() {
        let journal = Journal::new(MemoryStore::new(), DownAnalyzer);
        let (mine, job) = journal
            .save("alice", None, DiaryDraft::new("t", "c"))
            .await
            .unwrap();
        let (theirs, pending) = journal
            .save("bob", None, DiaryDraft::new("t", "c"))
            .await
            .unwrap();

        let own = vec![mine.id.clone()];
        assert_eq!(analysis_status(journal.tracker(), &own).analyzing, own);

        assert!(job.run().await.is_err());
        let status = analysis_status(journal.tracker(), &own);
        assert!(status.analyzing.is_empty());
        assert_eq!(status.failed, own);

        // Reported once, and other users' jobs stay out of it.
        assert_eq!(analysis_status(journal.tracker(), &own), AnalysisStatus::default());
        assert!(pending.run().await.is_err());
        assert!(analysis_status(journal.tracker(), &own).failed.is_empty());
        assert_eq!(
            analysis_status(journal.tracker(), &[theirs.id.clone()]).failed,
            vec![theirs.id]
        );
    }
}
