//! Asynchronous ingestion jobs.
//!
//! A sync job fetches a repository's documents and indexes them in the
//! background. Each job moves through exactly one transition, from
//! `processing` to either `completed` or `error`, and stays queryable for
//! a retention window measured from its start time. Expired jobs are swept
//! lazily before each new submission rather than on a timer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ragmark_sources::DocumentSource;

use crate::config::JobConfig;
use crate::error::Result;
use crate::indexer::DocumentIndexer;

/// Report message when the source yields no documents.
const NO_FILES_MESSAGE: &str = "No markdown files found or repository not accessible";

/// Status of a sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The background task is still running.
    Processing,
    /// Indexing finished.
    Completed,
    /// Fetch or indexing failed, or the source was empty.
    Error,
}

/// Record of one ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    /// Opaque unique job token.
    pub job_id: String,

    /// Current lifecycle status.
    pub status: JobStatus,

    /// Repository the job syncs.
    pub repository: String,

    /// When the job was submitted.
    pub started_at: DateTime<Utc>,

    /// When the job reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of documents ingested, set on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_synced: Option<usize>,

    /// Human-readable completion message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Failure detail, set when the job errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncJob {
    /// Create a fresh `processing` job for a repository.
    pub fn processing(job_id: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Processing,
            repository: repository.into(),
            started_at: Utc::now(),
            completed_at: None,
            files_synced: None,
            message: None,
            error: None,
        }
    }
}

/// Terminal outcome applied to a processing job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Indexing finished; `files_synced` documents were ingested.
    Completed {
        /// Number of documents ingested.
        files_synced: usize,
        /// Completion message.
        message: String,
    },
    /// Fetch or indexing failed.
    Failed {
        /// Failure detail.
        error: String,
    },
}

/// Storage for job records.
///
/// The store owns the concurrency discipline: the submitting task inserts,
/// the single background task owning a job id finishes it, and the sweep is
/// the only remover. `finish` applies only while the job is still
/// processing, so a terminal status can never be overwritten.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a freshly created job.
    async fn insert(&self, job: SyncJob);

    /// Apply a terminal outcome to a processing job. A job that is absent
    /// or already terminal is left unchanged.
    async fn finish(&self, job_id: &str, outcome: JobOutcome);

    /// Look up a job by id.
    async fn get(&self, job_id: &str) -> Option<SyncJob>;

    /// Remove jobs started before `cutoff`; returns how many were removed.
    async fn sweep_started_before(&self, cutoff: DateTime<Utc>) -> usize;
}

/// In-memory [`JobStore`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, SyncJob>>>,
}

impl MemoryJobStore {
    /// Create an empty job store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: SyncJob) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.job_id.clone(), job);
    }

    async fn finish(&self, job_id: &str, outcome: JobOutcome) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if job.status != JobStatus::Processing {
            return;
        }

        job.completed_at = Some(Utc::now());
        match outcome {
            JobOutcome::Completed {
                files_synced,
                message,
            } => {
                job.status = JobStatus::Completed;
                job.files_synced = Some(files_synced);
                job.message = Some(message);
            }
            JobOutcome::Failed { error } => {
                job.status = JobStatus::Error;
                job.files_synced = Some(0);
                job.error = Some(error);
            }
        }
    }

    async fn get(&self, job_id: &str) -> Option<SyncJob> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id).cloned()
    }

    async fn sweep_started_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.started_at >= cutoff);
        before - jobs.len()
    }
}

/// Status of a blocking sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// All fetched documents were indexed.
    Completed,
    /// The source was empty or the pipeline failed.
    Error,
}

/// Result of a blocking sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Overall outcome.
    pub status: SyncStatus,

    /// Repository that was synced.
    pub repository: String,

    /// Number of documents ingested.
    pub files_synced: usize,

    /// Human-readable summary.
    pub message: String,
}

/// Drives the fetch-and-index pipeline, blocking or in the background.
#[derive(Clone)]
pub struct SyncJobManager {
    source: Arc<dyn DocumentSource>,
    indexer: Arc<DocumentIndexer>,
    store: Arc<dyn JobStore>,
    retention: Duration,
}

impl SyncJobManager {
    /// Create a manager over the given source, indexer, and job store.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        indexer: Arc<DocumentIndexer>,
        store: Arc<dyn JobStore>,
        config: &JobConfig,
    ) -> Self {
        Self {
            source,
            indexer,
            store,
            retention: Duration::seconds(config.retention_secs as i64),
        }
    }

    /// Run the fetch-and-index pipeline to completion.
    ///
    /// An empty source and a pipeline failure both produce an error report;
    /// neither is a fault of the caller.
    pub async fn run_sync(&self, repository: &str) -> SyncReport {
        info!("Syncing {repository}");
        match self.fetch_and_index(repository).await {
            Ok(0) => SyncReport {
                status: SyncStatus::Error,
                repository: repository.to_string(),
                files_synced: 0,
                message: NO_FILES_MESSAGE.to_string(),
            },
            Ok(files_synced) => SyncReport {
                status: SyncStatus::Completed,
                repository: repository.to_string(),
                files_synced,
                message: format!("Successfully synced {files_synced} files"),
            },
            Err(err) => {
                warn!("Sync of {repository} failed: {err}");
                SyncReport {
                    status: SyncStatus::Error,
                    repository: repository.to_string(),
                    files_synced: 0,
                    message: err.to_string(),
                }
            }
        }
    }

    async fn fetch_and_index(&self, repository: &str) -> Result<usize> {
        let documents = self.source.fetch_documents(repository).await?;
        if documents.is_empty() {
            return Ok(0);
        }
        self.indexer.index(repository, &documents).await?;
        Ok(documents.len())
    }

    /// Submit a background sync and return its job id immediately.
    ///
    /// Expired jobs are evicted before the new job is recorded.
    pub async fn submit(&self, repository: &str) -> String {
        self.evict_expired().await;

        let job_id = Uuid::new_v4().simple().to_string();
        self.store
            .insert(SyncJob::processing(&job_id, repository))
            .await;
        info!("Submitted sync job {job_id} for {repository}");

        let worker = self.clone();
        let repository = repository.to_string();
        let finished_job_id = job_id.clone();
        tokio::spawn(async move {
            let report = worker.run_sync(&repository).await;
            let outcome = match report.status {
                SyncStatus::Completed => JobOutcome::Completed {
                    files_synced: report.files_synced,
                    message: report.message,
                },
                SyncStatus::Error => JobOutcome::Failed {
                    error: report.message,
                },
            };
            worker.store.finish(&finished_job_id, outcome).await;
        });

        job_id
    }

    /// Look up a job record.
    pub async fn status(&self, job_id: &str) -> Option<SyncJob> {
        self.store.get(job_id).await
    }

    /// Remove every job whose `started_at` is older than the retention
    /// window, regardless of status.
    pub async fn evict_expired(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let removed = self.store.sweep_started_before(cutoff).await;
        if removed > 0 {
            debug!("Evicted {removed} expired sync jobs");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn completed(files_synced: usize) -> JobOutcome {
        JobOutcome::Completed {
            files_synced,
            message: format!("Successfully synced {files_synced} files"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let store = MemoryJobStore::new();
        store.insert(SyncJob::processing("job-1", "owner/repo")).await;

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.repository, "owner/repo");
        assert_eq!(job.completed_at, None);
    }

    #[tokio::test]
    async fn test_get_unknown_job_is_none() {
        let store = MemoryJobStore::new();
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_finish_completes_processing_job() {
        let store = MemoryJobStore::new();
        store.insert(SyncJob::processing("job-1", "owner/repo")).await;

        store.finish("job-1", completed(4)).await;

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.files_synced, Some(4));
        assert!(job.completed_at.is_some());
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn test_finish_records_failure() {
        let store = MemoryJobStore::new();
        store.insert(SyncJob::processing("job-1", "owner/repo")).await;

        store
            .finish(
                "job-1",
                JobOutcome::Failed {
                    error: "boom".to_string(),
                },
            )
            .await;

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.files_synced, Some(0));
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_finish_applies_only_once() {
        let store = MemoryJobStore::new();
        store.insert(SyncJob::processing("job-1", "owner/repo")).await;

        store.finish("job-1", completed(4)).await;
        store
            .finish(
                "job-1",
                JobOutcome::Failed {
                    error: "late failure".to_string(),
                },
            )
            .await;

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.files_synced, Some(4));
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn test_finish_on_absent_job_is_harmless() {
        let store = MemoryJobStore::new();
        store.finish("missing", completed(1)).await;
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_jobs() {
        let store = MemoryJobStore::new();

        let mut old = SyncJob::processing("old", "owner/repo");
        old.started_at = Utc::now() - Duration::hours(2);
        store.insert(old).await;
        store.insert(SyncJob::processing("fresh", "owner/repo")).await;

        let removed = store
            .sweep_started_before(Utc::now() - Duration::hours(1))
            .await;

        assert_eq!(removed, 1);
        assert!(store.get("old").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }

    #[test]
    fn test_job_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(serde_json::to_string(&JobStatus::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn test_job_serialization_skips_absent_fields() {
        let job = SyncJob::processing("job-1", "owner/repo");
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["status"], "processing");
        assert!(json.get("completed_at").is_none());
        assert!(json.get("files_synced").is_none());
        assert!(json.get("error").is_none());
    }
}
