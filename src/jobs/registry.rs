//! Process-wide table of in-flight and completed generation jobs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of one pipeline run. Random 128-bit; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Consistent point-in-time view of one job.
///
/// Returned by value from [`JobRegistry::get`], cloned under the registry
/// lock, so the four status fields can never be observed torn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    /// 0–100. Informational: the registry stores what it is handed and does
    /// not clamp out-of-order values; pipelines only submit ascending
    /// checkpoints.
    pub progress: u8,
    pub message: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    /// A job is terminal once completed or errored; terminal state is sticky.
    pub fn is_terminal(&self) -> bool {
        self.completed || self.error.is_some()
    }
}

/// Errors surfaced by registry mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum JobError {
    #[error("job {id} not found")]
    #[diagnostic(
        code(storyloom::jobs::not_found),
        help("The job may have been pruned, or the id belongs to a previous process.")
    )]
    NotFound { id: JobId },
}

/// Concurrent-safe job table shared by pipeline runs and status readers.
///
/// Exactly one writer per job id exists at any time (the pipeline task that
/// created it); readers never mutate. The registry itself serializes
/// concurrent access with a single read-write lock — the table is small and
/// updates are rare (one per phase), so a sharded map would buy nothing.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<FxHashMap<JobId, JobSnapshot>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in its pending state.
    pub fn create_job(&self) -> JobId {
        let id = JobId::generate();
        let now = Utc::now();
        let snapshot = JobSnapshot {
            id,
            progress: 0,
            message: "queued".to_string(),
            completed: false,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().insert(id, snapshot);
        id
    }

    /// Current snapshot of a job, if it exists.
    pub fn get(&self, id: JobId) -> Option<JobSnapshot> {
        self.jobs.read().get(&id).cloned()
    }

    /// Record non-terminal progress.
    ///
    /// A no-op once the job is terminal: late updates from an abandoned run
    /// must not resurrect a finished job.
    pub fn update(
        &self,
        id: JobId,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<(), JobError> {
        self.mutate(id, |job| {
            job.progress = progress;
            job.message = message.into();
        })
    }

    /// Mark the job successfully completed (progress 100, terminal).
    pub fn complete(&self, id: JobId, message: impl Into<String>) -> Result<(), JobError> {
        self.mutate(id, |job| {
            job.progress = 100;
            job.message = message.into();
            job.completed = true;
        })
    }

    /// Mark the job failed (terminal) with a human-readable message and the
    /// underlying error string.
    pub fn fail(
        &self,
        id: JobId,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<(), JobError> {
        self.mutate(id, |job| {
            job.message = message.into();
            job.error = Some(error.into());
            job.completed = true;
        })
    }

    fn mutate(&self, id: JobId, apply: impl FnOnce(&mut JobSnapshot)) -> Result<(), JobError> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(JobError::NotFound { id })?;
        if job.is_terminal() {
            tracing::debug!(job = %id, "ignoring update to terminal job");
            return Ok(());
        }
        apply(job);
        job.updated_at = Utc::now();
        Ok(())
    }

    /// Drop one job from the table, returning its last snapshot.
    pub fn remove(&self, id: JobId) -> Option<JobSnapshot> {
        self.jobs.write().remove(&id)
    }

    /// Drop terminal jobs whose last update is older than `max_age`.
    /// Returns how many were removed. In-flight jobs are never pruned.
    pub fn prune_terminal(&self, max_age: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.is_terminal() && job.updated_at <= cutoff));
        before - jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
