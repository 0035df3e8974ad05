//! Job storage implementations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use ageforge_core::JobId;

use super::types::{Job, JobOutcome, JobStatus, TransitionError};

/// Job store abstraction.
///
/// Every operation is atomic with respect to the others: a reader sees a job
/// either before or after an update, never halfway through one.
pub trait JobStore: Send + Sync {
    /// Register a new job in `Processing`.
    fn create(&self, job_id: JobId) -> Result<Job, JobStoreError>;

    /// Record the terminal outcome of a job.
    ///
    /// Unknown ids are not an error: the job may have been evicted while its
    /// gateway call was still running.
    fn update(&self, job_id: JobId, outcome: JobOutcome) -> Result<UpdateOutcome, JobStoreError>;

    /// Snapshot of a job, `None` if it does not exist.
    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Remove every job created strictly before `cutoff`, whatever its status.
    /// Returns the number of removed jobs.
    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, JobStoreError>;

    /// Get job statistics.
    fn stats(&self) -> Result<JobStats, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

impl<T> From<PoisonError<T>> for JobStoreError {
    fn from(_: PoisonError<T>) -> Self {
        JobStoreError::Storage("job table lock poisoned".to_string())
    }
}

/// What an [`JobStore::update`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The terminal state was recorded.
    Applied,
    /// No such job (never existed or already evicted). Nothing was written.
    Missing,
    /// The job had already reached a terminal state. Nothing was written.
    AlreadyTerminal(JobStatus),
}

/// Job statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct JobStats {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// In-memory job store.
///
/// Non-durable: every job is lost when the process exits.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, job_id: JobId) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write()?;
        if jobs.contains_key(&job_id) {
            return Err(JobStoreError::AlreadyExists(job_id));
        }
        let job = Job::new(job_id);
        jobs.insert(job_id, job.clone());
        Ok(job)
    }

    fn update(&self, job_id: JobId, outcome: JobOutcome) -> Result<UpdateOutcome, JobStoreError> {
        let mut jobs = self.jobs.write()?;
        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(UpdateOutcome::Missing);
        };

        match job.finish(outcome, Utc::now()) {
            Ok(()) => Ok(UpdateOutcome::Applied),
            Err(TransitionError::AlreadyTerminal { status, .. }) => {
                Ok(UpdateOutcome::AlreadyTerminal(status))
            }
        }
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        let jobs = self.jobs.read()?;
        Ok(jobs.get(&job_id).cloned())
    }

    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, JobStoreError> {
        let mut jobs = self.jobs.write()?;
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at >= cutoff);
        Ok(before - jobs.len())
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let jobs = self.jobs.read()?;

        let mut stats = JobStats {
            total: jobs.len(),
            ..JobStats::default()
        };

        for job in jobs.values() {
            match job.status {
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }

        Ok(stats)
    }
}

impl<T: JobStore + ?Sized> JobStore for Arc<T> {
    fn create(&self, job_id: JobId) -> Result<Job, JobStoreError> {
        (**self).create(job_id)
    }

    fn update(&self, job_id: JobId, outcome: JobOutcome) -> Result<UpdateOutcome, JobStoreError> {
        (**self).update(job_id, outcome)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        (**self).get(job_id)
    }

    fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, JobStoreError> {
        (**self).remove_older_than(cutoff)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        (**self).stats()
    }
}
