//! Read-only status projection for the boundary layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ageforge_core::JobId;

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobStatus};

pub const PROCESSING_MESSAGE: &str = "Image is still being processed";
pub const COMPLETED_MESSAGE: &str = "Image generation completed successfully";
pub const FAILED_MESSAGE: &str = "Image generation failed";

/// Boundary-facing view of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub result_url: Option<String>,
    pub message: &'static str,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobStatusView {
    pub fn from_job(job: &Job) -> Self {
        let (result_url, message) = match job.status {
            JobStatus::Processing => (None, PROCESSING_MESSAGE),
            JobStatus::Completed => (job.result_url.clone(), COMPLETED_MESSAGE),
            JobStatus::Failed => (None, FAILED_MESSAGE),
        };

        Self {
            job_id: job.id,
            status: job.status,
            result_url,
            message,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Status lookups over a job store. Never mutates and never waits on a
/// running transformation.
#[derive(Debug, Clone)]
pub struct JobStatusQuery<S> {
    store: S,
}

impl<S: JobStore> JobStatusQuery<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `Ok(None)` when the job is unknown or was already evicted.
    pub fn query_status(&self, job_id: JobId) -> Result<Option<JobStatusView>, JobStoreError> {
        Ok(self.store.get(job_id)?.as_ref().map(JobStatusView::from_job))
    }
}
