//! Core job types and transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ageforge_core::JobId;

/// Job execution status.
///
/// Closed set: a job starts `Processing` and moves exactly once to one of the
/// two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Transformation in flight
    Processing,
    /// Gateway returned a result locator
    Completed,
    /// Gateway failed (error, timeout, bad response, aborted task)
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { result_url: String },
    Failed { reason: String },
}

impl JobOutcome {
    pub fn completed(result_url: impl Into<String>) -> Self {
        Self::Completed {
            result_url: result_url.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job {id} is already {status}")]
    AlreadyTerminal { id: JobId, status: JobStatus },
}

/// A tracked transformation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Present if and only if `status == Completed`
    pub result_url: Option<String>,
    /// Failure reason, only on `Failed`
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set once, on the terminal transition
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job in `Processing`.
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            result_url: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply the single terminal transition.
    pub fn finish(
        &mut self,
        outcome: JobOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                id: self.id,
                status: self.status,
            });
        }

        match outcome {
            JobOutcome::Completed { result_url } => {
                self.status = JobStatus::Completed;
                self.result_url = Some(result_url);
            }
            JobOutcome::Failed { reason } => {
                self.status = JobStatus::Failed;
                self.error = Some(reason);
            }
        }
        self.completed_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_job_is_processing() {
        let job = Job::new(JobId::new());

        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.result_url.is_none());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn completion_sets_url_and_timestamp() {
        let mut job = Job::new(JobId::new());
        let at = Utc::now();

        job.finish(JobOutcome::completed("https://cdn.example/a.png"), at)
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result_url.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(job.completed_at, Some(at));
        assert!(job.error.is_none());
    }

    #[test]
    fn failure_never_sets_url() {
        let mut job = Job::new(JobId::new());
        job.finish(JobOutcome::failed("boom"), Utc::now()).unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result_url.is_none());
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn completed_cannot_become_failed() {
        let mut job = Job::new(JobId::new());
        job.finish(JobOutcome::completed("u"), Utc::now()).unwrap();

        let err = job.finish(JobOutcome::failed("late"), Utc::now()).unwrap_err();

        assert_eq!(
            err,
            TransitionError::AlreadyTerminal {
                id: job.id,
                status: JobStatus::Completed
            }
        );
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }

    fn outcome() -> impl Strategy<Value = JobOutcome> {
        prop_oneof![
            "[a-z]{1,12}".prop_map(|s| JobOutcome::completed(format!("https://cdn.example/{s}"))),
            "[a-z ]{0,12}".prop_map(JobOutcome::failed),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of outcomes arrives, only the first one is
        /// applied, and the locator is present exactly when the job completed.
        #[test]
        fn only_first_outcome_applies(outcomes in prop::collection::vec(outcome(), 1..8)) {
            let mut job = Job::new(JobId::new());
            let first_at = Utc::now();

            let applied: Vec<bool> = outcomes
                .iter()
                .cloned()
                .map(|o| job.finish(o, first_at).is_ok())
                .collect();

            prop_assert!(applied[0]);
            prop_assert!(applied[1..].iter().all(|ok| !ok));
            prop_assert_eq!(job.status, outcomes[0].status());
            prop_assert_eq!(job.result_url.is_some(), job.status == JobStatus::Completed);
            prop_assert_eq!(job.completed_at, Some(first_at));
        }
    }
}
