//! Background transformation jobs: tracking, dispatch, retention.
//!
//! ## Design
//!
//! - A job is created `PROCESSING` and moves exactly once to `COMPLETED` or `FAILED`
//! - Each submission spawns one Tokio task that calls the gateway and writes the result
//! - The store is the only shared mutable state; everything else holds a handle to it
//! - Jobs are evicted purely by age, whatever their status
//! - State lives in memory only and is lost on restart
//!
//! ## Components
//!
//! - `JobStore`: concurrent job table (`InMemoryJobStore`)
//! - `JobOrchestrator`: submit + fire-and-forget unit of work
//! - `RetentionSweeper`: periodic eviction task
//! - `JobStatusQuery`: read-only status projection

pub mod orchestrator;
pub mod query;
pub mod store;
pub mod sweeper;
pub mod types;

pub use orchestrator::JobOrchestrator;
pub use query::{JobStatusQuery, JobStatusView};
pub use store::{InMemoryJobStore, JobStats, JobStore, JobStoreError, UpdateOutcome};
pub use sweeper::{RetentionSweeper, RetentionSweeperHandle, SweepError};
pub use types::{Job, JobOutcome, JobStatus, TransitionError};
