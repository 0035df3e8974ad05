//! `ageforge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! job identifiers, the domain error model and the validated submission value.

pub mod error;
pub mod id;
pub mod submission;

pub use error::{DomainError, DomainResult};
pub use id::JobId;
pub use submission::{DEFAULT_TARGET_AGE, MAX_TARGET_AGE, Submission};
