//! `ageforge-ai`
//!
//! **Responsibility:** boundary to the image transformation provider.
//!
//! This crate is intentionally **not** part of the job system:
//! - It knows nothing about job ids, stores or status.
//! - It turns a profession and an age into a prompt.
//! - It defines the gateway contract the job system calls, and the retry
//!   policy that may be layered on top of any gateway.

pub mod gateway;
pub mod prompt;
pub mod retry;

pub use gateway::{GatewayError, TransformationGateway, TransformationRequest};
pub use prompt::{GENERIC_PROMPT, PromptCatalog};
pub use retry::{BackoffStrategy, RetryPolicy, RetryingGateway};
