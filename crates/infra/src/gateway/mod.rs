//! External service clients/adapters.

pub mod replicate;

pub use replicate::ReplicateGateway;
