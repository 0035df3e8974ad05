//! Infrastructure layer: job system, gateway adapters, configuration.

pub mod config;
pub mod gateway;
pub mod jobs;

pub use config::{AppConfig, ConfigError, GatewayConfig, RetentionConfig};
