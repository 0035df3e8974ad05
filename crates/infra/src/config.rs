//! Configuration loading and representation.
//!
//! Everything comes from environment variables (optionally seeded from a `.env`
//! file by the binary). Missing variables fall back to defaults; present but
//! unparsable ones are an error.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use ageforge_ai::RetryPolicy;

use crate::jobs::RetentionSweeper;

pub const DEFAULT_REPLICATE_URL: &str = "https://api.replicate.com/v1/predictions";
pub const DEFAULT_MODEL_VERSION: &str = "google/imagen-4";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Top-level process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub gateway: GatewayConfig,
    pub retention: RetentionConfig,
}

/// Settings for the transformation provider.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model_version: String,
    pub image_dimensions: String,
    pub num_outputs: u32,
    pub num_inference_steps: u32,
    pub timeout: Duration,
    /// Retries layered over the gateway. Defaults to none.
    pub retry: RetryPolicy,
}

impl GatewayConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_REPLICATE_URL.to_string(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            image_dimensions: "768x768".to_string(),
            num_outputs: 1,
            num_inference_steps: 50,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::no_retry(),
        }
    }
}

// Never print the credential.
impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &if self.has_credentials() { "<redacted>" } else { "<unset>" })
            .field("endpoint", &self.endpoint)
            .field("model_version", &self.model_version)
            .field("image_dimensions", &self.image_dimensions)
            .field("num_outputs", &self.num_outputs)
            .field("num_inference_steps", &self.num_inference_steps)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Job retention settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    pub window: Duration,
    pub sweep_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl RetentionConfig {
    pub fn sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(self.sweep_interval, self.window)
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map instead of the environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GatewayConfig::default();

        let max_retries: u32 = parse(&lookup, "GATEWAY_MAX_RETRIES", 0)?;
        let retry_base_ms: u64 = parse(&lookup, "GATEWAY_RETRY_BASE_MS", 500)?;
        let retry = if max_retries == 0 {
            RetryPolicy::no_retry()
        } else {
            RetryPolicy::exponential(
                max_retries,
                Duration::from_millis(retry_base_ms),
                Duration::from_secs(30),
            )
        };

        let gateway = GatewayConfig {
            api_key: lookup("REPLICATE_API_KEY").unwrap_or_default(),
            endpoint: lookup("REPLICATE_API_URL").unwrap_or(defaults.endpoint),
            model_version: lookup("REPLICATE_MODEL_VERSION").unwrap_or(defaults.model_version),
            image_dimensions: lookup("REPLICATE_IMAGE_DIMENSIONS")
                .unwrap_or(defaults.image_dimensions),
            num_outputs: defaults.num_outputs,
            num_inference_steps: parse(
                &lookup,
                "REPLICATE_INFERENCE_STEPS",
                defaults.num_inference_steps,
            )?,
            timeout: Duration::from_secs(parse(
                &lookup,
                "GATEWAY_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            retry,
        };

        let retention_hours: u64 = parse(&lookup, "JOB_RETENTION_HOURS", 24)?;
        let window = retention_hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::Invalid {
                key: "JOB_RETENTION_HOURS",
                value: retention_hours.to_string(),
            })?;
        let retention = RetentionConfig {
            window,
            sweep_interval: Duration::from_secs(parse(&lookup, "JOB_SWEEP_INTERVAL_SECS", 3600)?),
        };
        if retention.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "JOB_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse(
                &lookup,
                "AGEFORGE_BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 8080)),
            )?,
            max_upload_bytes: parse(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            gateway,
            retention,
        })
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();

        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(cfg.retention, RetentionConfig::default());
        assert_eq!(cfg.gateway.endpoint, DEFAULT_REPLICATE_URL);
        assert_eq!(cfg.gateway.model_version, DEFAULT_MODEL_VERSION);
        assert_eq!(cfg.gateway.num_inference_steps, 50);
        assert_eq!(cfg.gateway.retry, RetryPolicy::no_retry());
        assert!(!cfg.gateway.has_credentials());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("AGEFORGE_BIND_ADDR", "127.0.0.1:9000"),
            ("REPLICATE_API_KEY", "r8_secret"),
            ("GATEWAY_TIMEOUT_SECS", "15"),
            ("GATEWAY_MAX_RETRIES", "3"),
            ("JOB_RETENTION_HOURS", "2"),
            ("JOB_SWEEP_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(cfg.gateway.has_credentials());
        assert_eq!(cfg.gateway.timeout, Duration::from_secs(15));
        assert_eq!(cfg.gateway.retry.max_attempts, 3);
        assert_eq!(cfg.retention.window, Duration::from_secs(2 * 60 * 60));
        assert_eq!(cfg.retention.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn garbage_is_reported_with_its_key() {
        let err = load(&[("GATEWAY_TIMEOUT_SECS", "soon")]).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "GATEWAY_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn retention_hours_that_overflow_seconds_are_rejected() {
        let err = load(&[("JOB_RETENTION_HOURS", "18446744073709551615")]).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "JOB_RETENTION_HOURS",
                value: "18446744073709551615".to_string()
            }
        );
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        assert!(load(&[("JOB_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let cfg = load(&[("REPLICATE_API_KEY", "r8_secret")]).unwrap();
        let printed = format!("{:?}", cfg.gateway);

        assert!(!printed.contains("r8_secret"));
        assert!(printed.contains("<redacted>"));
    }
}
