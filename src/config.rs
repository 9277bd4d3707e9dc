//! Per-binary configuration, layered env-over-defaults (spec §5), in the shape of
//! `knhk-sidecar`'s `SidecarConfig`: one section struct per concern, a `Default` impl carrying
//! the documented defaults, and a `from_env` constructor that fails fast on missing secrets.

use crate::error::MoniflowError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String, MoniflowError> {
    std::env::var(key).map_err(|_| {
        MoniflowError::ServiceUnavailable(format!("required environment variable {key} is unset"))
    })
}

/// Optional local-development overlay: a TOML file read the same way `SidecarConfig::from_file`
/// reads its own config, for operators who prefer a file over environment variables.
pub fn overlay_from_toml_file<T: serde::de::DeserializeOwned>(path: &str) -> Option<T> {
    let contents = std::fs::read_to_string(path).ok()?;
    toml::from_str(&contents).ok()
}

/// Shared JWT verification settings, used by both the alert API (to mint nothing, it only
/// checks) and the gateway (to verify bearer tokens before proxying).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, MoniflowError> {
        Ok(Self {
            secret_key: require_env("SECRET_KEY")?,
            algorithm: env_string_or("ALGORITHM", "HS256"),
            access_token_expire_minutes: env_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
            refresh_token_expire_days: env_or("REFRESH_TOKEN_EXPIRE_DAYS", 7),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub bind_address: String,
    pub log_batch_size: usize,
    pub log_flush_interval: Duration,
    pub metric_batch_size: usize,
    pub metric_flush_interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8002".to_string(),
            log_batch_size: 100,
            log_flush_interval: Duration::from_secs(5),
            metric_batch_size: 100,
            metric_flush_interval: Duration::from_secs(5),
        }
    }
}

impl CollectorConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_address: env_string_or("COLLECTOR_BIND_ADDRESS", &default.bind_address),
            log_batch_size: env_or("LOG_BATCH_SIZE", default.log_batch_size),
            log_flush_interval: Duration::from_secs(env_or(
                "LOG_FLUSH_INTERVAL",
                default.log_flush_interval.as_secs(),
            )),
            metric_batch_size: env_or("METRIC_BATCH_SIZE", default.metric_batch_size),
            metric_flush_interval: Duration::from_secs(env_or(
                "METRIC_FLUSH_INTERVAL",
                default.metric_flush_interval.as_secs(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertApiConfig {
    pub bind_address: String,
}

impl Default for AlertApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8003".to_string(),
        }
    }
}

impl AlertApiConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_address: env_string_or("ALERT_API_BIND_ADDRESS", &default.bind_address),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub process_metrics_interval: Duration,
    pub fetch_rules_interval: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            process_metrics_interval: Duration::from_secs(30),
            fetch_rules_interval: Duration::from_secs(60),
        }
    }
}

impl EvaluatorConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            process_metrics_interval: Duration::from_secs(env_or(
                "PROCESS_METRICS_INTERVAL_SECONDS",
                default.process_metrics_interval.as_secs(),
            )),
            fetch_rules_interval: Duration::from_secs(env_or(
                "FETCH_ALERT_RULES_INTERVAL_SECONDS",
                default.fetch_rules_interval.as_secs(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub request_timeout: Duration,
    pub rate_limit_per_minute: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout: Duration::from_secs(5),
            rate_limit_per_minute: 10,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_address: env_string_or("GATEWAY_BIND_ADDRESS", &default.bind_address),
            request_timeout: Duration::from_secs(env_or(
                "REQUEST_TIMEOUT_SEC",
                default.request_timeout.as_secs(),
            )),
            rate_limit_per_minute: env_or("GATEWAY_RATE_LIMIT", default.rate_limit_per_minute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_config_defaults_are_stable() {
        let c = CollectorConfig::default();
        assert_eq!(c.log_batch_size, 100);
        assert_eq!(c.metric_flush_interval, Duration::from_secs(5));
    }

    #[test]
    fn gateway_config_defaults_match_spec() {
        let g = GatewayConfig::default();
        assert_eq!(g.rate_limit_per_minute, 10);
        assert_eq!(g.request_timeout, Duration::from_secs(5));
    }
}
