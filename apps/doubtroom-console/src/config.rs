//! Environment-backed runtime configuration for `doubtroom-console`.

use std::{env, error::Error, fmt};

use room_core::RetryPolicy;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_RECONNECT_BASE_MS: u64 = 400;
const DEFAULT_RECONNECT_MAX_MS: u64 = 15_000;
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Runtime configuration used by the console client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubtroomConfig {
    /// Backend base URL; REST lives under `/api`, the push channel under `/ws`.
    pub backend_url: Url,
    /// Base delay for live-channel reconnect backoff.
    pub reconnect_base_ms: u64,
    /// Ceiling for live-channel reconnect backoff.
    pub reconnect_max_ms: u64,
    /// Event broadcast buffer depth.
    pub event_buffer: usize,
}

impl DoubtroomConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let backend_raw = optional_trimmed_env("DOUBTROOM_BACKEND_URL", &mut lookup)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let backend_url = Url::parse(&backend_raw).map_err(|err| ConfigError::InvalidValue {
            key: "DOUBTROOM_BACKEND_URL",
            value: backend_raw.clone(),
            reason: err.to_string(),
        })?;

        let reconnect_base_ms = parse_optional_u64(
            "DOUBTROOM_RECONNECT_BASE_MS",
            DEFAULT_RECONNECT_BASE_MS,
            &mut lookup,
        )?;
        let reconnect_max_ms = parse_optional_u64(
            "DOUBTROOM_RECONNECT_MAX_MS",
            DEFAULT_RECONNECT_MAX_MS,
            &mut lookup,
        )?;

        let event_buffer = parse_optional_u64(
            "DOUBTROOM_EVENT_BUFFER",
            DEFAULT_EVENT_BUFFER as u64,
            &mut lookup,
        )?;
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOUBTROOM_EVENT_BUFFER",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        if reconnect_base_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOUBTROOM_RECONNECT_BASE_MS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if reconnect_max_ms < reconnect_base_ms {
            return Err(ConfigError::InvalidValue {
                key: "DOUBTROOM_RECONNECT_MAX_MS",
                value: reconnect_max_ms.to_string(),
                reason: "must be at least the base delay".to_owned(),
            });
        }

        Ok(Self {
            backend_url,
            reconnect_base_ms,
            reconnect_max_ms,
            event_buffer: event_buffer as usize,
        })
    }

    /// Reconnect backoff policy for the sync runtime.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.reconnect_base_ms, self.reconnect_max_ms)
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u64<F>(
    key: &'static str,
    default: u64,
    lookup: &mut F,
) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}
