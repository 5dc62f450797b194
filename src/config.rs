//! Client and store configuration.
//!
//! Both configs have usable defaults, deserialize from any serde format with
//! missing fields defaulted, and can be read from `MANAGED_STORE_*`
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BASE_URL_VAR: &str = "MANAGED_STORE_BASE_URL";
pub const TIMEOUT_MS_VAR: &str = "MANAGED_STORE_TIMEOUT_MS";
pub const HISTORY_LIMIT_VAR: &str = "MANAGED_STORE_HISTORY_LIMIT";
pub const FETCH_FAILURE_VAR: &str = "MANAGED_STORE_FETCH_FAILURE";

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix joined with every request path, e.g. `http://host/api`.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `None` disables it.
    pub timeout_ms: Option<u64>,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Defaults overridden by `MANAGED_STORE_BASE_URL` and
    /// `MANAGED_STORE_TIMEOUT_MS` (0 disables the timeout).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = read_var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(timeout_ms) = parse_var::<u64>(TIMEOUT_MS_VAR)? {
            config.timeout_ms = (timeout_ms > 0).then_some(timeout_ms);
        }
        Ok(config)
    }
}

/// What `fetch_all` does to state when the list call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailurePolicy {
    /// Empty the collection and record that as a snapshot, so the failed
    /// fetch can be undone back to the previous state.
    #[default]
    RecordEmpty,
    /// Leave the collection and history as they were.
    KeepHistory,
}

impl FromStr for FetchFailurePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "record_empty" | "record-empty" | "empty" => Ok(Self::RecordEmpty),
            "keep_history" | "keep-history" | "keep" => Ok(Self::KeepHistory),
            _ => Err("expected one of: record_empty, keep_history".to_string()),
        }
    }
}

/// Settings for a `CollectionStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of snapshots kept. `None` or `Some(0)` keeps every
    /// snapshot.
    pub history_limit: Option<usize>,
    pub fetch_failure: FetchFailurePolicy,
}

impl StoreConfig {
    /// Cap history at `limit` snapshots; 0 means unbounded.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = (limit > 0).then_some(limit);
        self
    }

    /// The effective cap, with 0 read as unbounded.
    pub fn effective_history_limit(&self) -> Option<usize> {
        self.history_limit.filter(|limit| *limit > 0)
    }

    pub fn with_fetch_failure(mut self, policy: FetchFailurePolicy) -> Self {
        self.fetch_failure = policy;
        self
    }

    /// Defaults overridden by `MANAGED_STORE_HISTORY_LIMIT` (0 means
    /// unbounded) and `MANAGED_STORE_FETCH_FAILURE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(limit) = parse_var::<usize>(HISTORY_LIMIT_VAR)? {
            config.history_limit = (limit > 0).then_some(limit);
        }
        if let Some(policy) = parse_var::<FetchFailurePolicy>(FETCH_FAILURE_VAR)? {
            config.fetch_failure = policy;
        }
        Ok(config)
    }
}

fn read_var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            debug!("{key} not set, using default");
            None
        }
    }
}

fn parse_var<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    read_var(key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
