//! Dispatcher configuration
//!
//! [`DispatchConfig`] is plain data: hosts can deserialize it from their own
//! configuration files, read it from the environment with
//! [`DispatchConfig::from_env`], or set fields through
//! [`DispatcherBuilder`](crate::DispatcherBuilder).
//!
//! | Variable | Field | Values |
//! |---|---|---|
//! | `JRPC_BATCH_LIMIT` | `batch_limit` | integer >= 1 |
//! | `JRPC_BATCH_FAILURE` | `batch_failure` | `continue`, `stop` |
//! | `JRPC_VALIDATE_OUTPUT` | `validate_output` | `true`, `false`, `1`, `0` |
//! | `JRPC_ERROR_EXPOSURE` | `error_exposure` | `redacted`, `detailed` |
//! | `JRPC_STATUS_POLICY` | `status_policy` | `per_kind`, `always_ok` |

use crate::batch::BatchFailure;
use crate::renderer::StatusPolicy;
use jrpc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default maximum number of items in a batch
pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// How much of an unexpected failure reaches the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorExposure {
    /// Generic "Internal error" message, no data
    #[default]
    Redacted,
    /// Failure message and detail in `data` (development only)
    Detailed,
}

impl FromStr for ErrorExposure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redacted" => Ok(Self::Redacted),
            "detailed" => Ok(Self::Detailed),
            other => Err(Error::Config(format!("unknown error exposure: {}", other))),
        }
    }
}

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Largest accepted batch
    pub batch_limit: usize,
    /// What happens to the rest of a batch after a failed item
    pub batch_failure: BatchFailure,
    /// Check callback results against declared output schemas
    pub validate_output: bool,
    /// Detail level of internal errors
    pub error_exposure: ErrorExposure,
    /// HTTP status convention for errors
    pub status_policy: StatusPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            batch_failure: BatchFailure::default(),
            validate_output: false,
            error_exposure: ErrorExposure::default(),
            status_policy: StatusPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Read settings from `JRPC_*` environment variables
    ///
    /// Unset variables keep their default; malformed ones fail with
    /// `Error::Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(value) = read("JRPC_BATCH_LIMIT") {
            config.batch_limit = value
                .parse()
                .map_err(|_| Error::Config(format!("JRPC_BATCH_LIMIT must be an integer: {}", value)))?;
        }
        if let Some(value) = read("JRPC_BATCH_FAILURE") {
            config.batch_failure = value.parse()?;
        }
        if let Some(value) = read("JRPC_VALIDATE_OUTPUT") {
            config.validate_output = parse_bool(&value)
                .ok_or_else(|| Error::Config(format!("JRPC_VALIDATE_OUTPUT must be a boolean: {}", value)))?;
        }
        if let Some(value) = read("JRPC_ERROR_EXPOSURE") {
            config.error_exposure = value.parse()?;
        }
        if let Some(value) = read("JRPC_STATUS_POLICY") {
            config.status_policy = value.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<()> {
        if self.batch_limit == 0 {
            return Err(Error::Config("batch_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_defaults() {
        let config = DispatchConfig::from_lookup(lookup(&[])).expect("config should parse");
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.batch_limit, 100);
        assert_eq!(config.batch_failure, BatchFailure::Continue);
        assert!(!config.validate_output);
        assert_eq!(config.error_exposure, ErrorExposure::Redacted);
        assert_eq!(config.status_policy, StatusPolicy::PerKind);
    }

    #[test]
    fn parse_all_variables() {
        let config = DispatchConfig::from_lookup(lookup(&[
            ("JRPC_BATCH_LIMIT", "5"),
            ("JRPC_BATCH_FAILURE", "stop"),
            ("JRPC_VALIDATE_OUTPUT", "1"),
            ("JRPC_ERROR_EXPOSURE", "Detailed"),
            ("JRPC_STATUS_POLICY", "always_ok"),
        ]))
        .expect("config should parse");

        assert_eq!(config.batch_limit, 5);
        assert_eq!(config.batch_failure, BatchFailure::Stop);
        assert!(config.validate_output);
        assert_eq!(config.error_exposure, ErrorExposure::Detailed);
        assert_eq!(config.status_policy, StatusPolicy::AlwaysOk);
    }

    #[test]
    fn zero_batch_limit_fails() {
        let err = DispatchConfig::from_lookup(lookup(&[("JRPC_BATCH_LIMIT", "0")]))
            .expect_err("expected invalid limit");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_values_fail() {
        for (key, value) in [
            ("JRPC_BATCH_LIMIT", "many"),
            ("JRPC_BATCH_FAILURE", "retry"),
            ("JRPC_VALIDATE_OUTPUT", "maybe"),
            ("JRPC_ERROR_EXPOSURE", "verbose"),
            ("JRPC_STATUS_POLICY", "teapot"),
        ] {
            let err = DispatchConfig::from_lookup(lookup(&[(key, value)]))
                .expect_err("expected config error");
            assert!(matches!(err, Error::Config(_)), "{}={}", key, value);
        }
    }

    #[test]
    fn deserialize_partial() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{"batch_limit": 10, "status_policy": "always_ok"}"#).unwrap();
        assert_eq!(config.batch_limit, 10);
        assert_eq!(config.status_policy, StatusPolicy::AlwaysOk);
        assert_eq!(config.batch_failure, BatchFailure::Continue);
    }
}
