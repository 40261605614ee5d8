//! Connector configuration
//!
//! Settings are a flat string map, the same shape the host framework hands
//! over. Typed accessors apply the defaults listed in [`options`].

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Option keys and their defaults
pub mod options {
    pub const STARROCKS_FENODES: &str = "starrocks.fenodes";
    pub const STARROCKS_BENODES: &str = "starrocks.benodes";
    pub const STARROCKS_TABLE_IDENTIFIER: &str = "starrocks.table.identifier";

    pub const STARROCKS_REQUEST_AUTH_USER: &str = "starrocks.request.auth.user";
    pub const STARROCKS_REQUEST_AUTH_PASSWORD: &str = "starrocks.request.auth.password";

    pub const STARROCKS_REQUEST_CONNECT_TIMEOUT_MS: &str = "starrocks.request.connect.timeout.ms";
    pub const STARROCKS_REQUEST_CONNECT_TIMEOUT_MS_DEFAULT: i64 = 30 * 1000;
    pub const STARROCKS_REQUEST_READ_TIMEOUT_MS: &str = "starrocks.request.read.timeout.ms";
    pub const STARROCKS_REQUEST_READ_TIMEOUT_MS_DEFAULT: i64 = 30 * 1000;
    pub const STARROCKS_REQUEST_RETRIES: &str = "starrocks.request.retries";
    pub const STARROCKS_REQUEST_RETRIES_DEFAULT: i64 = 3;

    pub const STARROCKS_TABLET_SIZE: &str = "starrocks.request.tablet.size";
    pub const STARROCKS_TABLET_SIZE_DEFAULT: i64 = i32::MAX as i64;
    pub const STARROCKS_TABLET_SIZE_MIN: i64 = 1;

    pub const STARROCKS_READ_FIELD: &str = "starrocks.read.field";
    pub const STARROCKS_READ_FIELD_DEFAULT: &str = "*";
    pub const STARROCKS_FILTER_QUERY: &str = "starrocks.filter.query";
}

/// Immutable key/value settings for one connector instance.
///
/// Equality and hashing cover every entry, so two configs with the same
/// settings address the same cached write client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorConfig {
    settings: BTreeMap<String, String>,
}

impl ConnectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs; later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            settings: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse `key=value` strings, e.g. from repeated command-line flags.
    pub fn from_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self> {
        let mut settings = BTreeMap::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment.split_once('=').ok_or_else(|| {
                ConnectorError::InvalidConfig(format!(
                    "expected key=value, got '{}'",
                    assignment
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConnectorError::InvalidConfig(format!(
                    "empty key in '{}'",
                    assignment
                )));
            }
            settings.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { settings })
    }

    /// Load a flat JSON object of string settings.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            ConnectorError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConnectorError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Return a copy with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Overlay `other` on top of this config
    pub fn merge(mut self, other: &ConnectorConfig) -> Self {
        for (key, value) in &other.settings {
            self.settings.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Integer setting; a missing or unparsable value yields `default`.
    /// Surrounding whitespace makes a value unparsable.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(
                        "Parse '{}' to number failed, original string is '{}', use default {}.",
                        key,
                        raw,
                        default
                    );
                    default
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn user(&self) -> &str {
        self.get_or(options::STARROCKS_REQUEST_AUTH_USER, "")
    }

    pub fn password(&self) -> &str {
        self.get_or(options::STARROCKS_REQUEST_AUTH_PASSWORD, "")
    }

    /// Connect timeout; `None` when set to zero or less, meaning no limit.
    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.get_int(
            options::STARROCKS_REQUEST_CONNECT_TIMEOUT_MS,
            options::STARROCKS_REQUEST_CONNECT_TIMEOUT_MS_DEFAULT,
        ))
    }

    /// Read timeout; `None` when set to zero or less, meaning no limit.
    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.get_int(
            options::STARROCKS_REQUEST_READ_TIMEOUT_MS,
            options::STARROCKS_REQUEST_READ_TIMEOUT_MS_DEFAULT,
        ))
    }

    /// Number of attempts per request; negative values mean none.
    pub fn retries(&self) -> usize {
        self.get_int(
            options::STARROCKS_REQUEST_RETRIES,
            options::STARROCKS_REQUEST_RETRIES_DEFAULT,
        )
        .max(0) as usize
    }
}

fn millis(value: i64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_millis(value as u64))
}
