//! Interposer configuration.
//!
//! Configuration can be built in code, parsed from TOML, and overridden
//! from environment variables.
//!
//! # Configuration Example
//!
//! ```toml
//! strict_drop = true
//! collect_group_failures = true
//! copy_target_names = true
//! max_reported_calls = 5
//! ```
//!
//! # Environment Overrides
//!
//! - `INTERPOSE_STRICT_DROP`
//! - `INTERPOSE_COLLECT_GROUP_FAILURES`
//! - `INTERPOSE_COPY_TARGET_NAMES`
//! - `INTERPOSE_MAX_REPORTED_CALLS`

use crate::errors::{InterposeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const ENV_STRICT_DROP: &str = "INTERPOSE_STRICT_DROP";
pub const ENV_COLLECT_GROUP_FAILURES: &str = "INTERPOSE_COLLECT_GROUP_FAILURES";
pub const ENV_COPY_TARGET_NAMES: &str = "INTERPOSE_COPY_TARGET_NAMES";
pub const ENV_MAX_REPORTED_CALLS: &str = "INTERPOSE_MAX_REPORTED_CALLS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterposeConfig {
    /// Panic when an interception or group fails validation on drop
    /// (default: true). When false the failure is only logged.
    #[serde(default = "default_strict_drop")]
    pub strict_drop: bool,

    /// Report every failing member of a group instead of the first one
    /// (default: true).
    #[serde(default = "default_collect_group_failures")]
    pub collect_group_failures: bool,

    /// Name default substitutes after the attribute they replace
    /// (default: true).
    #[serde(default = "default_copy_target_names")]
    pub copy_target_names: bool,

    /// Recorded calls listed in a validation failure (default: 5).
    #[serde(default = "default_max_reported_calls")]
    pub max_reported_calls: usize,
}

fn default_strict_drop() -> bool {
    true
}

fn default_collect_group_failures() -> bool {
    true
}

fn default_copy_target_names() -> bool {
    true
}

fn default_max_reported_calls() -> usize {
    5
}

impl Default for InterposeConfig {
    fn default() -> Self {
        Self {
            strict_drop: default_strict_drop(),
            collect_group_failures: default_collect_group_failures(),
            copy_target_names: default_copy_target_names(),
            max_reported_calls: default_max_reported_calls(),
        }
    }
}

impl InterposeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| InterposeError::config(format!("failed to parse config: {}", e)))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            InterposeError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded interpose config from {}", path.display());
        Ok(config)
    }

    /// Apply `INTERPOSE_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, ENV_STRICT_DROP)? {
            self.strict_drop = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_COLLECT_GROUP_FAILURES)? {
            self.collect_group_failures = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_COPY_TARGET_NAMES)? {
            self.copy_target_names = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_MAX_REPORTED_CALLS)? {
            self.max_reported_calls = v;
        }
        Ok(self)
    }

    pub fn strict_drop(mut self, strict: bool) -> Self {
        self.strict_drop = strict;
        self
    }

    pub fn collect_group_failures(mut self, collect: bool) -> Self {
        self.collect_group_failures = collect;
        self
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| InterposeError::config(format!("{}={:?}: {}", key, raw, e)))
        })
        .transpose()
}
