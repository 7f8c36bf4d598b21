//! Engine configuration.
//!
//! Limits guarding the recursive graph walk and the redaction policy for secret
//! parameters. The configuration is read from `~/.config/teller/engine.yaml` (or the
//! file named by `TELLER_CONFIG_PATH`); a missing file yields the defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "TELLER_CONFIG_PATH";

/// Default filename inside the `teller` configuration directory.
pub const CONFIG_FILE_NAME: &str = "engine.yaml";

const DEFAULT_MAX_DEPTH: usize = 64;
const DEFAULT_MAX_STEPS: usize = 1024;
const DEFAULT_MAX_INDIRECTION_DEPTH: usize = 32;
const DEFAULT_REDACTION_MASK: &str = "****";

/// Upper bound for the recursive limits (`max_depth`, `max_indirection_depth`).
///
/// Both walks recurse on the call stack, so larger values could overflow it before
/// the limit trips.
pub const MAX_RECURSION_LIMIT: usize = 256;

/// Tunable limits and redaction policy for [`WorkflowEngine`](crate::WorkflowEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest transition path a run may take before it is treated as cyclic.
    pub max_depth: usize,
    /// Total number of step visits allowed in one run.
    pub max_steps: usize,
    /// Longest parameter indirection chain followed before giving up.
    pub max_indirection_depth: usize,
    /// Parameter names whose values never reach the execution log.
    pub secret_params: Vec<String>,
    /// Placeholder written in place of secret values.
    pub redaction_mask: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: DEFAULT_MAX_STEPS,
            max_indirection_depth: DEFAULT_MAX_INDIRECTION_DEPTH,
            secret_params: vec!["pin".to_string()],
            redaction_mask: DEFAULT_REDACTION_MASK.to_string(),
        }
    }
}

/// Raised when a configuration file parses but carries unusable values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("'{field}' must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("'{field}' cannot exceed {max} (found {value})")]
    LimitTooLarge { field: &'static str, value: usize, max: usize },

    #[error("'redaction_mask' cannot be empty")]
    EmptyMask,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_depth", self.max_depth),
            ("max_steps", self.max_steps),
            ("max_indirection_depth", self.max_indirection_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }
        for (field, value) in [
            ("max_depth", self.max_depth),
            ("max_indirection_depth", self.max_indirection_depth),
        ] {
            if value > MAX_RECURSION_LIMIT {
                return Err(ConfigError::LimitTooLarge {
                    field,
                    value,
                    max: MAX_RECURSION_LIMIT,
                });
            }
        }
        if self.redaction_mask.is_empty() {
            return Err(ConfigError::EmptyMask);
        }
        Ok(())
    }
}

/// Returns the default path for the engine configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(path.trim());
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("teller").join(CONFIG_FILE_NAME)
}

/// Loads the configuration from the default path.
pub fn load_config() -> anyhow::Result<EngineConfig> {
    load_config_from_path(&default_config_path())
}

/// Loads the configuration from a YAML or JSON file, falling back to defaults when absent.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(path).with_context(|| format!("failed to read engine config: {}", path.display()))?;
    let config: EngineConfig =
        serde_yaml::from_str(&content).with_context(|| format!("failed to parse engine config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid engine config: {}", path.display()))?;
    Ok(config)
}

fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
