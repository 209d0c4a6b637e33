//! Configuration types and validation.
//!
//! Every field is optional so a partial (or absent) config file works; the
//! `effective_*` accessors fill in defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths::{PathError, data_root, temp_root};

/// Default lifetime of the kernelspec root-paths cache tier.
pub const DEFAULT_ROOT_PATHS_TTL_SECS: u64 = 60;

/// Default limit for a single interpreter invocation.
pub const DEFAULT_INTERPRETER_TIMEOUT_SECS: u64 = 30;

/// File name of the deployed data-dir probe script.
pub const PROBE_SCRIPT_NAME: &str = "print_jupyter_data_dir.py";

const STATE_FILE_NAME: &str = "state.json";
const DEFAULT_ENV_FILE: &str = ".env";

/// Engine and adapter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KernelPathsConfig {
    /// Root for temporary files (fallback runtime dir, temp registrations).
    pub temp_dir: Option<PathBuf>,

    /// JSON file backing the durable store.
    pub state_file: Option<PathBuf>,

    /// `.env` file merged into the process environment.
    pub env_file: Option<PathBuf>,

    /// Extra `.env` file applied only when running Python code.
    pub python_env_file: Option<PathBuf>,

    /// Location of the data-dir probe script.
    pub probe_script: Option<PathBuf>,

    /// Lifetime of the kernelspec root-paths cache, in seconds.
    pub root_paths_ttl_secs: Option<u64>,

    /// Limit for a single interpreter invocation, in seconds.
    pub interpreter_timeout_secs: Option<u64>,

    /// Lifetime of cached environment snapshots, in seconds; 0 disables expiry.
    pub env_cache_secs: Option<u64>,
}

impl KernelPathsConfig {
    /// Create a config with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            temp_dir: None,
            state_file: None,
            env_file: None,
            python_env_file: None,
            probe_script: None,
            root_paths_ttl_secs: Some(DEFAULT_ROOT_PATHS_TTL_SECS),
            interpreter_timeout_secs: Some(DEFAULT_INTERPRETER_TIMEOUT_SECS),
            env_cache_secs: Some(0),
        }
    }

    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::with_defaults()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        Self::from_json(&contents).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }

    /// Get the effective temp root.
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(temp_root)
    }

    /// Get the effective state file, under the application data root by default.
    pub fn effective_state_file(&self) -> Result<PathBuf, PathError> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_root()?.join(STATE_FILE_NAME)),
        }
    }

    /// Get the effective env file (`./.env` by default).
    pub fn effective_env_file(&self) -> PathBuf {
        self.env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
    }

    /// Get the effective probe script location, under the temp root by default.
    pub fn effective_probe_script(&self) -> PathBuf {
        self.probe_script
            .clone()
            .unwrap_or_else(|| self.effective_temp_dir().join(PROBE_SCRIPT_NAME))
    }

    #[must_use]
    pub fn root_paths_ttl(&self) -> Duration {
        Duration::from_secs(
            self.root_paths_ttl_secs
                .unwrap_or(DEFAULT_ROOT_PATHS_TTL_SECS),
        )
    }

    #[must_use]
    pub fn interpreter_timeout(&self) -> Duration {
        Duration::from_secs(
            self.interpreter_timeout_secs
                .unwrap_or(DEFAULT_INTERPRETER_TIMEOUT_SECS),
        )
    }

    /// Environment snapshot lifetime; `None` means snapshots never expire.
    #[must_use]
    pub fn env_cache_ttl(&self) -> Option<Duration> {
        self.env_cache_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Configuration loading or validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Root paths cache lifetime must be at least 1 second")]
    ZeroRootPathsTtl,

    #[error("Interpreter timeout must be at least 1 second")]
    ZeroInterpreterTimeout,

    #[error("{0} cannot be empty")]
    EmptyPath(&'static str),
}

/// Validate configuration values.
pub fn validate_config(config: &KernelPathsConfig) -> Result<(), ConfigError> {
    if config.root_paths_ttl_secs == Some(0) {
        return Err(ConfigError::ZeroRootPathsTtl);
    }

    if config.interpreter_timeout_secs == Some(0) {
        return Err(ConfigError::ZeroInterpreterTimeout);
    }

    let paths = [
        ("temp_dir", &config.temp_dir),
        ("state_file", &config.state_file),
        ("env_file", &config.env_file),
        ("python_env_file", &config.python_env_file),
        ("probe_script", &config.probe_script),
    ];
    for (name, path) in paths {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyPath(name));
        }
    }

    Ok(())
}
