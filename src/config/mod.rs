//! # Runtime configuration.
//!
//! [`SupervisorConfig`] centralizes the supervisor's settings. It is either
//! built in code or loaded, together with the worker list, from a TOML file
//! with [`load`] / [`parse`].
//!
//! ## Sentinel values
//! - `max_restart_attempts = 0` → unlimited relaunch attempts
//! - `restart.delay = 0s` → relaunch immediately

mod schema;

use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::workers::WorkerDefinition;

/// Global configuration for the supervisor runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct SupervisorConfig {
    /// Wait after each launch before processing the next worker definition.
    pub stagger: Duration,

    /// Wait after each successful liveness probe before probing the next worker.
    pub probe_interval: Duration,

    /// Whether and when dead workers are relaunched.
    pub restart: RestartPolicy,

    /// Delay growth while relaunches of the same worker keep failing.
    pub retry: BackoffPolicy,

    /// Consecutive failed relaunches after which a worker is unrecoverable.
    ///
    /// - `0` = unlimited
    pub max_restart_attempts: u32,

    /// Capacity of the event bus ring buffer (min 1).
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns the relaunch limit as an `Option` (`None` = unlimited).
    #[inline]
    pub fn restart_limit(&self) -> Option<u32> {
        match self.max_restart_attempts {
            0 => None,
            n => Some(n),
        }
    }
}

impl Default for SupervisorConfig {
    /// - `stagger = 1s`, `probe_interval = 1s`
    /// - `restart = RestartPolicy::default()` (no automatic restart)
    /// - `retry = BackoffPolicy::default()`
    /// - `max_restart_attempts = 5`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stagger: Duration::from_secs(1),
            probe_interval: Duration::from_secs(1),
            restart: RestartPolicy::default(),
            retry: BackoffPolicy::default(),
            max_restart_attempts: 5,
            bus_capacity: 1024,
        }
    }
}

/// Runtime settings plus the ordered worker list, as read from a config file.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedConfig {
    pub supervisor: SupervisorConfig,
    pub workers: Vec<WorkerDefinition>,
}

/// Reads and parses the configuration file at `path`.
///
/// Relative `app-path`s are resolved against the file's directory.
///
/// # Errors
/// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`] if it
/// is not valid TOML. Unparsable scalar values fall back to defaults instead.
pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let loaded = parse(&contents, base).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(
        path = %path.display(),
        workers = loaded.workers.len(),
        "loaded config"
    );
    Ok(loaded)
}

/// Parses configuration text; relative worker paths are joined onto `base`.
///
/// # Errors
/// Returns the TOML parser's message if `contents` is not valid TOML.
pub fn parse(contents: &str, base: &Path) -> Result<LoadedConfig, String> {
    let file: schema::ConfigFile = toml::from_str(contents).map_err(|e| e.to_string())?;
    Ok(file.into_loaded(base))
}
