//! Error types used by the procvisor runtime.
//!
//! Each concern has its own enum:
//!
//! - [`ConfigError`]: the configuration file cannot be read or parsed.
//! - [`WorkerConfigError`]: one worker entry cannot be launched (skipped, not fatal).
//! - [`LaunchError`]: the OS refused to create a process.
//! - [`TerminateError`]: a process could not be killed during shutdown.
//! - [`RuntimeError`]: the supervisor itself stopped abnormally.
//!
//! All of them expose `as_label` for stable snake_case labels in log fields.

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessId;

/// Errors raised while loading the configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected layout.
    #[error("failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse { .. } => "config_parse",
        }
    }
}

/// A single worker entry that cannot be launched.
///
/// Recovered locally: the worker is skipped and the others proceed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerConfigError {
    /// `app-path` is absent or empty.
    #[error("File path is null. Skipping this worker.")]
    MissingPath,

    /// `app-path` does not point at an existing file.
    #[error("File path {} does not exist. Skipping this worker.", .0.display())]
    PathNotFound(PathBuf),
}

impl WorkerConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerConfigError::MissingPath => "worker_path_missing",
            WorkerConfigError::PathNotFound(_) => "worker_path_not_found",
        }
    }
}

/// The OS refused to create (or wait for) a process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Process creation failed.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was created but reported no identifier.
    #[error("spawned {program} but the OS reported no process id")]
    NoPid { program: String },

    /// Draining a script interpreter's output failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn as_label(&self) -> &'static str {
        match self {
            LaunchError::Spawn { .. } => "launch_spawn",
            LaunchError::NoPid { .. } => "launch_no_pid",
            LaunchError::Wait { .. } => "launch_wait",
        }
    }
}

/// A process could not be terminated.
///
/// Logged during the shutdown sweep; never aborts it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TerminateError {
    /// The identifier no longer maps to a live process.
    #[error("process {0} not found")]
    NotFound(ProcessId),

    /// The kill request itself failed.
    #[error("failed to kill process {pid}: {source}")]
    Kill {
        pid: ProcessId,
        #[source]
        source: std::io::Error,
    },
}

impl TerminateError {
    pub fn as_label(&self) -> &'static str {
        match self {
            TerminateError::NotFound(_) => "terminate_not_found",
            TerminateError::Kill { .. } => "terminate_kill",
        }
    }
}

/// Errors that end a supervisor run abnormally.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A worker died while automatic restart is disabled.
    #[error("worker {worker} (pid {pid}) stopped and automatic restart is disabled")]
    WorkerLost { worker: String, pid: ProcessId },

    /// A worker could not be relaunched within the allowed number of attempts.
    #[error("worker {worker} failed to restart {attempts} times in a row")]
    RestartExhausted { worker: String, attempts: u32 },

    /// OS signal handlers could not be installed.
    #[error("failed to install shutdown signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::{ProcessId, RuntimeError};
    ///
    /// let err = RuntimeError::WorkerLost { worker: "api".into(), pid: ProcessId::new(42) };
    /// assert_eq!(err.as_label(), "runtime_worker_lost");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::WorkerLost { .. } => "runtime_worker_lost",
            RuntimeError::RestartExhausted { .. } => "runtime_restart_exhausted",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}
