//! # Worker definition.
//!
//! [`WorkerDefinition`] is what configuration yields for each `[[workers]]`
//! entry. Every field is optional at this level: a definition without a usable
//! executable path is still a valid value, it just never gets launched.
//!
//! ## Example
//! ```rust
//! use procvisor::WorkerDefinition;
//!
//! let def = WorkerDefinition::new("/usr/local/bin/api")
//!     .with_name("api")
//!     .with_description("API server")
//!     .with_params("--port 8080");
//!
//! assert_eq!(def.label(), "API server");
//! assert_eq!(def.params(), Some("--port 8080"));
//! ```

use std::path::{Path, PathBuf};

use crate::error::WorkerConfigError;

/// Immutable worker definition sourced from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerDefinition {
    name: Option<String>,
    description: Option<String>,
    path: Option<PathBuf>,
    params: Option<String>,
}

impl WorkerDefinition {
    /// Creates a definition for the executable at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Creates a definition with no executable path.
    pub fn without_path() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw argument string (`None` when absent or blank).
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Text used to identify the worker in log lines.
    ///
    /// Description first, then name, then the executable path.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .or_else(|| self.path.as_deref().and_then(Path::to_str))
            .unwrap_or("<unnamed worker>")
    }

    /// Returns the executable path if it is set and exists on disk.
    ///
    /// # Errors
    /// - [`WorkerConfigError::MissingPath`] if the path is absent or empty;
    /// - [`WorkerConfigError::PathNotFound`] if nothing exists at the path.
    pub fn resolve_path(&self) -> Result<&Path, WorkerConfigError> {
        let path = self
            .path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(WorkerConfigError::MissingPath)?;
        if path.exists() {
            Ok(path)
        } else {
            Err(WorkerConfigError::PathNotFound(path.to_path_buf()))
        }
    }
}
