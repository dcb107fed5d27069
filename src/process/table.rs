//! # Process table: the supervisor's view of the OS.
//!
//! [`ProcessTable`] is the only way the runtime creates, inspects, or kills
//! processes. The supervisor never holds OS handles itself; it holds
//! [`ProcessId`]s and asks the table about them.
//!
//! ## Rules
//! - `probe` is a query: an unknown or exited identifier is [`Liveness::Gone`], never an error.
//! - `terminate` is forceful (no grace period).
//! - Identifiers handed out by one table are never reused by that table while
//!   the previous owner is still tracked.

use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{LaunchError, TerminateError};
use crate::process::Invocation;

/// OS-level process identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of a liveness probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    /// The identifier maps to a running process.
    Alive,
    /// The identifier no longer maps to a running process.
    Gone,
}

/// Outcome of a successful launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launched {
    /// A long-running process was started and is not awaited.
    Running(ProcessId),
    /// An interpreted script ran to completion before the launch returned.
    Completed {
        pid: ProcessId,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
    },
}

impl Launched {
    #[inline]
    pub fn pid(&self) -> ProcessId {
        match *self {
            Launched::Running(pid) | Launched::Completed { pid, .. } => pid,
        }
    }

    #[inline]
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Launched::Completed { .. })
    }
}

/// Contract between the supervisor and the OS process table.
#[async_trait]
pub trait ProcessTable: Send + Sync + 'static {
    /// Starts a process for `invocation`.
    ///
    /// Direct invocations return [`Launched::Running`] immediately. Interpreted
    /// invocations drain the process output and return [`Launched::Completed`]
    /// once it has exited.
    async fn launch(&self, invocation: &Invocation) -> Result<Launched, LaunchError>;

    /// Checks whether `pid` still maps to a running process.
    async fn probe(&self, pid: ProcessId) -> Liveness;

    /// Forcibly kills `pid`.
    async fn terminate(&self, pid: ProcessId) -> Result<(), TerminateError>;
}

/// [`ProcessTable`] backed by `tokio::process`.
///
/// Keeps the [`Child`] handle of every running process it started so that
/// probes reap exited children instead of seeing zombies. A child observed as
/// exited is dropped from the table; later probes report it `Gone` and
/// `terminate` reports it `NotFound`.
#[derive(Default)]
pub struct OsProcessTable {
    children: Mutex<HashMap<ProcessId, Child>>,
}

impl OsProcessTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children currently tracked as running.
    pub async fn tracked(&self) -> usize {
        self.children.lock().await.len()
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.args()).stdin(Stdio::null());
        if invocation.is_interpreted() {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd
    }
}

#[async_trait]
impl ProcessTable for OsProcessTable {
    async fn launch(&self, invocation: &Invocation) -> Result<Launched, LaunchError> {
        let program = invocation.program();
        let child = Self::command(invocation)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;
        let pid = child
            .id()
            .map(ProcessId::new)
            .ok_or_else(|| LaunchError::NoPid {
                program: program.clone(),
            })?;

        if invocation.is_interpreted() {
            let output = child
                .wait_with_output()
                .await
                .map_err(|source| LaunchError::Wait {
                    program: program.clone(),
                    source,
                })?;
            tracing::debug!(
                %pid,
                program = %program,
                stdout_bytes = output.stdout.len(),
                stderr_bytes = output.stderr.len(),
                "script finished"
            );
            return Ok(Launched::Completed {
                pid,
                code: output.status.code(),
            });
        }

        self.children.lock().await.insert(pid, child);
        Ok(Launched::Running(pid))
    }

    async fn probe(&self, pid: ProcessId) -> Liveness {
        let mut children = self.children.lock().await;
        let Some(child) = children.get_mut(&pid) else {
            return Liveness::Gone;
        };
        match child.try_wait() {
            Ok(None) => Liveness::Alive,
            Ok(Some(status)) => {
                tracing::debug!(%pid, %status, "child exited");
                children.remove(&pid);
                Liveness::Gone
            }
            Err(e) => {
                tracing::debug!(%pid, error = %e, "child status unavailable");
                children.remove(&pid);
                Liveness::Gone
            }
        }
    }

    async fn terminate(&self, pid: ProcessId) -> Result<(), TerminateError> {
        let mut child = self
            .children
            .lock()
            .await
            .remove(&pid)
            .ok_or(TerminateError::NotFound(pid))?;

        if let Ok(Some(_)) = child.try_wait() {
            return Err(TerminateError::NotFound(pid));
        }
        child
            .kill()
            .await
            .map_err(|source| TerminateError::Kill { pid, source })
    }
}
