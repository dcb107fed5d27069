//! # Runtime events emitted by the supervisor.
//!
//! [`EventKind`] classifies events across the three phases:
//! - **Launch**: a worker is skipped, starting, started, finished (scripts) or failed to launch
//! - **Supervision**: a worker was lost, restarted, failed to restart, or was fatal
//! - **Shutdown**: the sweep started, a worker was stopped or could not be stopped, sweep done
//!
//! [`Event`] carries the metadata (worker label, pid, reason, delay) and knows
//! its own severity and the human-readable line to log.
//!
//! ## Ordering guarantees
//! Each event has a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind, ProcessId};
//!
//! let ev = Event::new(EventKind::WorkerLost)
//!     .with_worker("API server")
//!     .with_pid(ProcessId::new(4242));
//!
//! assert_eq!(ev.level(), tracing::Level::WARN);
//! assert_eq!(ev.message(), "Process API server with ID 4242 not found. Restarting...");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use tracing::Level;

use crate::process::ProcessId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Launch phase ===
    /// Worker entry cannot be launched (missing or nonexistent path).
    ///
    /// Sets: `worker`, `reason`.
    WorkerSkipped,

    /// About to launch a worker.
    ///
    /// Sets: `worker`.
    WorkerStarting,

    /// Worker launched; `pid` is its process.
    ///
    /// Sets: `worker`, `pid`.
    WorkerStarted,

    /// Interpreter-dispatched worker ran to completion during launch.
    ///
    /// Sets: `worker`, `pid`, `exit_code` (if it exited normally).
    ScriptCompleted,

    /// The OS refused to create the worker's process.
    ///
    /// Sets: `worker`, `reason`.
    LaunchFailed,

    // === Supervision ===
    /// Probe found the worker's process gone; a restart follows.
    ///
    /// Sets: `worker`, `pid` (the stale one), `delay_ms`.
    WorkerLost,

    /// Worker relaunched after being lost.
    ///
    /// Sets: `worker`, `pid` (new), `prev_pid` (stale).
    WorkerRestarted,

    /// Relaunch of a lost worker failed.
    ///
    /// Sets: `worker`, `pid` (stale), `attempt` (consecutive failures), `reason`.
    RestartFailed,

    /// Worker loss is unrecoverable; the supervisor cancels and shuts down.
    ///
    /// Sets: `worker`, `pid`, `reason`.
    WorkerFatal,

    // === Shutdown ===
    /// Shutdown sweep is starting.
    ShutdownRequested,

    /// Worker process killed.
    ///
    /// Sets: `worker`, `pid`.
    WorkerStopped,

    /// Worker process could not be killed (already exited, OS refusal).
    ///
    /// Sets: `worker`, `pid`, `reason`.
    StopFailed,

    /// One-shot worker has no process left to kill.
    ///
    /// Sets: `worker`, `pid`.
    StopSkipped,

    /// Shutdown sweep finished. Always the last event of a run.
    AllStopped,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker label (description, falling back to name or path).
    pub worker: Option<Arc<str>>,
    /// Current process id of the worker.
    pub pid: Option<ProcessId>,
    /// Process id replaced by a restart.
    pub prev_pid: Option<ProcessId>,
    /// Human-readable reason (errors, skip causes).
    pub reason: Option<Arc<str>>,
    /// Delay observed before the next action, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Consecutive attempt count.
    pub attempt: Option<u32>,
    /// Exit code of a completed script.
    pub exit_code: Option<i32>,
}

impl Event {
    /// Creates a new event with the current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            pid: None,
            prev_pid: None,
            reason: None,
            delay_ms: None,
            attempt: None,
            exit_code: None,
        }
    }

    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    #[inline]
    pub fn with_pid(mut self, pid: ProcessId) -> Self {
        self.pid = Some(pid);
        self
    }

    #[inline]
    pub fn with_prev_pid(mut self, pid: ProcessId) -> Self {
        self.prev_pid = Some(pid);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Severity the event is logged at.
    pub fn level(&self) -> Level {
        match self.kind {
            EventKind::WorkerSkipped
            | EventKind::LaunchFailed
            | EventKind::RestartFailed
            | EventKind::WorkerFatal
            | EventKind::StopFailed => Level::ERROR,
            EventKind::WorkerLost => Level::WARN,
            EventKind::StopSkipped => Level::DEBUG,
            EventKind::WorkerStarting
            | EventKind::WorkerStarted
            | EventKind::ScriptCompleted
            | EventKind::WorkerRestarted
            | EventKind::ShutdownRequested
            | EventKind::WorkerStopped
            | EventKind::AllStopped => Level::INFO,
        }
    }

    /// Human-readable log line.
    pub fn message(&self) -> String {
        let worker = self.worker.as_deref().unwrap_or("<unknown worker>");
        let pid = self
            .pid
            .map_or_else(|| "?".to_string(), |p| p.to_string());
        let reason = self.reason.as_deref().unwrap_or("unknown error");

        match self.kind {
            EventKind::WorkerSkipped => reason.to_string(),
            EventKind::WorkerStarting => format!("Starting {worker}"),
            EventKind::WorkerStarted => format!("Started {worker} with Process ID: {pid}"),
            EventKind::ScriptCompleted => match self.exit_code {
                Some(code) => format!("Completed {worker} (Process ID: {pid}) with exit code {code}"),
                None => format!("Completed {worker} (Process ID: {pid}) without exit code"),
            },
            EventKind::LaunchFailed => format!("Failed to start {worker}: {reason}"),
            EventKind::WorkerLost => {
                format!("Process {worker} with ID {pid} not found. Restarting...")
            }
            EventKind::WorkerRestarted => format!("Restarted {worker} with Process ID: {pid}"),
            EventKind::RestartFailed => format!(
                "Failed to restart {worker} (attempt {}): {reason}",
                self.attempt.unwrap_or(1)
            ),
            EventKind::WorkerFatal => {
                format!("Process {worker} with ID {pid} stopped; stopping supervisor: {reason}")
            }
            EventKind::ShutdownRequested => "Supervisor is stopping...".to_string(),
            EventKind::WorkerStopped => format!("Stopped {worker} with Process ID: {pid}"),
            EventKind::StopFailed => {
                format!("An error occurred while stopping {worker} (Process ID: {pid}): {reason}")
            }
            EventKind::StopSkipped => {
                format!("Skipping {worker} (Process ID: {pid}): already completed")
            }
            EventKind::AllStopped => "All workers stopped".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerStarting);
        let b = Event::new(EventKind::WorkerStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn started_line_has_description_and_pid() {
        let ev = Event::new(EventKind::WorkerStarted)
            .with_worker("Billing API")
            .with_pid(ProcessId::new(77));
        assert_eq!(ev.message(), "Started Billing API with Process ID: 77");
        assert_eq!(ev.level(), Level::INFO);
    }

    #[test]
    fn skip_line_is_the_reason() {
        let ev = Event::new(EventKind::WorkerSkipped)
            .with_reason("File path is null. Skipping this worker.");
        assert_eq!(ev.message(), "File path is null. Skipping this worker.");
        assert_eq!(ev.level(), Level::ERROR);
    }

    #[test]
    fn fatal_and_stop_failure_are_errors() {
        assert_eq!(Event::new(EventKind::WorkerFatal).level(), Level::ERROR);
        assert_eq!(Event::new(EventKind::StopFailed).level(), Level::ERROR);
    }
}
