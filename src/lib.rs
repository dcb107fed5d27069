//! # procvisor
//!
//! **procvisor** keeps a fleet of external programs running on one host. It
//! launches each configured worker as a child process, probes their liveness,
//! restarts them according to a global policy, and kills them all on shutdown.
//!
//! ## Architecture
//! ```text
//!   procvisor.toml ──► config::load ──► (SupervisorConfig, Vec<WorkerDefinition>)
//!                                                    │
//!                                                    ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │  Supervisor::run(workers, token)                                      │
//! │                                                                       │
//! │   launch phase ──► Registry [w1, w2, w3]   (declaration order,        │
//! │        │                                    1s stagger)               │
//! │        ▼                                                              │
//! │   Monitor: probe w1 ─ sleep ─ probe w2 ─ sleep ─ probe w3 ─ ...       │
//! │        │      └─ gone: restart after delay | cancel (no auto-restart) │
//! │        ▼                                                              │
//! │   shutdown sweep: kill w1, w2, w3                                     │
//! └──────────┬──────────────────────────────┬─────────────────────────────┘
//!            │ ProcessTable                 │ publish(Event)
//!            ▼                              ▼
//!   OsProcessTable (tokio::process)    Bus ──► SubscriberSet ──► LogWriter (tracing)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                                   |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Launch, probe, restart, shutdown.                        | [`Supervisor`]                              |
//! | **Policies**      | Restart on loss, retry backoff on failed relaunch.       | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Processes**     | OS boundary, direct vs interpreted launch.               | [`ProcessTable`], [`OsProcessTable`], [`Invocation`] |
//! | **Events**        | Every step as an event; logging as a subscriber.         | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Configuration** | TOML file with lenient scalars.                          | [`SupervisorConfig`], [`config::load`]      |
//! | **Errors**        | Typed errors per concern.                                | [`RuntimeError`], [`LaunchError`]           |
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use procvisor::{Supervisor, config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loaded = config::load(Path::new("/etc/procvisor/procvisor.toml"))?;
//!     Supervisor::with_os(loaded.supervisor).serve(loaded.workers).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod core;
mod error;
mod events;
mod policies;
mod process;
mod subscribers;
mod workers;

// ---- Public re-exports ----

pub use config::{LoadedConfig, SupervisorConfig};
pub use core::Supervisor;
pub use error::{
    ConfigError, LaunchError, RuntimeError, TerminateError, WorkerConfigError,
};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
pub use process::{
    Invocation, Launched, Liveness, OsProcessTable, ProcessId, ProcessTable, split_params,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use workers::{WorkerDefinition, WorkerRuntime};
