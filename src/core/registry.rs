//! # Worker registry and launch phase.
//!
//! The registry is the ordered list of [`WorkerRuntime`]s. It is filled once by
//! [`Registry::launch`] and then owned by the single supervision control flow,
//! so it needs no locking.
//!
//! ## Launch phase
//! ```text
//! for def in definitions (declaration order):
//!   ├─ path missing / not on disk → WorkerSkipped (error), next def, no stagger
//!   ├─ WorkerStarting
//!   ├─ launch(def)
//!   │    ├─ Ok(Running)   → WorkerStarted   → push runtime
//!   │    ├─ Ok(Completed) → ScriptCompleted → push runtime (one-shot)
//!   │    └─ Err           → LaunchFailed (not registered)
//!   └─ sleep(stagger) (cancellable; cancellation ends the phase)
//! ```
//!
//! ## Rules
//! - Iteration order equals declaration order.
//! - Skipped or failed definitions never enter the registry and are not retried.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::process::{self, Launched, ProcessId, ProcessTable};
use crate::workers::{WorkerDefinition, WorkerRuntime};

/// Ordered collection of launched workers.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    workers: Vec<WorkerRuntime>,
}

impl Registry {
    /// Runs the launch phase over `defs` and returns the populated registry.
    ///
    /// Returns early (with whatever was launched so far) when `token` is
    /// cancelled during a stagger wait.
    pub(crate) async fn launch<P>(
        defs: Vec<WorkerDefinition>,
        table: &P,
        bus: &Bus,
        stagger: Duration,
        token: &CancellationToken,
    ) -> Self
    where
        P: ProcessTable + ?Sized,
    {
        let mut registry = Self::default();

        for def in defs {
            if token.is_cancelled() {
                break;
            }
            let path = match def.resolve_path() {
                Ok(path) => path.to_path_buf(),
                Err(e) => {
                    bus.publish(
                        Event::new(EventKind::WorkerSkipped)
                            .with_worker(def.label())
                            .with_reason(e.to_string()),
                    );
                    continue;
                }
            };

            bus.publish(Event::new(EventKind::WorkerStarting).with_worker(def.label()));
            match process::launch(table, &path, &def).await {
                Ok(launched) => {
                    publish_launched(bus, &def, launched);
                    registry.workers.push(WorkerRuntime::new(def, path, launched));
                }
                Err(e) => {
                    bus.publish(
                        Event::new(EventKind::LaunchFailed)
                            .with_worker(def.label())
                            .with_reason(e.to_string()),
                    );
                }
            }

            select! {
                _ = time::sleep(stagger) => {}
                _ = token.cancelled() => break,
            }
        }
        registry
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WorkerRuntime> {
        self.workers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut WorkerRuntime> {
        self.workers.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.len()
    }

    /// Current pids in registry order.
    pub(crate) fn pids(&self) -> Vec<ProcessId> {
        self.workers.iter().map(WorkerRuntime::pid).collect()
    }
}

fn publish_launched(bus: &Bus, def: &WorkerDefinition, launched: Launched) {
    let ev = match launched {
        Launched::Running(pid) => Event::new(EventKind::WorkerStarted).with_pid(pid),
        Launched::Completed { pid, code } => Event::new(EventKind::ScriptCompleted)
            .with_pid(pid)
            .with_exit_code(code),
    };
    bus.publish(ev.with_worker(def.label()));
}
