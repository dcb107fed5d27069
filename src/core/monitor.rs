//! # Monitor: the supervision loop.
//!
//! Probes every worker in registry order, relaunches dead ones per
//! [`RestartPolicy`](crate::RestartPolicy), and turns an unrecoverable loss into
//! global cancellation.
//!
//! ## State machine
//! ```text
//!            ┌──────────────────────── pass ────────────────────────┐
//! Running ──►│ for worker in registry (one-shot workers skipped):   │
//!   ▲        │   probe(pid)                                         │
//!   │        │    ├─ Alive → sleep(probe_interval)                  │
//!   │        │    └─ Gone                                           │
//!   │        │        ├─ automatic=false → WorkerFatal ─────────────┼──► cancel ─► Stopping
//!   │        │        └─ automatic=true                             │
//!   │        │             ├─ WorkerLost (warn)                     │
//!   │        │             ├─ sleep(delay_before(failures))         │
//!   │        │             └─ launch                                │
//!   │        │                  ├─ Ok  → WorkerRestarted            │
//!   │        │                  └─ Err → RestartFailed              │
//!   │        │                       └─ limit reached → WorkerFatal ┼──► cancel ─► Stopping
//!   │        └──────────────────────────────────────────────────────┘
//!   └── next pass (after one probe_interval if the pass never slept)
//!
//! token cancelled at any check or during any sleep ──────────────────────► Stopping
//! ```
//!
//! ## Rules
//! - Probes are sequential; a pass never reorders workers.
//! - Every sleep races the cancellation token; a cancelled pass is abandoned.
//! - A fatal loss abandons the rest of the pass: later workers are not probed.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::core::registry::Registry;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::process::{self, Liveness, ProcessTable};
use crate::workers::WorkerRuntime;

/// How a single probe pass ended.
enum Pass {
    /// Every worker was visited; `slept` is false if the pass never waited.
    Completed { slept: bool },
    Cancelled,
    Fatal(RuntimeError),
}

/// What happened to one worker during a pass.
enum Step {
    Continue { slept: bool },
    Cancelled,
    Fatal(RuntimeError),
}

/// Supervision loop over a launched [`Registry`].
pub(crate) struct Monitor<'a, P: ?Sized> {
    table: &'a P,
    bus: &'a Bus,
    cfg: &'a SupervisorConfig,
}

impl<'a, P> Monitor<'a, P>
where
    P: ProcessTable + ?Sized,
{
    pub(crate) fn new(table: &'a P, bus: &'a Bus, cfg: &'a SupervisorConfig) -> Self {
        Self { table, bus, cfg }
    }

    /// Runs probe passes until `token` is cancelled or a loss is unrecoverable.
    ///
    /// On an unrecoverable loss the token is cancelled here and the error is
    /// returned; external cancellation returns `None`.
    pub(crate) async fn run(
        &self,
        registry: &mut Registry,
        token: &CancellationToken,
    ) -> Option<RuntimeError> {
        while !token.is_cancelled() {
            match self.pass(registry, token).await {
                Pass::Completed { slept: true } => {}
                Pass::Completed { slept: false } => {
                    if !sleep_or_cancel(self.cfg.probe_interval, token).await {
                        return None;
                    }
                }
                Pass::Cancelled => return None,
                Pass::Fatal(err) => {
                    token.cancel();
                    return Some(err);
                }
            }
        }
        None
    }

    async fn pass(&self, registry: &mut Registry, token: &CancellationToken) -> Pass {
        let mut slept = false;
        for worker in registry.iter_mut() {
            if token.is_cancelled() {
                return Pass::Cancelled;
            }
            if worker.is_one_shot() {
                continue;
            }
            match self.step(worker, token).await {
                Step::Continue { slept: s } => slept |= s,
                Step::Cancelled => return Pass::Cancelled,
                Step::Fatal(err) => return Pass::Fatal(err),
            }
        }
        Pass::Completed { slept }
    }

    async fn step(&self, worker: &mut WorkerRuntime, token: &CancellationToken) -> Step {
        let pid = worker.pid();
        match self.table.probe(pid).await {
            Liveness::Alive => {
                if sleep_or_cancel(self.cfg.probe_interval, token).await {
                    Step::Continue { slept: true }
                } else {
                    Step::Cancelled
                }
            }
            Liveness::Gone if !self.cfg.restart.automatic => {
                self.bus.publish(
                    Event::new(EventKind::WorkerFatal)
                        .with_worker(worker.label())
                        .with_pid(pid)
                        .with_reason("process not found and automatic restart is disabled"),
                );
                Step::Fatal(RuntimeError::WorkerLost {
                    worker: worker.label().to_string(),
                    pid,
                })
            }
            Liveness::Gone => self.restart(worker, token).await,
        }
    }

    async fn restart(&self, worker: &mut WorkerRuntime, token: &CancellationToken) -> Step {
        let stale = worker.pid();
        let delay = self
            .cfg
            .restart
            .delay_before(worker.restart_failures(), &self.cfg.retry);

        self.bus.publish(
            Event::new(EventKind::WorkerLost)
                .with_worker(worker.label())
                .with_pid(stale)
                .with_delay(delay),
        );
        if !sleep_or_cancel(delay, token).await {
            return Step::Cancelled;
        }

        match process::launch(self.table, worker.path(), worker.definition()).await {
            Ok(launched) => {
                worker.restarted(launched);
                self.bus.publish(
                    Event::new(EventKind::WorkerRestarted)
                        .with_worker(worker.label())
                        .with_pid(worker.pid())
                        .with_prev_pid(stale),
                );
            }
            Err(e) => {
                let failures = worker.restart_failed();
                self.bus.publish(
                    Event::new(EventKind::RestartFailed)
                        .with_worker(worker.label())
                        .with_pid(stale)
                        .with_attempt(failures)
                        .with_reason(e.to_string()),
                );
                if self.cfg.restart_limit().is_some_and(|max| failures >= max) {
                    self.bus.publish(
                        Event::new(EventKind::WorkerFatal)
                            .with_worker(worker.label())
                            .with_pid(stale)
                            .with_attempt(failures)
                            .with_reason("restart attempts exhausted"),
                    );
                    return Step::Fatal(RuntimeError::RestartExhausted {
                        worker: worker.label().to_string(),
                        attempts: failures,
                    });
                }
            }
        }
        Step::Continue {
            slept: !delay.is_zero(),
        }
    }
}

/// Sleeps for `dur`; returns `false` if `token` was cancelled first.
async fn sleep_or_cancel(dur: Duration, token: &CancellationToken) -> bool {
    select! {
        _ = time::sleep(dur) => true,
        _ = token.cancelled() => false,
    }
}
