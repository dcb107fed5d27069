//! # Supervisor: launch, supervise, shut down.
//!
//! The [`Supervisor`] owns the event bus, the subscribers, the process table and
//! the runtime configuration. [`Supervisor::run`] is the single entry point: it
//! runs the three phases in order and returns when the run is over.
//!
//! ## High-level architecture
//! ```text
//! run(workers, token)
//!   ├─ subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   │
//!   ├─ launch phase:   Registry::launch(workers, stagger)         (sequential)
//!   ├─ supervision:    Monitor::run(&mut registry, token)         (until cancel / fatal)
//!   ├─ shutdown:       shutdown::sweep(&registry)                 (kill in order)
//!   │
//!   └─ wait for the listener to deliver AllStopped and drain subscribers
//!
//! cancellation sources:
//!   - caller cancels `token` (serve(): OS signal)
//!   - Monitor cancels `token` on an unrecoverable worker loss
//! ```
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use procvisor::{RestartPolicy, Supervisor, SupervisorConfig, WorkerDefinition};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig {
//!         restart: RestartPolicy::automatic(Duration::from_millis(500)),
//!         ..SupervisorConfig::default()
//!     };
//!
//!     let workers = vec![
//!         WorkerDefinition::new("/usr/local/bin/api")
//!             .with_description("API server")
//!             .with_params("--port 8080"),
//!     ];
//!
//!     Supervisor::with_os(cfg).serve(workers).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::core::{monitor::Monitor, registry::Registry, shutdown, signals::ShutdownSignal};
use crate::error::RuntimeError;
use crate::events::{Bus, EventKind};
use crate::process::{OsProcessTable, ProcessTable};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};
use crate::workers::WorkerDefinition;

/// Launches workers, keeps them alive, and tears them down.
pub struct Supervisor {
    cfg: SupervisorConfig,
    table: Arc<dyn ProcessTable>,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    /// Creates a supervisor over `table` with the given subscribers.
    pub fn new(
        cfg: SupervisorConfig,
        table: Arc<dyn ProcessTable>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        Self {
            cfg,
            table,
            bus,
            subscribers,
        }
    }

    /// Supervisor over real OS processes, logging through [`LogWriter`].
    pub fn with_os(cfg: SupervisorConfig) -> Self {
        Self::new(
            cfg,
            Arc::new(OsProcessTable::new()),
            vec![Arc::new(LogWriter::new())],
        )
    }

    /// Event bus; subscribe before [`run`](Self::run) to observe a whole run.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Runs `workers` until `token` is cancelled or a worker loss is unrecoverable.
    ///
    /// Always ends with the shutdown sweep, whichever way the run ended.
    ///
    /// # Errors
    /// - [`RuntimeError::WorkerLost`] if a worker died with automatic restart disabled;
    /// - [`RuntimeError::RestartExhausted`] if a worker could not be relaunched
    ///   within `max_restart_attempts`.
    ///
    /// In both cases `token` has been cancelled. External cancellation returns `Ok(())`.
    pub async fn run(
        &self,
        workers: Vec<WorkerDefinition>,
        token: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let listener = self.subscriber_listener();
        let table = self.table.as_ref();

        let mut registry =
            Registry::launch(workers, table, &self.bus, self.cfg.stagger, &token).await;
        tracing::debug!(workers = registry.len(), pids = ?registry.pids(), "launch phase done");

        let fatal = if token.is_cancelled() {
            None
        } else {
            Monitor::new(table, &self.bus, &self.cfg)
                .run(&mut registry, &token)
                .await
        };

        shutdown::sweep(&registry, table, &self.bus).await;
        if let Err(e) = listener.await {
            tracing::warn!(error = %e, "event listener ended abnormally");
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Like [`run`](Self::run), with OS termination signals as the external stop.
    ///
    /// # Errors
    /// [`RuntimeError::Signal`] if the signal listeners cannot be installed,
    /// otherwise whatever [`run`](Self::run) returns.
    pub async fn serve(&self, workers: Vec<WorkerDefinition>) -> Result<(), RuntimeError> {
        let mut signal = ShutdownSignal::install().map_err(RuntimeError::Signal)?;
        let token = CancellationToken::new();

        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    res = signal.recv() => {
                        match res {
                            Ok(()) => tracing::info!("stop signal received"),
                            Err(e) => tracing::error!(error = %e, "stop signal listener failed"),
                        }
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        };

        let res = self.run(workers, token.clone()).await;
        token.cancel();
        let _ = watcher.await;
        res
    }

    /// Forwards bus events to the subscribers until `AllStopped`, then drains them.
    fn subscriber_listener(&self) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone());

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind == EventKind::AllStopped {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::NamedTempFile;
    use tokio::sync::broadcast;
    use tokio::time::{self, Instant};

    use crate::error::{LaunchError, TerminateError};
    use crate::events::Event;
    use crate::policies::RestartPolicy;
    use crate::process::{Invocation, Launched, Liveness, ProcessId};

    /// In-memory process table. Pids start at 100 and are never reused.
    struct FakeTable {
        next_pid: AtomicU32,
        refusing: AtomicBool,
        alive: Mutex<HashSet<ProcessId>>,
        launches: Mutex<Vec<(String, ProcessId, Instant)>>,
        probes: Mutex<Vec<(ProcessId, Instant)>>,
        terminates: Mutex<Vec<ProcessId>>,
    }

    impl FakeTable {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                next_pid: AtomicU32::new(100),
                refusing: AtomicBool::new(false),
                alive: Mutex::new(HashSet::new()),
                launches: Mutex::new(Vec::new()),
                probes: Mutex::new(Vec::new()),
                terminates: Mutex::new(Vec::new()),
            })
        }

        fn kill_externally(&self, pid: ProcessId) {
            self.alive.lock().unwrap().remove(&pid);
        }

        fn refuse_launches(&self) {
            self.refusing.store(true, Ordering::SeqCst);
        }

        fn launch_times(&self) -> Vec<Instant> {
            self.launches.lock().unwrap().iter().map(|l| l.2).collect()
        }

        fn probed_pids(&self) -> Vec<ProcessId> {
            self.probes.lock().unwrap().iter().map(|p| p.0).collect()
        }
    }

    #[async_trait]
    impl ProcessTable for FakeTable {
        async fn launch(&self, inv: &Invocation) -> Result<Launched, LaunchError> {
            if self.refusing.load(Ordering::SeqCst) {
                return Err(LaunchError::NoPid {
                    program: inv.program(),
                });
            }
            let pid = ProcessId::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
            self.launches
                .lock()
                .unwrap()
                .push((inv.program(), pid, Instant::now()));
            if inv.is_interpreted() {
                return Ok(Launched::Completed { pid, code: Some(0) });
            }
            self.alive.lock().unwrap().insert(pid);
            Ok(Launched::Running(pid))
        }

        async fn probe(&self, pid: ProcessId) -> Liveness {
            self.probes.lock().unwrap().push((pid, Instant::now()));
            if self.alive.lock().unwrap().contains(&pid) {
                Liveness::Alive
            } else {
                Liveness::Gone
            }
        }

        async fn terminate(&self, pid: ProcessId) -> Result<(), TerminateError> {
            self.terminates.lock().unwrap().push(pid);
            if self.alive.lock().unwrap().remove(&pid) {
                Ok(())
            } else {
                Err(TerminateError::NotFound(pid))
            }
        }
    }

    fn supervisor(table: &Arc<FakeTable>, cfg: SupervisorConfig) -> Supervisor {
        let table: Arc<dyn ProcessTable> = table.clone();
        Supervisor::new(cfg, table, Vec::new())
    }

    fn binaries(n: usize) -> Vec<NamedTempFile> {
        (0..n).map(|_| NamedTempFile::new().unwrap()).collect()
    }

    fn worker(file: &NamedTempFile, label: &str) -> WorkerDefinition {
        WorkerDefinition::new(file.path()).with_description(label)
    }

    fn cancel_after(token: &CancellationToken, after: Duration) {
        let token = token.clone();
        tokio::spawn(async move {
            time::sleep(after).await;
            token.cancel();
        });
    }

    fn kill_after(table: &Arc<FakeTable>, pid: u32, after: Duration) {
        let table = table.clone();
        tokio::spawn(async move {
            time::sleep(after).await;
            table.kill_externally(ProcessId::new(pid));
        });
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn of_kind(events: &[Event], kind: EventKind) -> Vec<&Event> {
        events.iter().filter(|e| e.kind == kind).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn lost_worker_is_restarted_after_delay() {
        let files = binaries(3);
        let table = FakeTable::new();
        let sup = supervisor(
            &table,
            SupervisorConfig {
                restart: RestartPolicy::automatic(Duration::from_millis(500)),
                ..SupervisorConfig::default()
            },
        );
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();

        kill_after(&table, 101, Duration::from_millis(3500));
        cancel_after(&token, Duration::from_secs(10));

        let workers = vec![worker(&files[0], "w1"), worker(&files[1], "w2"), worker(&files[2], "w3")];
        sup.run(workers, token).await.unwrap();

        let events = drain(&mut rx);
        let lost = of_kind(&events, EventKind::WorkerLost);
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].worker.as_deref(), Some("w2"));
        assert_eq!(lost[0].pid, Some(ProcessId::new(101)));

        let restarted = of_kind(&events, EventKind::WorkerRestarted);
        assert_eq!(restarted.len(), 1);
        assert_eq!(restarted[0].worker.as_deref(), Some("w2"));
        assert_eq!(restarted[0].prev_pid, Some(ProcessId::new(101)));
        assert_eq!(restarted[0].pid, Some(ProcessId::new(103)));

        let detected = table
            .probes
            .lock()
            .unwrap()
            .iter()
            .find(|(pid, _)| *pid == ProcessId::new(101) && !table.alive.lock().unwrap().contains(pid))
            .map(|(_, at)| *at);
        let relaunched = table.launch_times()[3];
        let gap = relaunched - detected.unwrap();
        assert!(gap >= Duration::from_millis(500), "relaunched after {gap:?}");

        assert!(of_kind(&events, EventKind::WorkerFatal).is_empty());
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::AllStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn loss_without_restart_stops_everything() {
        let files = binaries(2);
        let table = FakeTable::new();
        let sup = supervisor(&table, SupervisorConfig::default());
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();

        kill_after(&table, 100, Duration::from_millis(1500));

        let workers = vec![worker(&files[0], "w1"), worker(&files[1], "w2")];
        let err = sup.run(workers, token.clone()).await.unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::WorkerLost { ref worker, pid } if worker == "w1" && pid == ProcessId::new(100)
        ));
        assert!(token.is_cancelled());
        assert_eq!(table.probed_pids(), vec![ProcessId::new(100)]);
        assert_eq!(
            *table.terminates.lock().unwrap(),
            vec![ProcessId::new(100), ProcessId::new(101)]
        );

        let events = drain(&mut rx);
        assert_eq!(of_kind(&events, EventKind::WorkerFatal).len(), 1);
        assert!(of_kind(&events, EventKind::WorkerRestarted).is_empty());

        let failed = of_kind(&events, EventKind::StopFailed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].worker.as_deref(), Some("w1"));
        let stopped = of_kind(&events, EventKind::WorkerStopped);
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].worker.as_deref(), Some("w2"));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_without_path_is_skipped_without_stagger() {
        let files = binaries(2);
        let table = FakeTable::new();
        let sup = supervisor(&table, SupervisorConfig::default());
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(2500));

        let start = Instant::now();
        let workers = vec![
            worker(&files[0], "first"),
            WorkerDefinition::without_path().with_description("nothing"),
            worker(&files[1], "third"),
        ];
        sup.run(workers, token).await.unwrap();

        let offsets: Vec<Duration> = table.launch_times().iter().map(|t| *t - start).collect();
        assert_eq!(offsets, vec![Duration::ZERO, Duration::from_secs(1)]);

        let events = drain(&mut rx);
        let skipped = of_kind(&events, EventKind::WorkerSkipped);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].message(), "File path is null. Skipping this worker.");
        assert_eq!(skipped[0].level(), tracing::Level::ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_relaunch_backs_off_until_exhausted() {
        let files = binaries(1);
        let table = FakeTable::new();
        let sup = supervisor(
            &table,
            SupervisorConfig {
                restart: RestartPolicy::automatic(Duration::from_millis(200)),
                max_restart_attempts: 3,
                ..SupervisorConfig::default()
            },
        );
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();

        {
            let table = table.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(1500)).await;
                table.refuse_launches();
                table.kill_externally(ProcessId::new(100));
            });
        }

        let err = sup.run(vec![worker(&files[0], "flaky")], token.clone()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::RestartExhausted { attempts: 3, .. }));
        assert!(token.is_cancelled());

        let events = drain(&mut rx);
        let attempts: Vec<Option<u32>> = of_kind(&events, EventKind::RestartFailed)
            .iter()
            .map(|e| e.attempt)
            .collect();
        assert_eq!(attempts, vec![Some(1), Some(2), Some(3)]);

        let delays: Vec<Option<u64>> = of_kind(&events, EventKind::WorkerLost)
            .iter()
            .map(|e| e.delay_ms)
            .collect();
        assert_eq!(delays, vec![Some(200), Some(1000), Some(2000)]);
        assert_eq!(of_kind(&events, EventKind::WorkerFatal).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn external_cancel_kills_all_and_returns_ok() {
        let files = binaries(2);
        let table = FakeTable::new();
        let sup = supervisor(&table, SupervisorConfig::default());
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_secs(5));

        let workers = vec![worker(&files[0], "a"), worker(&files[1], "b")];
        sup.run(workers, token).await.unwrap();

        assert!(table.alive.lock().unwrap().is_empty());
        let events = drain(&mut rx);
        assert_eq!(of_kind(&events, EventKind::WorkerStopped).len(), 2);
        assert!(of_kind(&events, EventKind::StopFailed).is_empty());

        let tail: Vec<EventKind> = events.iter().rev().take(4).map(|e| e.kind).collect();
        assert_eq!(
            tail,
            vec![
                EventKind::AllStopped,
                EventKind::WorkerStopped,
                EventKind::WorkerStopped,
                EventKind::ShutdownRequested,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completed_script_is_neither_probed_nor_killed() {
        let script = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        let files = binaries(1);
        let table = FakeTable::new();
        let sup = supervisor(&table, SupervisorConfig::default());
        let mut rx = sup.bus().subscribe();
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_secs(4));

        let workers = vec![worker(&script, "setup"), worker(&files[0], "daemon")];
        sup.run(workers, token).await.unwrap();

        let probed = table.probed_pids();
        assert!(!probed.is_empty());
        assert!(probed.iter().all(|pid| *pid == ProcessId::new(101)));
        assert_eq!(*table.terminates.lock().unwrap(), vec![ProcessId::new(101)]);

        let events = drain(&mut rx);
        assert_eq!(of_kind(&events, EventKind::ScriptCompleted).len(), 1);
        let skipped = of_kind(&events, EventKind::StopSkipped);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].pid, Some(ProcessId::new(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_launch_phase_still_sweeps() {
        let files = binaries(3);
        let table = FakeTable::new();
        let sup = supervisor(&table, SupervisorConfig::default());
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(1500));

        let workers = vec![worker(&files[0], "a"), worker(&files[1], "b"), worker(&files[2], "c")];
        sup.run(workers, token).await.unwrap();

        assert_eq!(table.launch_times().len(), 2);
        assert!(table.probed_pids().is_empty());
        assert_eq!(
            *table.terminates.lock().unwrap(),
            vec![ProcessId::new(100), ProcessId::new(101)]
        );
    }
}
