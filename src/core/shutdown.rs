//! # Shutdown coordinator.
//!
//! Kills every registered worker, in registry order, with no grace period.
//!
//! ```text
//! ShutdownRequested
//! for worker in registry:
//!   ├─ one-shot           → StopSkipped
//!   ├─ terminate(pid) Ok  → WorkerStopped
//!   └─ terminate(pid) Err → StopFailed   (sweep continues)
//! AllStopped
//! ```

use crate::core::registry::Registry;
use crate::events::{Bus, Event, EventKind};
use crate::process::ProcessTable;

/// Terminates all workers in `registry` and publishes the sweep's events.
pub(crate) async fn sweep<P>(registry: &Registry, table: &P, bus: &Bus)
where
    P: ProcessTable + ?Sized,
{
    bus.publish(Event::new(EventKind::ShutdownRequested));

    for worker in registry.iter() {
        let pid = worker.pid();
        let ev = if worker.is_one_shot() {
            Event::new(EventKind::StopSkipped)
        } else {
            match table.terminate(pid).await {
                Ok(()) => Event::new(EventKind::WorkerStopped),
                Err(e) => Event::new(EventKind::StopFailed).with_reason(e.to_string()),
            }
        };
        bus.publish(ev.with_worker(worker.label()).with_pid(pid));
    }

    bus.publish(Event::new(EventKind::AllStopped));
}
