//! # Process Launcher.
//!
//! Turns a [`WorkerDefinition`] into a running process through a [`ProcessTable`].
//! Used by the launch phase and by the monitor when restarting a worker, so both
//! paths start a worker exactly the same way.

use std::path::Path;

use crate::error::LaunchError;
use crate::process::{Invocation, Launched, ProcessTable};
use crate::workers::WorkerDefinition;

/// Launches `def` and returns the started process.
///
/// The caller has already validated the executable path; this only resolves
/// the invocation shape and hands it to the table. `LaunchError` is returned
/// as-is; whether it is fatal is the caller's decision.
pub async fn launch<P>(
    table: &P,
    path: &Path,
    def: &WorkerDefinition,
) -> Result<Launched, LaunchError>
where
    P: ProcessTable + ?Sized,
{
    let invocation = Invocation::resolve(path, def.params());
    tracing::debug!(
        worker = def.label(),
        program = %invocation.program(),
        args = ?invocation.args(),
        interpreted = invocation.is_interpreted(),
        "launching"
    );
    table.launch(&invocation).await
}
