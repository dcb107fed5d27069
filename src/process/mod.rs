//! OS process boundary.
//!
//! Everything that touches the OS process table lives here:
//! - [`Invocation`] decides how a worker's executable is started (direct or via an interpreter);
//! - [`ProcessTable`] is the seam the supervisor talks to (launch / probe / terminate);
//! - [`OsProcessTable`] is the production implementation on top of `tokio::process`;
//! - [`launch`] is the Process Launcher operation used by the registry and the monitor.

mod invocation;
mod launcher;
mod table;

pub use invocation::{Invocation, split_params};
pub use launcher::launch;
pub use table::{Launched, Liveness, OsProcessTable, ProcessId, ProcessTable};
