//! Runtime events: types and broadcast bus.
//!
//! Every observable step of the supervisor (launch, probe outcome, restart,
//! shutdown sweep) is published as an [`Event`] on the [`Bus`]. Nothing in the
//! runtime writes log lines directly; the [`LogWriter`](crate::LogWriter)
//! subscriber renders events to `tracing`.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
