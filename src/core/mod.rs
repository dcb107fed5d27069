//! Runtime core: the supervision engine.
//!
//! The only public API from this module is [`Supervisor`].
//!
//! Internal modules:
//! - [`registry`]: ordered worker records and the staggered launch phase;
//! - [`monitor`]: the probe/restart loop;
//! - [`shutdown`]: the terminate-everything sweep;
//! - [`signals`]: OS stop signals for [`Supervisor::serve`];
//! - [`supervisor`]: wires the phases together.

mod monitor;
mod registry;
mod shutdown;
mod signals;
mod supervisor;

pub use supervisor::Supervisor;
