//! Restart and retry policies.
//!
//! ## Contents
//! - [`RestartPolicy`] whether a dead worker is relaunched, and after what delay
//! - [`BackoffPolicy`] how the delay grows while restart launches keep failing
//! - [`JitterPolicy`]  randomization applied to backoff delays
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig { restart: RestartPolicy, retry: BackoffPolicy, max_restart_attempts }
//!      └─► core::monitor uses:
//!           - restart.automatic to decide restart vs. shutdown
//!           - restart.delay_before(failures, &retry) before relaunching
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::default()` → automatic restart off, zero delay.
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=60s, jitter=None.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
