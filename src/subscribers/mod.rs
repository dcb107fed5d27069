//! # Event subscribers.
//!
//! ```text
//! monitor / registry / shutdown ── publish(Event) ──► Bus ──► supervisor listener
//!                                                                  │
//!                                                            SubscriberSet::emit
//!                                                         ┌────────┴────────┐
//!                                                         ▼                 ▼
//!                                                     LogWriter          custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use procvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct RestartCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for RestartCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::WorkerRestarted {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
