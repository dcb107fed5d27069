//! # Worker data model.
//!
//! - [`WorkerDefinition`] - immutable description of one configured program
//! - [`WorkerRuntime`] - mutable record of a launched worker (definition + current pid)

mod definition;
mod runtime;

pub use definition::WorkerDefinition;
pub use runtime::WorkerRuntime;
