//! Pipeline module
//!
//! Orchestrates one run: load, reconcile, date, filter, identify,
//! partition, commit.
//!
//! # Overview
//!
//! - `PipelineContext` - explicit run parameters (process date, scopes, run id, tunables)
//! - `PipelineDriver` - the state machine over a `BatchSource` and a `PartitionedSink`
//! - `RunSummary` - counts reported at the end of a run

mod driver;
mod types;

pub use driver::{PipelineDriver, CHUNK_SIZE};
pub use types::{new_run_id, PipelineContext, PipelineState, RunSummary};

#[cfg(test)]
mod tests;
