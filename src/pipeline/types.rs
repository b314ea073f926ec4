//! Pipeline types
//!
//! Run context, driver states and the run summary.

use crate::dates::ExclusionReason;
use crate::partition::{PartitionKey, WriteReport};
use crate::source::InputScope;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Everything a run needs to know about itself
///
/// Passed into the driver explicitly; nothing here is global.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Partition date for batches without a date column
    pub process_date: NaiveDate,
    /// Where the batch is read from
    pub input: InputScope,
    /// Output root, for reporting
    pub output: String,
    /// Unique id of this run, embedded in output file names
    pub run_id: String,
    /// Worker threads for row normalization
    pub parallelism: usize,
    /// Partitions written concurrently
    pub max_concurrent_writes: usize,
}

impl PipelineContext {
    /// Create a context with a fresh run id
    pub fn new(process_date: NaiveDate, input: InputScope, output: impl Into<String>) -> Self {
        Self {
            process_date,
            input,
            output: output.into(),
            run_id: new_run_id(),
            parallelism: 1,
            max_concurrent_writes: 4,
        }
    }

    /// Set the run id
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Set normalization worker threads
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the concurrent partition write limit
    #[must_use]
    pub fn with_max_concurrent_writes(mut self, max: usize) -> Self {
        self.max_concurrent_writes = max.max(1);
        self
    }
}

/// Generate a run id (32 lowercase hex digits)
pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Driver states, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Start,
    Loaded,
    EmptyExit,
    Reconciled,
    Dated,
    Filtered,
    Identified,
    Partitioned,
    Done,
}

impl PipelineState {
    /// State name as logged and serialized
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Start => "START",
            PipelineState::Loaded => "LOADED",
            PipelineState::EmptyExit => "EMPTY_EXIT",
            PipelineState::Reconciled => "RECONCILED",
            PipelineState::Dated => "DATED",
            PipelineState::Filtered => "FILTERED",
            PipelineState::Identified => "IDENTIFIED",
            PipelineState::Partitioned => "PARTITIONED",
            PipelineState::Done => "DONE",
        }
    }

    /// Whether the run finished successfully
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::EmptyExit)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one run, printed as JSON by the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub process_date: NaiveDate,
    pub state: PipelineState,
    pub files_read: usize,
    pub rows_read: usize,
    /// Input cells with invalid UTF-8, kept with replacement characters
    pub lossy_cells: usize,
    /// Excluded rows by reason (`missing_date`, `unparseable_date`)
    pub rows_excluded: BTreeMap<String, usize>,
    pub coercion_failures: usize,
    pub ids_synthesized: usize,
    pub rows_per_partition: BTreeMap<PartitionKey, usize>,
    pub rows_written: usize,
    pub files_committed: Vec<String>,
    pub duration_ms: u64,
}

impl RunSummary {
    /// Create an empty summary for a run
    pub fn new(ctx: &PipelineContext) -> Self {
        Self {
            run_id: ctx.run_id.clone(),
            process_date: ctx.process_date,
            state: PipelineState::Start,
            files_read: 0,
            rows_read: 0,
            lossy_cells: 0,
            rows_excluded: BTreeMap::new(),
            coercion_failures: 0,
            ids_synthesized: 0,
            rows_per_partition: BTreeMap::new(),
            rows_written: 0,
            files_committed: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Count an excluded row
    pub fn add_exclusion(&mut self, reason: ExclusionReason) {
        *self
            .rows_excluded
            .entry(reason.as_str().to_string())
            .or_default() += 1;
    }

    /// Excluded rows for one reason
    pub fn excluded(&self, reason: ExclusionReason) -> usize {
        self.rows_excluded.get(reason.as_str()).copied().unwrap_or(0)
    }

    /// Excluded rows across all reasons
    pub fn total_excluded(&self) -> usize {
        self.rows_excluded.values().sum()
    }

    /// Record what the partitioned writer reported
    pub fn set_write_report(&mut self, report: WriteReport) {
        self.rows_written = report.total_rows();
        self.rows_per_partition = report.partitions;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
