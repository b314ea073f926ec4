// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Orders ETL
//!
//! Normalizes daily batches of loosely structured order records into one
//! canonical schema and lands them as date-partitioned Parquet.
//!
//! ## Features
//!
//! - **Schema Reconciliation**: declarative alias table, case-insensitive column matching
//! - **Permissive Coercion**: bad numeric cells become null and are counted, rows survive
//! - **Date Partitioning**: strict `YYYY-MM-DD` dates or a batch-wide process date
//! - **Identifier Synthesis**: deterministic `{customer}_{date}_{seq}` order ids
//! - **Append-only Output**: staged Parquet part files committed per run (local, S3, R2, GCS, Azure)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orders_etl::output::MemorySink;
//! use orders_etl::pipeline::{PipelineContext, PipelineDriver};
//! use orders_etl::source::{CsvSource, InputScope};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> orders_etl::Result<()> {
//!     let ctx = PipelineContext::new(process_date, InputScope::new("./incoming"), "memory");
//!     let driver = PipelineDriver::new(Arc::new(CsvSource::new()), Arc::new(MemorySink::new()));
//!     let summary = driver.run(&ctx).await?;
//!     println!("{} rows written", summary.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │  Source  │ → │ Reconcile │ → │  Dates  │ → │ Identity │ → │ Partition │ → │   Sink   │
//! ├──────────┤   ├───────────┤   ├─────────┤   ├──────────┤   ├───────────┤   ├──────────┤
//! │ CSV/GZ   │   │ Aliases   │   │ Strict  │   │ Reuse id │   │ dt=…      │   │ Parquet  │
//! │ Memory   │   │ Coercion  │   │ Fallback│   │ Sequence │   │ Per-key   │   │ Staging  │
//! │          │   │ Pass-thru │   │ Exclude │   │          │   │ tasks     │   │ Commit   │
//! └──────────┘   └───────────┘   └─────────┘   └──────────┘   └───────────┘   └──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Row model shared by every stage
pub mod types;

/// Schema reconciliation
pub mod reconcile;

/// Partition date resolution
pub mod dates;

/// Order identifier synthesis
pub mod identity;

/// Date partitioning
pub mod partition;

/// Batch sources
pub mod source;

/// Arrow/Parquet output and sinks
pub mod output;

/// Pipeline driver
pub mod pipeline;

/// Pipeline configuration
pub mod config;

/// Split and augmentation utilities
pub mod tools;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use pipeline::{PipelineContext, PipelineDriver, PipelineState, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
