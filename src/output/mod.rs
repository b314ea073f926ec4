//! Output module
//!
//! Lands canonical rows as date-partitioned Parquet files.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting canonical rows to Arrow RecordBatches and back
//! - Encoding Parquet files in memory
//! - Object storage locations (local, S3, R2, GCS, Azure)
//! - The `PartitionedSink` trait with Parquet and in-memory sinks

mod cloud;
mod parquet_sink;
mod schema;
mod sink;
mod writer;

pub use cloud::StorageLocation;
pub use parquet_sink::{ParquetSink, STAGING_DIR, SUCCESS_MARKER};
pub use schema::{
    canonical_column_names, record_batch_to_rows, rows_to_record_batch, CanonicalSchema,
    ExtraColumn,
};
pub use sink::{MemorySink, PartitionedSink};
pub use writer::{batch_to_parquet_bytes, read_parquet_bytes, ParquetWriterConfig};
