//! Partitioning module
//!
//! Single-level, date-based partitioning of canonical rows.
//!
//! # Overview
//!
//! - `PartitionKey` - the `dt=YYYY-MM-DD` key derived from `order_date`
//! - `PartitionedWriter` - groups rows and appends one batch per key
//! - `WriteReport` - rows written per key

mod types;
mod writer;

pub use types::{PartitionKey, WriteReport, WriterOptions, PARTITION_COLUMN};
pub use writer::{group_by_partition, PartitionedWriter};

#[cfg(test)]
mod tests;
