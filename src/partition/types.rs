//! Partition types
//!
//! Defines the partition key and the per-run write report.

use crate::dates::parse_strict_date;
use crate::error::{Error, Result};
use crate::types::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Hive-style partition column name
pub const PARTITION_COLUMN: &str = "dt";

/// A `dt` partition key, one per calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    date: NaiveDate,
}

impl PartitionKey {
    /// Key for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Parse a `YYYY-MM-DD` key
    pub fn parse(value: &str) -> Result<Self> {
        parse_strict_date(value)
            .map(Self::from_date)
            .ok_or_else(|| Error::invalid_value(PARTITION_COLUMN, format!("'{value}' is not YYYY-MM-DD")))
    }

    /// The partition's date
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Directory segment, e.g. `dt=2025-11-01`
    pub fn dir_name(&self) -> String {
        format!("{PARTITION_COLUMN}={self}")
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Configuration for the partitioned writer
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Partitions written concurrently (each key by one task)
    pub max_concurrent_writes: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_concurrent_writes: 4,
        }
    }
}

impl WriterOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrent partition write limit
    #[must_use]
    pub fn with_max_concurrent_writes(mut self, max: usize) -> Self {
        self.max_concurrent_writes = max.max(1);
        self
    }
}

/// Rows written per partition key in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub partitions: BTreeMap<PartitionKey, usize>,
}

impl WriteReport {
    /// Record rows written to a key
    pub fn record(&mut self, key: PartitionKey, rows: usize) {
        *self.partitions.entry(key).or_default() += rows;
    }

    /// Rows written to a key
    pub fn rows_for(&self, key: &PartitionKey) -> usize {
        self.partitions.get(key).copied().unwrap_or(0)
    }

    /// Rows written across all keys
    pub fn total_rows(&self) -> usize {
        self.partitions.values().sum()
    }

    /// Number of partitions touched
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}
