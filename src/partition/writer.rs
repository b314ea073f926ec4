//! Partitioned writer
//!
//! Groups canonical rows by `dt` and hands each group to the sink as one
//! batch. Partitions are independent, so groups are written concurrently;
//! every key is owned by exactly one task.

use super::types::{PartitionKey, WriteReport, WriterOptions};
use crate::error::{Error, Result};
use crate::output::PartitionedSink;
use crate::types::CanonicalRow;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Group rows by partition key, preserving row order within each key
pub fn group_by_partition(rows: Vec<CanonicalRow>) -> BTreeMap<PartitionKey, Vec<CanonicalRow>> {
    let mut groups: BTreeMap<PartitionKey, Vec<CanonicalRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.partition_key()).or_default().push(row);
    }
    groups
}

/// Appends grouped rows to a partitioned sink
pub struct PartitionedWriter {
    sink: Arc<dyn PartitionedSink>,
    options: WriterOptions,
}

impl PartitionedWriter {
    /// Create a writer over a sink
    pub fn new(sink: Arc<dyn PartitionedSink>) -> Self {
        Self {
            sink,
            options: WriterOptions::default(),
        }
    }

    /// Set writer options
    #[must_use]
    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Write rows; the sink decides when appended data becomes visible
    pub async fn write(&self, rows: Vec<CanonicalRow>) -> Result<WriteReport> {
        let groups = group_by_partition(rows);
        debug!(partitions = groups.len(), "grouped rows by partition");

        let results: Vec<(PartitionKey, usize)> = stream::iter(groups)
            .map(|(key, rows)| {
                let sink = Arc::clone(&self.sink);
                async move {
                    let expected = rows.len();
                    let written = sink.append(&key, rows).await?;
                    if written != expected {
                        return Err(Error::sink_write(
                            key.to_string(),
                            format!("sink accepted {written} of {expected} rows"),
                        ));
                    }
                    info!(partition = %key, rows = written, "appended partition");
                    Ok::<_, Error>((key, written))
                }
            })
            .buffer_unordered(self.options.max_concurrent_writes.max(1))
            .try_collect()
            .await?;

        let mut report = WriteReport::default();
        for (key, rows) in results {
            report.record(key, rows);
        }
        Ok(report)
    }
}
