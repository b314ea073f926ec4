//! Partitioned sink abstraction
//!
//! A sink receives one batch of rows per partition key and makes them
//! visible only on `commit`. `abort` discards anything staged.

use crate::error::{Error, Result};
use crate::partition::PartitionKey;
use crate::types::CanonicalRow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Physical writer for date-partitioned output
#[async_trait]
pub trait PartitionedSink: Send + Sync {
    /// Stage rows for one partition, returning the number of rows accepted
    async fn append(&self, key: &PartitionKey, rows: Vec<CanonicalRow>) -> Result<usize>;

    /// Publish everything staged in this run, returning the committed paths
    async fn commit(&self) -> Result<Vec<String>>;

    /// Discard everything staged in this run
    async fn abort(&self) -> Result<()>;
}

/// In-memory sink
///
/// Committed rows accumulate across runs, so appending the same batch twice
/// yields duplicates just like the Parquet sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    staged: RwLock<BTreeMap<PartitionKey, Vec<CanonicalRow>>>,
    committed: RwLock<BTreeMap<PartitionKey, Vec<CanonicalRow>>>,
    fail_on: Option<PartitionKey>,
    fail_commit: bool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every append to the given partition
    #[must_use]
    pub fn failing_on(mut self, key: PartitionKey) -> Self {
        self.fail_on = Some(key);
        self
    }

    /// Fail every commit, leaving staged rows in place for `abort`
    #[must_use]
    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Committed rows for a partition
    pub async fn partition(&self, key: &PartitionKey) -> Vec<CanonicalRow> {
        self.committed
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Committed partition keys in order
    pub async fn partitions(&self) -> Vec<PartitionKey> {
        self.committed.read().await.keys().copied().collect()
    }

    /// All committed rows, ordered by partition
    pub async fn committed_rows(&self) -> Vec<CanonicalRow> {
        self.committed
            .read()
            .await
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of rows staged but not yet committed
    pub async fn staged_count(&self) -> usize {
        self.staged.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl PartitionedSink for MemorySink {
    async fn append(&self, key: &PartitionKey, rows: Vec<CanonicalRow>) -> Result<usize> {
        if self.fail_on.as_ref() == Some(key) {
            return Err(Error::sink_write(key.to_string(), "injected failure"));
        }
        let count = rows.len();
        self.staged.write().await.entry(*key).or_default().extend(rows);
        debug!(partition = %key, rows = count, "staged rows in memory");
        Ok(count)
    }

    async fn commit(&self) -> Result<Vec<String>> {
        if self.fail_commit {
            return Err(Error::commit("injected failure"));
        }
        let staged = std::mem::take(&mut *self.staged.write().await);
        let mut committed = self.committed.write().await;
        let mut paths = Vec::with_capacity(staged.len());
        for (key, rows) in staged {
            paths.push(key.dir_name());
            committed.entry(key).or_default().extend(rows);
        }
        Ok(paths)
    }

    async fn abort(&self) -> Result<()> {
        let staged = std::mem::take(&mut *self.staged.write().await);
        let discarded: usize = staged.values().map(Vec::len).sum();
        warn!(rows = discarded, "discarded staged rows");
        Ok(())
    }
}
