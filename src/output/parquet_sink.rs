//! Parquet partitioned sink
//!
//! Part files are staged under `_temporary/{run_id}/` and only moved into
//! their `dt=YYYY-MM-DD/` directory on commit, followed by a `_SUCCESS`
//! marker at the output root. Every file name carries the run id, so a
//! rerun never overwrites earlier output.

use super::cloud::StorageLocation;
use super::schema::CanonicalSchema;
use super::sink::PartitionedSink;
use super::writer::{batch_to_parquet_bytes, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::partition::PartitionKey;
use crate::types::CanonicalRow;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Directory holding in-flight part files
pub const STAGING_DIR: &str = "_temporary";

/// Marker written at the output root after a successful commit
pub const SUCCESS_MARKER: &str = "_SUCCESS";

#[derive(Debug, Clone)]
struct StagedFile {
    staged_key: String,
    final_key: String,
}

/// Sink writing one or more Parquet part files per partition
#[derive(Debug)]
pub struct ParquetSink {
    output: StorageLocation,
    staging: StorageLocation,
    run_id: String,
    config: ParquetWriterConfig,
    shards_per_partition: usize,
    file_counter: AtomicUsize,
    staged: RwLock<Vec<StagedFile>>,
    /// Files already moved by an unfinished commit
    published: RwLock<Vec<StagedFile>>,
}

impl ParquetSink {
    /// Create a sink staging inside the output location
    pub fn new(output: StorageLocation, run_id: impl Into<String>) -> Self {
        Self {
            staging: output.clone(),
            output,
            run_id: run_id.into(),
            config: ParquetWriterConfig::default(),
            shards_per_partition: 1,
            file_counter: AtomicUsize::new(0),
            staged: RwLock::new(Vec::new()),
            published: RwLock::new(Vec::new()),
        }
    }

    /// Stage part files in a separate location
    #[must_use]
    pub fn with_staging(mut self, staging: StorageLocation) -> Self {
        self.staging = staging;
        self
    }

    /// Set Parquet writer configuration
    #[must_use]
    pub fn with_config(mut self, config: ParquetWriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Split each partition into up to `shards` part files
    #[must_use]
    pub fn with_shards_per_partition(mut self, shards: usize) -> Self {
        self.shards_per_partition = shards.max(1);
        self
    }

    /// Run id embedded in part file names
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Number of part files staged and not yet committed
    pub async fn staged_files(&self) -> usize {
        self.staged.read().await.len()
    }

    fn next_file_name(&self) -> String {
        let n = self.file_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "part-{n:05}-{run_id}.{ext}",
            run_id = self.run_id,
            ext = self.config.file_extension()
        )
    }

    fn staging_root(&self) -> String {
        format!("{STAGING_DIR}/{}", self.run_id)
    }
}

#[async_trait]
impl PartitionedSink for ParquetSink {
    async fn append(&self, key: &PartitionKey, rows: Vec<CanonicalRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let schema = CanonicalSchema::for_rows(&rows);
        let shard_size = rows.len().div_ceil(self.shards_per_partition);
        let mut files = Vec::new();

        for shard in rows.chunks(shard_size) {
            let batch = schema
                .to_record_batch(shard)
                .map_err(|e| Error::sink_write(key.to_string(), e.to_string()))?;
            let data = batch_to_parquet_bytes(&batch, &self.config)
                .map_err(|e| Error::sink_write(key.to_string(), e.to_string()))?;

            let file_name = self.next_file_name();
            let staged_key = format!("{}/{}/{file_name}", self.staging_root(), key.dir_name());
            let final_key = format!("{}/{file_name}", key.dir_name());

            // Record before writing so abort also removes partially written files
            self.staged.write().await.push(StagedFile {
                staged_key: staged_key.clone(),
                final_key,
            });
            let path = self
                .staging
                .write(&staged_key, data)
                .await
                .map_err(|e| Error::sink_write(key.to_string(), e.to_string()))?;

            debug!(partition = %key, rows = shard.len(), path = %path, "staged part file");
            files.push(path);
        }

        info!(partition = %key, rows = rows.len(), files = files.len(), "staged partition");
        Ok(rows.len())
    }

    async fn commit(&self) -> Result<Vec<String>> {
        let staged = self.staged.read().await.clone();
        let mut committed = Vec::with_capacity(staged.len());

        // Entries stay staged until every move succeeds; abort retracts published ones
        for file in &staged {
            let path = self
                .staging
                .transfer(&file.staged_key, &self.output, &file.final_key)
                .await
                .map_err(|e| Error::commit(format!("moving {}: {e}", file.staged_key)))?;
            self.published.write().await.push(file.clone());
            committed.push(path);
        }

        if !committed.is_empty() {
            self.output
                .write(SUCCESS_MARKER, Bytes::new())
                .await
                .map_err(|e| Error::commit(format!("writing {SUCCESS_MARKER}: {e}")))?;
        }

        self.staged.write().await.clear();
        self.published.write().await.clear();
        info!(files = committed.len(), output = %self.output, "committed part files");
        Ok(committed)
    }

    async fn abort(&self) -> Result<()> {
        let published = std::mem::take(&mut *self.published.write().await);
        let staged = std::mem::take(&mut *self.staged.write().await);
        let mut first_error = None;

        for file in &published {
            if let Err(e) = self.output.delete(&file.final_key).await {
                warn!(key = %file.final_key, error = %e, "failed to retract published file");
                first_error.get_or_insert(e);
            }
        }
        for file in &staged {
            if let Err(e) = self.staging.delete(&file.staged_key).await {
                warn!(key = %file.staged_key, error = %e, "failed to delete staged file");
                first_error.get_or_insert(e);
            }
        }

        warn!(
            staged = staged.len(),
            retracted = published.len(),
            run_id = %self.run_id,
            "aborted run, staged files discarded"
        );
        first_error.map_or(Ok(()), Err)
    }
}
