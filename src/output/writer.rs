//! Parquet encoding
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files and decodes
//! them back.

use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Part file encoding settings
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from a codec name (`snappy`, `zstd`, `gzip`, `none`)
    pub fn from_codec_name(name: &str) -> Result<Self> {
        let compression = match name.trim().to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "gzip" | "gz" => Compression::GZIP(GzipLevel::default()),
            "none" | "uncompressed" => Compression::UNCOMPRESSED,
            other => {
                return Err(Error::invalid_value(
                    "compression",
                    format!("unsupported codec '{other}'"),
                ))
            }
        };
        Ok(Self::default().with_compression(compression))
    }

    /// Set compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set maximum rows per row group
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Compression codec
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Maximum rows per row group
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// File extension for part files, e.g. `snappy.parquet`
    pub fn file_extension(&self) -> &'static str {
        match self.compression {
            Compression::SNAPPY => "snappy.parquet",
            Compression::ZSTD(_) => "zstd.parquet",
            Compression::GZIP(_) => "gz.parquet",
            _ => "parquet",
        }
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Encode a RecordBatch as a complete Parquet file in memory
pub fn batch_to_parquet_bytes(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(config.build_properties()))
        .map_err(|e| Error::output(format!("Failed to create parquet writer: {e}")))?;

    writer
        .write(batch)
        .map_err(|e| Error::output(format!("Failed to write parquet: {e}")))?;

    writer
        .close()
        .map_err(|e| Error::output(format!("Failed to close parquet writer: {e}")))?;

    Ok(Bytes::from(buf))
}

/// Decode an in-memory Parquet file into RecordBatches
pub fn read_parquet_bytes(data: Bytes) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}
