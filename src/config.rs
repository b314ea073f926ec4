//! Pipeline configuration
//!
//! Process parameters and tunables, loaded from an optional YAML file and
//! overridden field by field from the command line.
//!
//! ```yaml
//! input: s3://orders-raw/incoming/2025-11-01/
//! output: s3://orders-curated/orders/
//! process_date: "2025-11-01"
//! parallelism: 8
//! shards_per_partition: 2
//! compression: zstd
//! aliases:
//!   customer_id: [buyer_id]
//! ```

use crate::dates::parse_strict_date;
use crate::error::{Error, Result};
use crate::identity::CUSTOMER_PLACEHOLDER;
use crate::output::ParquetWriterConfig;
use crate::pipeline::PipelineContext;
use crate::reconcile::{AliasTable, CanonicalField};
use crate::source::InputScope;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Pipeline Config
// ============================================================================

/// Complete configuration of a transform run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input prefix (local path or s3/r2/gs/az URL)
    #[serde(default)]
    pub input: Option<String>,

    /// Output root for `dt=` partitions
    #[serde(default)]
    pub output: Option<String>,

    /// Process date, `YYYY-MM-DD`
    #[serde(default)]
    pub process_date: Option<String>,

    /// Staging root for in-flight part files (defaults to the output root)
    #[serde(default)]
    pub temp_dir: Option<String>,

    /// Job name, for logs only
    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Normalization worker threads
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Part files per partition per run
    #[serde(default = "default_shards")]
    pub shards_per_partition: usize,

    /// Partitions written concurrently
    #[serde(default = "default_max_concurrent_writes")]
    pub max_concurrent_writes: usize,

    /// Parquet codec: snappy, zstd, gzip or none
    #[serde(default = "default_compression")]
    pub compression: String,

    /// Customer stand-in for synthesized order ids
    #[serde(default = "default_placeholder")]
    pub customer_placeholder: String,

    /// Extra accepted source names per canonical field, tried after the built-in ones
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

fn default_job_name() -> String {
    "orders-etl".to_string()
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn default_shards() -> usize {
    1
}

fn default_max_concurrent_writes() -> usize {
    4
}

fn default_compression() -> String {
    "snappy".to_string()
}

fn default_placeholder() -> String {
    CUSTOMER_PLACEHOLDER.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            process_date: None,
            temp_dir: None,
            job_name: default_job_name(),
            parallelism: default_parallelism(),
            shards_per_partition: default_shards(),
            max_concurrent_writes: default_max_concurrent_writes(),
            compression: default_compression(),
            customer_placeholder: default_placeholder(),
            aliases: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Check that the config describes a runnable transform
    pub fn validate(&self) -> Result<()> {
        self.input()?;
        self.output()?;
        self.process_date()?;

        for (field, value) in [
            ("parallelism", self.parallelism),
            ("shards_per_partition", self.shards_per_partition),
            ("max_concurrent_writes", self.max_concurrent_writes),
        ] {
            if value == 0 {
                return Err(Error::invalid_value(field, "must be at least 1"));
            }
        }

        if self.customer_placeholder.trim().is_empty() {
            return Err(Error::invalid_value(
                "customer_placeholder",
                "must not be blank",
            ));
        }

        self.parquet_config()?;
        self.alias_table()?;
        Ok(())
    }

    /// Input prefix
    pub fn input(&self) -> Result<&str> {
        required(self.input.as_deref(), "input")
    }

    /// Output root
    pub fn output(&self) -> Result<&str> {
        required(self.output.as_deref(), "output")
    }

    /// Parsed process date
    pub fn process_date(&self) -> Result<NaiveDate> {
        let value = required(self.process_date.as_deref(), "process_date")?;
        parse_strict_date(value).ok_or_else(|| {
            Error::invalid_value("process_date", format!("'{value}' is not YYYY-MM-DD"))
        })
    }

    /// Built-in alias table extended with the configured aliases
    pub fn alias_table(&self) -> Result<AliasTable> {
        let mut table = AliasTable::standard();
        for (field, names) in &self.aliases {
            let field = CanonicalField::from_name(field)?;
            table.extend(field, names.iter().map(String::as_str));
        }
        Ok(table)
    }

    /// Parquet writer settings
    pub fn parquet_config(&self) -> Result<ParquetWriterConfig> {
        ParquetWriterConfig::from_codec_name(&self.compression)
    }

    /// Run context with a fresh run id
    pub fn context(&self) -> Result<PipelineContext> {
        Ok(PipelineContext::new(
            self.process_date()?,
            InputScope::new(self.input()?),
            self.output()?,
        )
        .with_parallelism(self.parallelism)
        .with_max_concurrent_writes(self.max_concurrent_writes))
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::missing_field(field))
}
