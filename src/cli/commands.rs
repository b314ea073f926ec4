//! CLI commands and argument parsing

use crate::config::PipelineConfig;
use crate::tools::DEFAULT_TARGET_ROWS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Daily order normalization and partitioned Parquet landing
#[derive(Parser, Debug)]
#[command(name = "orders-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize one batch into dt-partitioned Parquet
    Transform(TransformArgs),

    /// Split a CSV into daily gzip partition files
    Split {
        /// Input CSV file
        input_csv: PathBuf,

        /// Directory for the partition files
        out_dir: PathBuf,

        /// Maximum rows per output file
        #[arg(default_value_t = DEFAULT_TARGET_ROWS)]
        target: usize,
    },

    /// Generate synthetic daily files from a seed CSV
    Augment {
        /// Seed CSV file
        input_csv: PathBuf,

        /// Directory for the generated files
        out_dir: PathBuf,

        /// First day (YYYY-MM-DD)
        start_date: String,

        /// Number of days to generate
        days: u32,

        /// Rows per day
        #[arg(default_value_t = DEFAULT_TARGET_ROWS)]
        target: usize,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Transform(_) => "transform",
            Commands::Split { .. } => "split",
            Commands::Augment { .. } => "augment",
        }
    }
}

/// Transform parameters; each one overrides the config file
///
/// The upper-case aliases accept job-style arguments such as
/// `--S3_INPUT_PREFIX s3://bucket/raw/`.
#[derive(Args, Debug, Default, Clone)]
pub struct TransformArgs {
    /// Input prefix (local path or s3/r2/gs/az URL)
    #[arg(long, alias = "S3_INPUT_PREFIX")]
    pub input: Option<String>,

    /// Output root for dt= partitions
    #[arg(short, long, alias = "S3_OUTPUT_PREFIX")]
    pub output: Option<String>,

    /// Process date (YYYY-MM-DD)
    #[arg(long, alias = "PROCESS_DATE")]
    pub process_date: Option<String>,

    /// Staging root for in-flight part files
    #[arg(long, alias = "TEMP_DIR")]
    pub temp_dir: Option<String>,

    /// Job name, for logs
    #[arg(long, alias = "JOB_NAME")]
    pub job_name: Option<String>,

    /// Normalization worker threads
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Part files per partition per run
    #[arg(long)]
    pub shards_per_partition: Option<usize>,

    /// Partitions written concurrently
    #[arg(long)]
    pub max_concurrent_writes: Option<usize>,

    /// Parquet codec (snappy, zstd, gzip, none)
    #[arg(long)]
    pub compression: Option<String>,

    /// Customer stand-in for synthesized order ids
    #[arg(long)]
    pub customer_placeholder: Option<String>,
}

impl TransformArgs {
    /// Overlay the given flags onto a config
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(date) = &self.process_date {
            config.process_date = Some(date.clone());
        }
        if let Some(temp_dir) = &self.temp_dir {
            config.temp_dir = Some(temp_dir.clone());
        }
        if let Some(job_name) = &self.job_name {
            config.job_name.clone_from(job_name);
        }
        if let Some(parallelism) = self.parallelism {
            config.parallelism = parallelism;
        }
        if let Some(shards) = self.shards_per_partition {
            config.shards_per_partition = shards;
        }
        if let Some(max) = self.max_concurrent_writes {
            config.max_concurrent_writes = max;
        }
        if let Some(compression) = &self.compression {
            config.compression.clone_from(compression);
        }
        if let Some(placeholder) = &self.customer_placeholder {
            config.customer_placeholder.clone_from(placeholder);
        }
    }
}
