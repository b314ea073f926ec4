//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, TransformArgs};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::identity::IdentifierSynthesizer;
use crate::output::{ParquetSink, StorageLocation};
use crate::pipeline::{PipelineDriver, RunSummary};
use crate::reconcile::Reconciler;
use crate::source::CsvSource;
use crate::tools::{augment, split, AugmentOptions};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Transform(args) => self.transform(args).await,
            Commands::Split {
                input_csv,
                out_dir,
                target,
            } => print_json(&split(input_csv, out_dir, *target)?),
            Commands::Augment {
                input_csv,
                out_dir,
                start_date,
                days,
                target,
                seed,
            } => {
                let options = AugmentOptions {
                    start_date: start_date.clone(),
                    days: *days,
                    target: *target,
                    seed: *seed,
                };
                print_json(&augment(input_csv, out_dir, &options)?)
            }
        }
    }

    /// Load the config file, if one was given
    fn load_config(&self) -> Result<PipelineConfig> {
        match &self.cli.config {
            Some(path) => load_config_file(path),
            None => Ok(PipelineConfig::default()),
        }
    }

    async fn transform(&self, args: &TransformArgs) -> Result<()> {
        let mut config = self.load_config()?;
        args.apply(&mut config);
        config.validate()?;

        let summary = run_transform(&config).await?;
        print_json(&summary)
    }
}

fn load_config_file(path: &Path) -> Result<PipelineConfig> {
    info!(path = %path.display(), "loading config");
    PipelineConfig::from_file(path)
}

/// Wire a validated config into a CSV → Parquet pipeline and run it once
pub async fn run_transform(config: &PipelineConfig) -> Result<RunSummary> {
    let ctx = config.context()?;
    info!(job = %config.job_name, run_id = %ctx.run_id, "starting transform");

    let output = StorageLocation::parse(config.output()?)?;
    let mut sink = ParquetSink::new(output, ctx.run_id.clone())
        .with_config(config.parquet_config()?)
        .with_shards_per_partition(config.shards_per_partition);
    if let Some(temp_dir) = config.temp_dir.as_deref() {
        sink = sink.with_staging(StorageLocation::parse(temp_dir)?);
    }

    let driver = PipelineDriver::new(Arc::new(CsvSource::new()), Arc::new(sink))
        .with_reconciler(Reconciler::new(config.alias_table()?))
        .with_synthesizer(
            IdentifierSynthesizer::new().with_placeholder(config.customer_placeholder.trim()),
        );

    driver.run(&ctx).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
