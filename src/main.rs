// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! Orders ETL CLI
//!
//! Command-line interface for the daily order normalization pipeline

use anyhow::Context;
use clap::Parser;
use orders_etl::cli::{Cli, Runner};
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.name();
    let runner = Runner::new(cli);

    if let Err(e) = runner
        .run()
        .await
        .with_context(|| format!("{command} failed"))
    {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
