//! CLI module
//!
//! Command-line interface for the orders pipeline.
//!
//! # Commands
//!
//! - `transform` - Normalize a batch and land it as dt-partitioned Parquet
//! - `split` - Split a CSV into daily gzip partition files
//! - `augment` - Generate synthetic daily files from a seed CSV

mod commands;
mod runner;

pub use commands::{Cli, Commands, TransformArgs};
pub use runner::{run_transform, Runner};
