//! Batch source module
//!
//! Lists and reads the raw input of one run.
//!
//! # Overview
//!
//! - `BatchSource` - async trait yielding a `Batch` of raw rows
//! - `CsvSource` - plain and gzip CSV files under a local or object store prefix
//! - `MemorySource` - fixed rows, for tests and embedding

mod csv_source;
mod memory;
mod types;

pub use csv_source::{encode_csv, is_gzip, is_input_file, parse_csv_bytes, CsvSource, CsvTable};
pub use memory::MemorySource;
pub use types::{Batch, BatchSource, InputScope};
