//! Auxiliary data tools
//!
//! Local-file utilities that prepare input for the transform. Both read
//! and write gzip CSV through the same `RawRow` model the pipeline uses.
//!
//! # Overview
//!
//! - `split` - one CSV into `orders_date={day}_part{i}.csv.gz` chunks per day
//! - `augment` - a seed CSV into `days` files of `target` synthetic rows each

mod augment;
mod split;

pub use augment::{augment, AugmentOptions, AugmentReport};
pub use split::{split, SplitReport, DEFAULT_TARGET_ROWS};

use crate::error::{Error, Result, ResultExt};
use crate::reconcile::{normalize_column_name, AliasTable, CanonicalField};
use crate::source::{encode_csv, is_gzip, parse_csv_bytes, CsvTable};
use crate::types::RawRow;
use std::path::Path;

/// Read a local CSV or CSV.GZ file
fn read_csv_file(path: &Path) -> Result<CsvTable> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let origin = path.display().to_string();
    parse_csv_bytes(&data, is_gzip(&origin), &origin)
}

/// Write rows as a gzip CSV file
fn write_csv_gz(path: &Path, headers: &[String], rows: &[RawRow]) -> Result<()> {
    let data = encode_csv(headers, rows, true)?;
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

/// First header naming an alias of `field`
fn find_column(headers: &[String], field: CanonicalField) -> Option<String> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
    AliasTable::standard()
        .resolve_normalized(field, &normalized)
        .map(|idx| headers[idx].clone())
}
