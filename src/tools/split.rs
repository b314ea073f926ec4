//! Split one CSV into daily gzip partitions

use super::{find_column, read_csv_file, write_csv_gz};
use crate::dates::parse_lenient_date;
use crate::error::{Error, Result};
use crate::reconcile::CanonicalField;
use crate::types::{RawRow, DATE_FORMAT};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default rows per output file
pub const DEFAULT_TARGET_ROWS: usize = 100_000;

/// Outcome of a split
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SplitReport {
    pub date_column: String,
    pub rows_read: usize,
    /// Rows without a usable date
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub files: Vec<PathBuf>,
}

/// Split `input_csv` into `orders_date={day}_part{i}.csv.gz` files of at
/// most `target` rows
///
/// The date column is rewritten as `YYYY-MM-DD`; any time part is dropped.
pub fn split(input_csv: &Path, out_dir: &Path, target: usize) -> Result<SplitReport> {
    if target == 0 {
        return Err(Error::invalid_value("target", "must be at least 1"));
    }

    info!(input = %input_csv.display(), "reading csv");
    let table = read_csv_file(input_csv)?;
    let date_column = find_column(&table.headers, CanonicalField::OrderDate).ok_or_else(|| {
        Error::csv_parse(
            input_csv.display().to_string(),
            format!("no order_date/date column in {:?}", table.headers),
        )
    })?;
    info!(column = %date_column, "using date column");

    let mut report = SplitReport {
        date_column: date_column.clone(),
        rows_read: table.rows.len(),
        ..Default::default()
    };

    let mut by_day: BTreeMap<NaiveDate, Vec<RawRow>> = BTreeMap::new();
    for mut row in table.rows {
        let day = row
            .get(&date_column)
            .and_then(|v| v.to_trimmed())
            .and_then(|v| parse_lenient_date(&v));
        match day {
            Some(day) => {
                row.set(&date_column, day.format(DATE_FORMAT).to_string());
                by_day.entry(day).or_default().push(row);
            }
            None => report.rows_dropped += 1,
        }
    }
    if report.rows_dropped > 0 {
        warn!(
            rows = report.rows_dropped,
            column = %date_column,
            "rows have invalid or missing dates and were dropped"
        );
    }

    std::fs::create_dir_all(out_dir)?;
    for (day, rows) in &by_day {
        for (i, chunk) in rows.chunks(target).enumerate() {
            let path = out_dir.join(format!(
                "orders_date={}_part{i}.csv.gz",
                day.format(DATE_FORMAT)
            ));
            write_csv_gz(&path, &table.headers, chunk)?;
            info!(path = %path.display(), rows = chunk.len(), "wrote partition file");
            report.rows_written += chunk.len();
            report.files.push(path);
        }
    }

    info!(files = report.files.len(), out_dir = %out_dir.display(), "split finished");
    Ok(report)
}
