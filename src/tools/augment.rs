//! Synthetic order generation from a seed CSV

use super::{find_column, read_csv_file, write_csv_gz};
use crate::dates::parse_strict_date;
use crate::error::{Error, Result};
use crate::reconcile::CanonicalField;
use crate::types::{RawRow, DATE_FORMAT};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const CUSTOMER_COLUMN: &str = "Customer_Id";
const DATE_COLUMN: &str = "Order_Date";
const TIME_COLUMN: &str = "Time";

/// Parameters of an augmentation run
#[derive(Debug, Clone)]
pub struct AugmentOptions {
    /// First day, `YYYY-MM-DD`
    pub start_date: String,
    pub days: u32,
    /// Rows per day
    pub target: usize,
    /// Fixed RNG seed; random when `None`
    pub seed: Option<u64>,
}

/// Outcome of an augmentation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AugmentReport {
    pub seed_rows: usize,
    pub rows_written: usize,
    pub files: Vec<PathBuf>,
}

/// Write `days` files of `target` rows sampled with replacement from the seed
///
/// Each sampled row gets a suffixed customer id, the day's date and a
/// random time of day.
pub fn augment(input_csv: &Path, out_dir: &Path, options: &AugmentOptions) -> Result<AugmentReport> {
    let start = parse_strict_date(&options.start_date).ok_or_else(|| {
        Error::invalid_value(
            "start_date",
            format!("'{}' is not YYYY-MM-DD", options.start_date),
        )
    })?;

    info!(input = %input_csv.display(), "reading seed csv");
    let table = read_csv_file(input_csv)?;
    if table.rows.is_empty() {
        return Err(Error::invalid_value("input_csv", "seed file has no rows"));
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut headers = table.headers.clone();
    let mut seed_rows = table.rows;

    let customer_column = match find_column(&headers, CanonicalField::CustomerId) {
        Some(column) => column,
        None => {
            for row in &mut seed_rows {
                row.push(CUSTOMER_COLUMN, hex_id(&mut rng, 12));
            }
            headers.push(CUSTOMER_COLUMN.to_string());
            CUSTOMER_COLUMN.to_string()
        }
    };
    let date_column = find_column(&headers, CanonicalField::OrderDate).unwrap_or_else(|| {
        headers.push(DATE_COLUMN.to_string());
        DATE_COLUMN.to_string()
    });
    if !headers.iter().any(|h| h == TIME_COLUMN) {
        headers.push(TIME_COLUMN.to_string());
    }

    std::fs::create_dir_all(out_dir)?;
    let mut report = AugmentReport {
        seed_rows: seed_rows.len(),
        ..Default::default()
    };

    for offset in 0..options.days {
        let day = (start + Duration::days(i64::from(offset)))
            .format(DATE_FORMAT)
            .to_string();

        let rows: Vec<RawRow> = (0..options.target)
            .map(|_| {
                let mut row = seed_rows[rng.gen_range(0..seed_rows.len())].clone();
                let customer = row
                    .get(&customer_column)
                    .and_then(|v| v.to_trimmed())
                    .unwrap_or_default();
                row.set(&customer_column, format!("{customer}_{}", hex_id(&mut rng, 6)));
                row.set(&date_column, day.as_str());
                row.set(TIME_COLUMN, random_time(&mut rng));
                row
            })
            .collect();

        let path = out_dir.join(format!("orders_date={day}.csv.gz"));
        write_csv_gz(&path, &headers, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "wrote synthetic day");
        report.rows_written += rows.len();
        report.files.push(path);
    }

    info!(days = options.days, out_dir = %out_dir.display(), "augmentation finished");
    Ok(report)
}

/// `len` random lowercase hex digits (at most 16)
fn hex_id(rng: &mut impl Rng, len: usize) -> String {
    let hex = format!("{:016x}", rng.gen::<u64>());
    hex[..len.min(16)].to_string()
}

/// Random time of day as `HH:MM:SS`
fn random_time(rng: &mut impl Rng) -> String {
    let secs: u32 = rng.gen_range(0..24 * 3600);
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
