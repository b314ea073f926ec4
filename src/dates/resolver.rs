//! Partition date resolution

use crate::reconcile::ReconciledRow;
use crate::types::DATE_FORMAT;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static STRICT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Parse a `YYYY-MM-DD` date, rejecting any other shape
pub fn parse_strict_date(value: &str) -> Option<NaiveDate> {
    if !STRICT_DATE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Parse a date-like value, dropping any time component
///
/// Used by the partition splitter, which accepts looser input than the
/// pipeline does.
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(date) = parse_strict_date(value) {
        return Some(date);
    }

    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Why a row was dropped before partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    /// The batch has a date column but this row has no value for it
    MissingDate,
    /// The row's date value is not a valid `YYYY-MM-DD` date
    UnparseableDate,
}

impl ExclusionReason {
    /// Stable name used in run summaries
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::MissingDate => "missing_date",
            ExclusionReason::UnparseableDate => "unparseable_date",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving one row's date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateResolution {
    Resolved(NaiveDate),
    Excluded(ExclusionReason),
}

impl DateResolution {
    /// The resolved date, if any
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            DateResolution::Resolved(date) => Some(date),
            DateResolution::Excluded(_) => None,
        }
    }
}

/// Resolves partition dates for one batch
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    process_date: NaiveDate,
    batch_has_date_column: bool,
}

impl DateResolver {
    /// Create a resolver for a batch
    ///
    /// When the batch carries no date column at all, every row falls back
    /// to `process_date`.
    pub fn new(process_date: NaiveDate, batch_has_date_column: bool) -> Self {
        Self {
            process_date,
            batch_has_date_column,
        }
    }

    /// The fallback date
    pub fn process_date(&self) -> NaiveDate {
        self.process_date
    }

    /// Whether rows must supply their own date
    pub fn uses_row_dates(&self) -> bool {
        self.batch_has_date_column
    }

    /// Resolve a reconciled row
    pub fn resolve(&self, row: &ReconciledRow) -> DateResolution {
        if !self.batch_has_date_column {
            return DateResolution::Resolved(self.process_date);
        }

        match row.date_value.as_deref() {
            None => DateResolution::Excluded(ExclusionReason::MissingDate),
            Some(value) => parse_strict_date(value).map_or(
                DateResolution::Excluded(ExclusionReason::UnparseableDate),
                DateResolution::Resolved,
            ),
        }
    }
}
