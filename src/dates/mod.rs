//! Date resolution module
//!
//! Decides the partition date for each reconciled row: the row's own
//! `YYYY-MM-DD` value when the batch has a date column, otherwise the
//! process date for the whole batch.

mod resolver;

pub use resolver::{
    parse_lenient_date, parse_strict_date, DateResolution, DateResolver, ExclusionReason,
};
