//! Schema reconciliation module
//!
//! Maps heterogeneous input rows onto the canonical order schema.
//!
//! # Overview
//!
//! - `AliasTable` - declarative canonical field → accepted source names
//! - `Reconciler` - name matching, numeric coercion, trimming, pass-through
//! - `BatchProfile` - batch-level column facts used by date resolution

mod aliases;
mod reconciler;

pub use aliases::{normalize_column_name, AliasEntry, AliasTable, CanonicalField};
pub use reconciler::{
    coerce_numeric, normalize_text, BatchProfile, Coercion, ReconciledRow, Reconciler,
};

#[cfg(test)]
mod tests;
