//! Declarative alias table
//!
//! Maps each canonical field to an ordered list of accepted source column
//! names. Lookup is case-insensitive and first-match wins in alias order.

use crate::error::{Error, Result};
use crate::types::{Measure, RawRow, CUSTOMER_ID, ORDER_DATE, ORDER_ID, PRODUCT_NAME};

/// Fields the reconciler knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    OrderId,
    /// Source of the partition date (not a column of its own until resolved)
    OrderDate,
    CustomerId,
    ProductName,
    Measure(Measure),
}

impl CanonicalField {
    /// Canonical column name
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::OrderId => ORDER_ID,
            CanonicalField::OrderDate => ORDER_DATE,
            CanonicalField::CustomerId => CUSTOMER_ID,
            CanonicalField::ProductName => PRODUCT_NAME,
            CanonicalField::Measure(m) => m.column_name(),
        }
    }

    /// Look up a field by its canonical column name
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = normalize_column_name(name);
        match normalized.as_str() {
            ORDER_ID => Ok(CanonicalField::OrderId),
            ORDER_DATE => Ok(CanonicalField::OrderDate),
            CUSTOMER_ID => Ok(CanonicalField::CustomerId),
            PRODUCT_NAME => Ok(CanonicalField::ProductName),
            other => Measure::ALL
                .into_iter()
                .find(|m| m.column_name() == other)
                .map(CanonicalField::Measure)
                .ok_or_else(|| {
                    Error::invalid_value("aliases", format!("unknown canonical field '{name}'"))
                }),
        }
    }
}

/// Normalize a source column name for alias matching
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One row of the alias table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Target field
    pub field: CanonicalField,
    /// Accepted source names, normalized, highest priority first
    pub aliases: Vec<String>,
}

/// Canonical field → ordered accepted source names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used for order batches
    pub fn standard() -> Self {
        let mut table = Self::new()
            .with_field(CanonicalField::OrderId, &["order_id"])
            .with_field(CanonicalField::OrderDate, &["order_date", "date"])
            .with_field(CanonicalField::CustomerId, &["customer_id", "customerid"])
            .with_field(CanonicalField::ProductName, &["product_name", "product"]);

        for measure in Measure::ALL {
            table = table.with_field(CanonicalField::Measure(measure), &[measure.column_name()]);
        }
        table
    }

    /// Add (or extend) a field's aliases
    #[must_use]
    pub fn with_field(mut self, field: CanonicalField, aliases: &[&str]) -> Self {
        self.extend(field, aliases.iter().copied());
        self
    }

    /// Append lower-priority aliases to a field, creating the entry if needed
    pub fn extend<'a>(&mut self, field: CanonicalField, aliases: impl IntoIterator<Item = &'a str>) {
        let idx = match self.entries.iter().position(|e| e.field == field) {
            Some(idx) => idx,
            None => {
                self.entries.push(AliasEntry {
                    field,
                    aliases: Vec::new(),
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        for alias in aliases {
            let alias = normalize_column_name(alias);
            if !entry.aliases.contains(&alias) {
                entry.aliases.push(alias);
            }
        }
    }

    /// Entries in table order
    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Accepted names for a field
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.aliases.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a source column name is an alias of the field
    pub fn matches(&self, field: CanonicalField, column: &str) -> bool {
        let normalized = normalize_column_name(column);
        self.aliases(field).iter().any(|a| *a == normalized)
    }

    /// Index of the cell that supplies `field`
    ///
    /// Aliases are tried in priority order; within one alias the earliest
    /// cell wins.
    pub fn resolve(&self, field: CanonicalField, row: &RawRow) -> Option<usize> {
        let normalized: Vec<String> = row.columns().map(normalize_column_name).collect();
        self.resolve_normalized(field, &normalized)
    }

    /// Same as [`resolve`](Self::resolve) over pre-normalized column names
    pub fn resolve_normalized(&self, field: CanonicalField, columns: &[String]) -> Option<usize> {
        self.aliases(field)
            .iter()
            .find_map(|alias| columns.iter().position(|c| c == alias))
    }
}
