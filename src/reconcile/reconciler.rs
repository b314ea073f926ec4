//! Row reconciliation
//!
//! Maps one raw row onto the canonical shape. Pure: no I/O, no shared state.

use super::aliases::{normalize_column_name, AliasTable, CanonicalField};
use crate::types::{Measure, Measures, RawRow, RawValue};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of coercing one numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    /// Absent or blank cell
    Null,
    /// Parsed value
    Value(f64),
    /// Present but not a finite number; the cell becomes null
    Failed,
}

impl Coercion {
    /// The value stored in the canonical row
    pub fn value(self) -> Option<f64> {
        match self {
            Coercion::Value(v) => Some(v),
            Coercion::Null | Coercion::Failed => None,
        }
    }
}

/// Coerce a raw cell to a double
pub fn coerce_numeric(value: &RawValue) -> Coercion {
    match value {
        RawValue::Null => Coercion::Null,
        RawValue::Number(n) if n.is_finite() => Coercion::Value(*n),
        RawValue::Number(_) => Coercion::Failed,
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Coercion::Null;
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Coercion::Value(v),
                _ => Coercion::Failed,
            }
        }
    }
}

/// Trim a raw cell into an optional string; blank cells are null
pub fn normalize_text(value: &RawValue) -> Option<String> {
    value.to_trimmed().filter(|s| !s.is_empty())
}

/// A row mapped onto the canonical fields, before date resolution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciledRow {
    /// Value of the order-id alias, if present and non-blank
    pub order_id: Option<String>,
    /// Raw text of the date alias column, if present and non-blank
    pub date_value: Option<String>,
    /// Whether this row carried a date alias column at all
    pub has_date_column: bool,
    pub customer_id: Option<String>,
    pub product_name: Option<String>,
    pub measures: Measures,
    /// Pass-through columns
    pub extra: Vec<(String, Option<String>)>,
    /// Measures whose cell failed coercion
    pub coercion_failures: Vec<Measure>,
}

/// Batch-level facts gathered before rows are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProfile {
    /// Whether any row carries a date alias column
    pub has_date_column: bool,
    /// Whether any row carries an order-id alias column
    pub has_order_id_column: bool,
}

impl BatchProfile {
    /// Scan a batch's columns
    pub fn scan<'a>(rows: impl IntoIterator<Item = &'a RawRow>, aliases: &AliasTable) -> Self {
        let mut profile = Self::default();
        for row in rows {
            for column in row.columns() {
                profile.has_date_column |= aliases.matches(CanonicalField::OrderDate, column);
                profile.has_order_id_column |= aliases.matches(CanonicalField::OrderId, column);
            }
            if profile.has_date_column && profile.has_order_id_column {
                break;
            }
        }
        profile
    }
}

/// Schema reconciler driven by an alias table
#[derive(Debug, Clone)]
pub struct Reconciler {
    aliases: AliasTable,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(AliasTable::standard())
    }
}

impl Reconciler {
    /// Create a reconciler over an alias table
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// The alias table in use
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Profile a batch with this reconciler's aliases
    pub fn profile<'a>(&self, rows: impl IntoIterator<Item = &'a RawRow>) -> BatchProfile {
        BatchProfile::scan(rows, &self.aliases)
    }

    /// Reconcile one raw row
    pub fn reconcile(&self, row: &RawRow) -> ReconciledRow {
        let cells: Vec<(&str, &RawValue)> = row.iter().collect();
        let normalized: Vec<String> = cells
            .iter()
            .map(|(name, _)| normalize_column_name(name))
            .collect();
        let mut consumed = vec![false; cells.len()];
        let mut out = ReconciledRow::default();

        for entry in self.aliases.entries() {
            let Some(idx) = self.aliases.resolve_normalized(entry.field, &normalized) else {
                continue;
            };
            consumed[idx] = true;
            let (column, value) = cells[idx];

            match entry.field {
                CanonicalField::OrderId => out.order_id = normalize_text(value),
                CanonicalField::OrderDate => {
                    out.has_date_column = true;
                    out.date_value = normalize_text(value);
                }
                CanonicalField::CustomerId => out.customer_id = normalize_text(value),
                CanonicalField::ProductName => out.product_name = normalize_text(value),
                CanonicalField::Measure(measure) => {
                    let coercion = coerce_numeric(value);
                    if coercion == Coercion::Failed {
                        debug!(column, ?value, "numeric coercion failed, storing null");
                        out.coercion_failures.push(measure);
                    }
                    out.measures.set(measure, coercion.value());
                }
            }
        }

        let mut names: HashSet<String> = HashSet::new();
        out.extra = cells
            .iter()
            .zip(consumed)
            .filter(|(_, used)| !used)
            .map(|((name, value), _)| {
                let name = dedupe_name(name.trim(), &mut names);
                (name, normalize_text(value))
            })
            .collect();

        out
    }
}

/// Claim `name`, or `name_1`, `name_2`, ... when a duplicate header already took it
fn dedupe_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{name}_{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}
