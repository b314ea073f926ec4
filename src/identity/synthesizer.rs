//! Order identifier assignment

use crate::reconcile::ReconciledRow;
use crate::types::{CanonicalRow, DATE_FORMAT};
use chrono::NaiveDate;

/// Stand-in for a missing customer id in synthesized identifiers
pub const CUSTOMER_PLACEHOLDER: &str = "unknown";

/// Separator between the parts of a synthesized identifier
pub const ID_SEPARATOR: &str = "_";

/// Build a synthesized order id
///
/// Deterministic: the same customer, date and sequence always give the
/// same string.
pub fn synthesize_order_id(customer_id: Option<&str>, order_date: NaiveDate, seq: u64) -> String {
    format!(
        "{customer}{sep}{date}{sep}{seq}",
        customer = customer_id.unwrap_or(CUSTOMER_PLACEHOLDER),
        date = order_date.format(DATE_FORMAT),
        sep = ID_SEPARATOR,
    )
}

/// A canonical row plus whether its id was synthesized
#[derive(Debug, Clone, PartialEq)]
pub struct Identified {
    pub row: CanonicalRow,
    pub synthesized: bool,
}

/// Turns dated reconciled rows into canonical rows
#[derive(Debug, Clone)]
pub struct IdentifierSynthesizer {
    placeholder: String,
}

impl Default for IdentifierSynthesizer {
    fn default() -> Self {
        Self {
            placeholder: CUSTOMER_PLACEHOLDER.to_string(),
        }
    }
}

impl IdentifierSynthesizer {
    /// Create a synthesizer with the default placeholder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different customer placeholder
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Finish a row: keep its own order id or synthesize one from `seq`
    pub fn identify(&self, row: ReconciledRow, order_date: NaiveDate, seq: u64) -> Identified {
        let (order_id, synthesized) = match row.order_id {
            Some(id) => (id, false),
            None => {
                let customer = row.customer_id.as_deref().unwrap_or(&self.placeholder);
                (synthesize_order_id(Some(customer), order_date, seq), true)
            }
        };

        Identified {
            row: CanonicalRow {
                order_id,
                order_date,
                customer_id: row.customer_id,
                product_name: row.product_name,
                measures: row.measures,
                extra: row.extra,
            },
            synthesized,
        }
    }
}
