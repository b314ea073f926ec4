//! Row model shared by every pipeline stage
//!
//! `RawRow` is what a batch source produces; `CanonicalRow` is what the
//! partitioned writer accepts. Both live for a single run only.

use crate::partition::PartitionKey;
use chrono::NaiveDate;
use std::borrow::Cow;

// ============================================================================
// Canonical Names
// ============================================================================

/// Canonical order identifier column
pub const ORDER_ID: &str = "order_id";

/// Canonical order date column
pub const ORDER_DATE: &str = "order_date";

/// Canonical customer identifier column
pub const CUSTOMER_ID: &str = "customer_id";

/// Canonical product name column
pub const PRODUCT_NAME: &str = "product_name";

/// Calendar date format used for dates and partition keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Raw Rows
// ============================================================================

/// An untyped cell as delivered by a batch source
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// Missing cell
    #[default]
    Null,
    /// Textual cell (untrimmed)
    Text(String),
    /// Numeric cell
    Number(f64),
}

impl RawValue {
    /// Render the cell as text; `None` for nulls
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            RawValue::Number(n) => Some(Cow::Owned(n.to_string())),
        }
    }

    /// Render the cell as trimmed text; `None` for nulls
    pub fn to_trimmed(&self) -> Option<String> {
        self.as_text().map(|s| s.trim().to_string())
    }

    /// Check if this is a null cell
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// Ordered mapping of column name to untyped value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a cell in place
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.push((name.into(), value.into()));
    }

    /// Get a cell by exact column name (first occurrence)
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set a cell by exact column name, appending it when absent
    pub fn set(&mut self, name: &str, value: impl Into<RawValue>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((name.to_string(), value)),
        }
    }

    /// Column names in row order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }

    /// Cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.cells.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Measures
// ============================================================================

/// Numeric pass-through columns of the canonical schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Sales,
    Quantity,
    Discount,
    Profit,
    ShippingCost,
}

impl Measure {
    /// All measures in canonical column order
    pub const ALL: [Measure; 5] = [
        Measure::Sales,
        Measure::Quantity,
        Measure::Discount,
        Measure::Profit,
        Measure::ShippingCost,
    ];

    /// Canonical column name
    pub fn column_name(self) -> &'static str {
        match self {
            Measure::Sales => "sales",
            Measure::Quantity => "quantity",
            Measure::Discount => "discount",
            Measure::Profit => "profit",
            Measure::ShippingCost => "shipping_cost",
        }
    }
}

/// Coerced numeric values; a `None` is a null cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measures {
    pub sales: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
    pub profit: Option<f64>,
    pub shipping_cost: Option<f64>,
}

impl Measures {
    /// Get a measure value
    pub fn get(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Sales => self.sales,
            Measure::Quantity => self.quantity,
            Measure::Discount => self.discount,
            Measure::Profit => self.profit,
            Measure::ShippingCost => self.shipping_cost,
        }
    }

    /// Set a measure value
    pub fn set(&mut self, measure: Measure, value: Option<f64>) {
        let slot = match measure {
            Measure::Sales => &mut self.sales,
            Measure::Quantity => &mut self.quantity,
            Measure::Discount => &mut self.discount,
            Measure::Profit => &mut self.profit,
            Measure::ShippingCost => &mut self.shipping_cost,
        };
        *slot = value;
    }
}

// ============================================================================
// Canonical Rows
// ============================================================================

/// A normalized order record, ready to be partitioned
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub customer_id: Option<String>,
    pub product_name: Option<String>,
    pub measures: Measures,
    /// Columns outside the canonical schema, trimmed, in first-seen order
    pub extra: Vec<(String, Option<String>)>,
}

impl CanonicalRow {
    /// Partition key derived from `order_date`
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::from_date(self.order_date)
    }

    /// Get a pass-through column value
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Express this row as a raw row using canonical column names
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new()
            .with(ORDER_ID, self.order_id.as_str())
            .with(ORDER_DATE, self.order_date.format(DATE_FORMAT).to_string())
            .with(CUSTOMER_ID, self.customer_id.clone())
            .with(PRODUCT_NAME, self.product_name.clone());

        for measure in Measure::ALL {
            row.push(measure.column_name(), self.measures.get(measure));
        }
        for (name, value) in &self.extra {
            row.push(name.clone(), value.clone());
        }
        row
    }
}
