//! Canonical Arrow schema
//!
//! Converts canonical rows to Arrow RecordBatches and back. The fixed
//! columns come first; pass-through columns follow as nullable Utf8 in
//! first-seen order.

use crate::error::{Error, Result};
use crate::partition::PARTITION_COLUMN;
use crate::types::{
    CanonicalRow, Measure, Measures, CUSTOMER_ID, ORDER_DATE, ORDER_ID, PRODUCT_NAME,
};
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use std::sync::Arc;

/// Names of the fixed canonical columns in output order
pub fn canonical_column_names() -> Vec<&'static str> {
    let mut names = vec![ORDER_ID, ORDER_DATE, CUSTOMER_ID, PRODUCT_NAME];
    names.extend(Measure::ALL.iter().map(|m| m.column_name()));
    names
}

fn canonical_fields() -> Vec<Field> {
    let mut fields = vec![
        Field::new(ORDER_ID, DataType::Utf8, false),
        Field::new(ORDER_DATE, DataType::Date32, false),
        Field::new(CUSTOMER_ID, DataType::Utf8, true),
        Field::new(PRODUCT_NAME, DataType::Utf8, true),
    ];
    fields.extend(
        Measure::ALL
            .iter()
            .map(|m| Field::new(m.column_name(), DataType::Float64, true)),
    );
    fields
}

/// A pass-through column and the field name it is written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    /// Name carried by the rows
    pub source: String,
    /// Name in the Arrow schema
    pub field: String,
}

/// Output schema for one group of canonical rows
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    schema: SchemaRef,
    extras: Vec<ExtraColumn>,
}

impl CanonicalSchema {
    /// Build the schema covering every pass-through column in `rows`
    ///
    /// A pass-through name that clashes with a canonical column, the
    /// partition column or an earlier field gets a `_1`, `_2`, ... suffix.
    pub fn for_rows(rows: &[CanonicalRow]) -> Self {
        let mut taken: HashSet<String> = canonical_column_names()
            .into_iter()
            .chain(std::iter::once(PARTITION_COLUMN))
            .map(str::to_string)
            .collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut extras = Vec::new();

        for row in rows {
            for (name, _) in &row.extra {
                if !seen.insert(name.as_str()) {
                    continue;
                }
                let field = unique_field_name(name, &taken);
                taken.insert(field.clone());
                extras.push(ExtraColumn {
                    source: name.clone(),
                    field,
                });
            }
        }

        let mut fields = canonical_fields();
        fields.extend(
            extras
                .iter()
                .map(|e| Field::new(e.field.as_str(), DataType::Utf8, true)),
        );

        Self {
            schema: Arc::new(Schema::new(fields)),
            extras,
        }
    }

    /// The Arrow schema
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Pass-through columns in schema order
    pub fn extras(&self) -> &[ExtraColumn] {
        &self.extras
    }

    /// Convert rows into a RecordBatch under this schema
    pub fn to_record_batch(&self, rows: &[CanonicalRow]) -> Result<RecordBatch> {
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.order_id.as_str()),
            )),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| Date32Type::from_naive_date(r.order_date)),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.customer_id.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.product_name.as_deref()),
            )),
        ];

        for measure in Measure::ALL {
            columns.push(Arc::new(Float64Array::from_iter(
                rows.iter().map(|r| r.measures.get(measure)),
            )));
        }

        for extra in &self.extras {
            columns.push(Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.extra(&extra.source)),
            )));
        }

        RecordBatch::try_new(self.schema(), columns).map_err(|e| Error::Output {
            message: format!("Failed to create RecordBatch: {e}"),
        })
    }
}

fn unique_field_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Convert canonical rows to a RecordBatch
pub fn rows_to_record_batch(rows: &[CanonicalRow]) -> Result<RecordBatch> {
    CanonicalSchema::for_rows(rows).to_record_batch(rows)
}

/// Read canonical rows back out of a RecordBatch
///
/// Every non-canonical column is read as a pass-through string column.
pub fn record_batch_to_rows(batch: &RecordBatch) -> Result<Vec<CanonicalRow>> {
    let order_ids = string_column(batch, ORDER_ID)?;
    let dates = batch
        .column_by_name(ORDER_DATE)
        .and_then(|c| c.as_any().downcast_ref::<Date32Array>())
        .ok_or_else(|| Error::output(format!("missing Date32 column '{ORDER_DATE}'")))?;
    let customers = string_column(batch, CUSTOMER_ID)?;
    let products = string_column(batch, PRODUCT_NAME)?;

    let measures = Measure::ALL
        .iter()
        .map(|m| {
            batch
                .column_by_name(m.column_name())
                .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                .map(|array| (*m, array))
                .ok_or_else(|| {
                    Error::output(format!("missing Float64 column '{}'", m.column_name()))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let canonical: HashSet<&str> = canonical_column_names().into_iter().collect();
    let extras = batch
        .schema()
        .fields()
        .iter()
        .filter(|f| !canonical.contains(f.name().as_str()))
        .map(|f| string_column(batch, f.name()).map(|array| (f.name().clone(), array)))
        .collect::<Result<Vec<_>>>()?;

    (0..batch.num_rows())
        .map(|i| {
            let order_date = dates
                .value_as_date(i)
                .ok_or_else(|| Error::output(format!("invalid order_date at row {i}")))?;
            let mut row_measures = Measures::default();
            for (measure, array) in &measures {
                row_measures.set(*measure, optional_value(*array, i, |a, i| a.value(i)));
            }

            Ok(CanonicalRow {
                order_id: order_ids.value(i).to_string(),
                order_date,
                customer_id: optional_value(customers, i, |a, i| a.value(i).to_string()),
                product_name: optional_value(products, i, |a, i| a.value(i).to_string()),
                measures: row_measures,
                extra: extras
                    .iter()
                    .map(|(name, array)| {
                        (
                            name.clone(),
                            optional_value(*array, i, |a, i| a.value(i).to_string()),
                        )
                    })
                    .collect(),
            })
        })
        .collect()
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::output(format!("missing Utf8 column '{name}'")))
}

fn optional_value<A: Array, T>(array: &A, i: usize, value: impl Fn(&A, usize) -> T) -> Option<T> {
    if array.is_null(i) {
        None
    } else {
        Some(value(array, i))
    }
}
