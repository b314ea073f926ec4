//! Tests for reconcile module

use super::*;
use crate::types::{Measure, RawRow, RawValue};
use pretty_assertions::assert_eq;
use test_case::test_case;

// ============================================================================
// Alias Table Tests
// ============================================================================

#[test]
fn test_standard_table_order() {
    let table = AliasTable::standard();
    assert_eq!(table.aliases(CanonicalField::OrderDate), ["order_date", "date"]);
    assert_eq!(
        table.aliases(CanonicalField::CustomerId),
        ["customer_id", "customerid"]
    );
    assert_eq!(
        table.aliases(CanonicalField::ProductName),
        ["product_name", "product"]
    );
    assert_eq!(
        table.aliases(CanonicalField::Measure(Measure::ShippingCost)),
        ["shipping_cost"]
    );
}

#[test_case("order_id", CanonicalField::OrderId ; "lowercase id")]
#[test_case("Order_Id", CanonicalField::OrderId ; "title case id")]
#[test_case("Customer_Id", CanonicalField::CustomerId ; "title case customer")]
#[test_case("CustomerId", CanonicalField::CustomerId ; "camel case customer")]
#[test_case("Product", CanonicalField::ProductName ; "product alias")]
#[test_case("Order_Date", CanonicalField::OrderDate ; "title case date")]
#[test_case(" Date ", CanonicalField::OrderDate ; "padded date")]
#[test_case("Shipping_Cost", CanonicalField::Measure(Measure::ShippingCost) ; "shipping cost")]
fn test_alias_matches(column: &str, field: CanonicalField) {
    assert!(AliasTable::standard().matches(field, column));
}

#[test]
fn test_alias_priority_beats_column_order() {
    let row = RawRow::new()
        .with("Date", "2025-10-31")
        .with("Order_Date", "2025-11-01");

    let idx = AliasTable::standard().resolve(CanonicalField::OrderDate, &row);
    assert_eq!(idx, Some(1));
}

#[test]
fn test_alias_same_name_first_column_wins() {
    let row = RawRow::new()
        .with("Order_Id", "first")
        .with("order_id", "second");

    let idx = AliasTable::standard().resolve(CanonicalField::OrderId, &row);
    assert_eq!(idx, Some(0));
}

#[test]
fn test_alias_table_extend() {
    let mut table = AliasTable::standard();
    table.extend(CanonicalField::CustomerId, ["Client_Id", "customer_id"]);

    assert_eq!(
        table.aliases(CanonicalField::CustomerId),
        ["customer_id", "customerid", "client_id"]
    );
}

#[test]
fn test_canonical_field_from_name() {
    assert_eq!(
        CanonicalField::from_name("Customer_Id").unwrap(),
        CanonicalField::CustomerId
    );
    assert_eq!(
        CanonicalField::from_name("profit").unwrap(),
        CanonicalField::Measure(Measure::Profit)
    );
    assert!(CanonicalField::from_name("region").is_err());
}

// ============================================================================
// Numeric Coercion Tests
// ============================================================================

#[test_case(RawValue::Null, Coercion::Null ; "null cell")]
#[test_case(RawValue::from(""), Coercion::Null ; "empty string")]
#[test_case(RawValue::from("   "), Coercion::Null ; "blank string")]
#[test_case(RawValue::from("10.5"), Coercion::Value(10.5) ; "decimal")]
#[test_case(RawValue::from(" 3 "), Coercion::Value(3.0) ; "padded integer")]
#[test_case(RawValue::from("-1e2"), Coercion::Value(-100.0) ; "exponent")]
#[test_case(RawValue::Number(7.25), Coercion::Value(7.25) ; "numeric cell")]
#[test_case(RawValue::from("abc"), Coercion::Failed ; "text")]
#[test_case(RawValue::from("1,234"), Coercion::Failed ; "thousands separator")]
#[test_case(RawValue::from("NaN"), Coercion::Failed ; "nan text")]
#[test_case(RawValue::Number(f64::INFINITY), Coercion::Failed ; "infinite number")]
fn test_coerce_numeric(value: RawValue, expected: Coercion) {
    assert_eq!(coerce_numeric(&value), expected);
}

// ============================================================================
// Reconciler Tests
// ============================================================================

#[test]
fn test_reconcile_aliases_and_trimming() {
    let row = RawRow::new()
        .with(" Order_Id ", " 1 ")
        .with("Order_Date", "2025-11-01")
        .with("CustomerId", "  C-9 ")
        .with("Product", " Widget ")
        .with("Sales", "10.5")
        .with("Region", "  West  ");

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(out.order_id.as_deref(), Some("1"));
    assert_eq!(out.date_value.as_deref(), Some("2025-11-01"));
    assert!(out.has_date_column);
    assert_eq!(out.customer_id.as_deref(), Some("C-9"));
    assert_eq!(out.product_name.as_deref(), Some("Widget"));
    assert_eq!(out.measures.sales, Some(10.5));
    assert_eq!(out.extra, vec![("Region".to_string(), Some("West".to_string()))]);
    assert!(out.coercion_failures.is_empty());
}

#[test]
fn test_reconcile_empty_numeric_is_null() {
    let row = RawRow::new()
        .with("order_date", "2025-11-01")
        .with("Sales", "")
        .with("Quantity", "  ")
        .with("Discount", RawValue::Null);

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(out.measures.sales, None);
    assert_eq!(out.measures.quantity, None);
    assert_eq!(out.measures.discount, None);
    assert!(out.coercion_failures.is_empty());
}

#[test]
fn test_reconcile_bad_numeric_keeps_row() {
    let row = RawRow::new()
        .with("Order_Id", "7")
        .with("Profit", "n/a")
        .with("Shipping_Cost", "4.20");

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(out.order_id.as_deref(), Some("7"));
    assert_eq!(out.measures.profit, None);
    assert_eq!(out.measures.shipping_cost, Some(4.2));
    assert_eq!(out.coercion_failures, vec![Measure::Profit]);
}

#[test]
fn test_reconcile_losing_alias_passes_through() {
    let row = RawRow::new()
        .with("Date", "2025-10-31")
        .with("order_date", "2025-11-01");

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(out.date_value.as_deref(), Some("2025-11-01"));
    assert_eq!(
        out.extra,
        vec![("Date".to_string(), Some("2025-10-31".to_string()))]
    );
}

#[test]
fn test_reconcile_duplicate_pass_through_names_are_suffixed() {
    let row = RawRow::new()
        .with("Notes", "first")
        .with(" Notes ", "second")
        .with("Notes", "third");

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(
        out.extra,
        vec![
            ("Notes".to_string(), Some("first".to_string())),
            ("Notes_1".to_string(), Some("second".to_string())),
            ("Notes_2".to_string(), Some("third".to_string())),
        ]
    );
}

#[test]
fn test_reconcile_numeric_in_string_column() {
    let row = RawRow::new().with("Order_Id", 42.0).with("Zip", 12345.0);

    let out = Reconciler::default().reconcile(&row);

    assert_eq!(out.order_id.as_deref(), Some("42"));
    assert_eq!(out.extra, vec![("Zip".to_string(), Some("12345".to_string()))]);
}

#[test]
fn test_reconcile_without_date_column() {
    let row = RawRow::new().with("Sales", "1");
    let out = Reconciler::default().reconcile(&row);

    assert!(!out.has_date_column);
    assert_eq!(out.date_value, None);
}

// ============================================================================
// Batch Profile Tests
// ============================================================================

#[test]
fn test_profile_detects_date_in_any_row() {
    let rows = vec![
        RawRow::new().with("Sales", "1"),
        RawRow::new().with("Sales", "2").with("DATE", "2025-11-01"),
    ];

    let profile = Reconciler::default().profile(&rows);
    assert!(profile.has_date_column);
    assert!(!profile.has_order_id_column);
}

#[test]
fn test_profile_without_date() {
    let rows = vec![RawRow::new().with("Order_Id", "1")];

    let profile = Reconciler::default().profile(&rows);
    assert!(!profile.has_date_column);
    assert!(profile.has_order_id_column);
}
