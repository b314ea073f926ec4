//! Tests for partition module

use super::*;
use crate::output::{MemorySink, PartitionedSink};
use crate::types::{CanonicalRow, Measures};
use chrono::NaiveDate;
use std::sync::Arc;
use test_case::test_case;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
}

fn row(id: &str, day: u32) -> CanonicalRow {
    CanonicalRow {
        order_id: id.to_string(),
        order_date: date(day),
        customer_id: None,
        product_name: None,
        measures: Measures::default(),
        extra: Vec::new(),
    }
}

// ============================================================================
// PartitionKey Tests
// ============================================================================

#[test]
fn test_partition_key_dir_name() {
    let key = PartitionKey::from_date(date(1));
    assert_eq!(key.to_string(), "2025-11-01");
    assert_eq!(key.dir_name(), "dt=2025-11-01");
    assert_eq!(key.date(), date(1));
}

#[test]
fn test_partition_key_ordering_follows_dates() {
    let mut keys = vec![
        PartitionKey::from_date(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
        PartitionKey::from_date(date(2)),
        PartitionKey::from_date(date(1)),
    ];
    keys.sort();
    let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["2025-11-01", "2025-11-02", "2025-12-01"]);
}

#[test_case("2025-11-01" => true ; "canonical")]
#[test_case("2025-1-01" => false ; "short month")]
#[test_case("2025-02-30" => false ; "impossible day")]
#[test_case("dt=2025-11-01" => false ; "directory form")]
fn test_partition_key_parse(value: &str) -> bool {
    PartitionKey::parse(value).is_ok()
}

#[test]
fn test_partition_key_serializes_as_string() {
    let json = serde_json::to_string(&PartitionKey::from_date(date(3))).unwrap();
    assert_eq!(json, "\"2025-11-03\"");
}

// ============================================================================
// WriteReport Tests
// ============================================================================

#[test]
fn test_write_report_totals() {
    let mut report = WriteReport::default();
    let first = PartitionKey::from_date(date(1));
    let second = PartitionKey::from_date(date(2));

    report.record(first, 2);
    report.record(second, 1);
    report.record(first, 3);

    assert_eq!(report.rows_for(&first), 5);
    assert_eq!(report.rows_for(&PartitionKey::from_date(date(9))), 0);
    assert_eq!(report.total_rows(), 6);
    assert_eq!(report.partition_count(), 2);
}

// ============================================================================
// Writer Tests
// ============================================================================

#[test]
fn test_group_by_partition_preserves_row_order() {
    let groups = group_by_partition(vec![row("a", 2), row("b", 1), row("c", 2)]);

    let keys: Vec<String> = groups.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["2025-11-01", "2025-11-02"]);

    let ids: Vec<&str> = groups[&PartitionKey::from_date(date(2))]
        .iter()
        .map(|r| r.order_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn test_writer_reports_rows_per_partition() {
    let sink = Arc::new(MemorySink::new());
    let writer = PartitionedWriter::new(sink.clone())
        .with_options(WriterOptions::new().with_max_concurrent_writes(2));

    let rows = vec![row("a", 1), row("b", 2), row("c", 1), row("d", 3)];
    let report = writer.write(rows).await.unwrap();

    assert_eq!(report.total_rows(), 4);
    assert_eq!(report.rows_for(&PartitionKey::from_date(date(1))), 2);
    assert_eq!(report.partition_count(), 3);

    sink.commit().await.unwrap();
    assert_eq!(sink.partitions().await.len(), 3);
}

#[tokio::test]
async fn test_writer_leaves_rows_staged_until_commit() {
    let sink = Arc::new(MemorySink::new());
    let writer = PartitionedWriter::new(sink.clone());

    writer.write(vec![row("a", 1)]).await.unwrap();

    assert!(sink.committed_rows().await.is_empty());
    assert_eq!(sink.staged_count().await, 1);
}

#[tokio::test]
async fn test_writer_empty_input() {
    let sink = Arc::new(MemorySink::new());
    let report = PartitionedWriter::new(sink).write(Vec::new()).await.unwrap();
    assert_eq!(report, WriteReport::default());
}

#[tokio::test]
async fn test_writer_propagates_sink_failure() {
    let failing = PartitionKey::from_date(date(2));
    let sink = Arc::new(MemorySink::new().failing_on(failing));
    let writer = PartitionedWriter::new(sink);

    let err = writer
        .write(vec![row("a", 1), row("b", 2)])
        .await
        .unwrap_err();
    assert!(err.is_sink_failure());
    assert!(err.to_string().contains("2025-11-02"));
}
