//! Tests for pipeline module

use super::*;
use crate::dates::ExclusionReason;
use crate::identity::IdentifierSynthesizer;
use crate::output::{MemorySink, PartitionedSink};
use crate::partition::PartitionKey;
use crate::reconcile::{AliasTable, CanonicalField, Reconciler};
use crate::source::{InputScope, MemorySource};
use crate::types::{CanonicalRow, RawRow};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
}

fn context() -> PipelineContext {
    PipelineContext::new(date(15), InputScope::new("memory"), "memory").with_run_id("test-run")
}

fn driver(rows: Vec<RawRow>) -> (PipelineDriver, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let driver = PipelineDriver::new(Arc::new(MemorySource::new(rows)), sink.clone());
    (driver, sink)
}

fn scenario_rows() -> Vec<RawRow> {
    vec![
        RawRow::new()
            .with("Order_Id", "1")
            .with("Order_Date", "2025-11-01")
            .with("Sales", "10.5"),
        RawRow::new()
            .with("order_date", "2025-11-01")
            .with("Sales", ""),
        RawRow::new().with("order_date", "bad-date"),
    ]
}

// ============================================================================
// Context And State Tests
// ============================================================================

#[test]
fn test_context_defaults() {
    let ctx = PipelineContext::new(date(1), InputScope::new("in"), "out");
    assert_eq!(ctx.parallelism, 1);
    assert_eq!(ctx.max_concurrent_writes, 4);
    assert_eq!(ctx.run_id.len(), 32);
    assert_ne!(ctx.run_id, new_run_id());
}

#[test]
fn test_context_builders_clamp_to_one() {
    let ctx = context().with_parallelism(0).with_max_concurrent_writes(0);
    assert_eq!(ctx.parallelism, 1);
    assert_eq!(ctx.max_concurrent_writes, 1);
}

#[test]
fn test_state_names() {
    assert_eq!(PipelineState::EmptyExit.to_string(), "EMPTY_EXIT");
    assert_eq!(
        serde_json::to_string(&PipelineState::Partitioned).unwrap(),
        "\"PARTITIONED\""
    );
    assert!(PipelineState::Done.is_terminal());
    assert!(!PipelineState::Identified.is_terminal());
}

#[test]
fn test_summary_serializes_counts() {
    let mut summary = RunSummary::new(&context());
    summary.add_exclusion(ExclusionReason::UnparseableDate);
    summary.rows_per_partition.insert(PartitionKey::from_date(date(1)), 2);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["process_date"], "2025-11-15");
    assert_eq!(json["state"], "START");
    assert_eq!(json["rows_excluded"]["unparseable_date"], 1);
    assert_eq!(json["rows_per_partition"]["2025-11-01"], 2);
}

// ============================================================================
// Driver Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_scenario() {
    let (driver, sink) = driver(scenario_rows());

    let summary = driver.run(&context()).await.unwrap();

    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.excluded(ExclusionReason::UnparseableDate), 1);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.ids_synthesized, 1);
    assert_eq!(summary.files_committed, vec!["dt=2025-11-01".to_string()]);

    let rows = sink.partition(&PartitionKey::from_date(date(1))).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].order_id, "1");
    assert_eq!(rows[0].measures.sales, Some(10.5));
    assert_eq!(rows[1].order_id, "unknown_2025-11-01_1");
    assert_eq!(rows[1].measures.sales, None);
    assert_eq!(sink.partitions().await.len(), 1);
}

#[tokio::test]
async fn test_empty_batch_exits_without_writing() {
    let (driver, sink) = driver(Vec::new());

    let summary = driver.run(&context()).await.unwrap();

    assert_eq!(summary.state, PipelineState::EmptyExit);
    assert_eq!(summary.rows_written, 0);
    assert!(summary.files_committed.is_empty());
    assert!(sink.partitions().await.is_empty());
}

#[tokio::test]
async fn test_no_date_column_uses_process_date() {
    let rows = vec![
        RawRow::new().with("Order_Id", "1"),
        RawRow::new().with("Order_Id", "2").with("Region", " West "),
    ];
    let (driver, sink) = driver(rows);

    let summary = driver.run(&context()).await.unwrap();

    assert_eq!(summary.total_excluded(), 0);
    let written = sink.partition(&PartitionKey::from_date(date(15))).await;
    assert_eq!(written.len(), 2);
    assert_eq!(written[1].extra("Region"), Some("West"));
}

#[tokio::test]
async fn test_missing_and_unparseable_dates_counted_separately() {
    let rows = vec![
        RawRow::new().with("date", "2025-11-02"),
        RawRow::new().with("date", ""),
        RawRow::new().with("Region", "East"),
        RawRow::new().with("date", "11/02/2025"),
    ];
    let (driver, sink) = driver(rows);

    let summary = driver.run(&context()).await.unwrap();

    assert_eq!(summary.excluded(ExclusionReason::MissingDate), 2);
    assert_eq!(summary.excluded(ExclusionReason::UnparseableDate), 1);
    assert_eq!(sink.committed_rows().await.len(), 1);
}

#[tokio::test]
async fn test_rerun_appends_duplicates() {
    let (driver, sink) = driver(scenario_rows());

    driver.run(&context()).await.unwrap();
    driver.run(&context()).await.unwrap();

    let rows = sink.partition(&PartitionKey::from_date(date(1))).await;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], rows[2]);
    assert_eq!(rows[1], rows[3]);
}

#[tokio::test]
async fn test_coercion_failures_counted() {
    let rows = vec![RawRow::new()
        .with("Order_Id", "1")
        .with("Sales", "ten")
        .with("Profit", "NaN")
        .with("Quantity", "3")];
    let (driver, sink) = driver(rows);

    let summary = driver.run(&context()).await.unwrap();

    assert_eq!(summary.coercion_failures, 2);
    let row = &sink.committed_rows().await[0];
    assert_eq!(row.measures.sales, None);
    assert_eq!(row.measures.quantity, Some(3.0));
}

#[tokio::test]
async fn test_source_failure_is_fatal() {
    let sink = Arc::new(MemorySink::new());
    let driver = PipelineDriver::new(Arc::new(MemorySource::unavailable("gone")), sink.clone());

    let err = driver.run(&context()).await.unwrap_err();
    assert!(err.is_source_failure());
    assert!(sink.partitions().await.is_empty());
}

#[tokio::test]
async fn test_sink_failure_aborts_without_commit() {
    let rows = vec![
        RawRow::new().with("date", "2025-11-01"),
        RawRow::new().with("date", "2025-11-02"),
    ];
    let sink = Arc::new(MemorySink::new().failing_on(PartitionKey::from_date(date(2))));
    let driver = PipelineDriver::new(Arc::new(MemorySource::new(rows)), sink.clone());

    let err = driver.run(&context()).await.unwrap_err();

    assert!(err.is_sink_failure());
    assert_eq!(sink.staged_count().await, 0);
    sink.commit().await.unwrap();
    assert!(sink.committed_rows().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_on_multi_thread_runtime() {
    let (driver, sink) = driver(scenario_rows());
    let ctx = context().with_parallelism(4);

    let summary = driver.run(&ctx).await.unwrap();

    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.rows_written, 2);
    let rows = sink.partition(&PartitionKey::from_date(date(1))).await;
    assert_eq!(rows[1].order_id, "unknown_2025-11-01_1");
}

#[tokio::test]
async fn test_commit_failure_aborts_staged_rows() {
    let sink = Arc::new(MemorySink::new().failing_commit());
    let driver = PipelineDriver::new(Arc::new(MemorySource::new(scenario_rows())), sink.clone());

    let err = driver.run(&context()).await.unwrap_err();

    assert!(err.is_sink_failure());
    assert_eq!(sink.staged_count().await, 0);
    assert!(sink.committed_rows().await.is_empty());
}

#[tokio::test]
async fn test_custom_aliases_and_placeholder() {
    let rows = vec![RawRow::new().with("Buyer", "B-7").with("Day", "2025-11-03")];
    let mut aliases = AliasTable::standard();
    aliases.extend(CanonicalField::CustomerId, ["buyer"]);
    aliases.extend(CanonicalField::OrderDate, ["day"]);

    let sink = Arc::new(MemorySink::new());
    let driver = PipelineDriver::new(Arc::new(MemorySource::new(rows)), sink.clone())
        .with_reconciler(Reconciler::new(aliases))
        .with_synthesizer(IdentifierSynthesizer::new().with_placeholder("anon"));

    driver.run(&context()).await.unwrap();

    let rows = sink.partition(&PartitionKey::from_date(date(3))).await;
    assert_eq!(rows[0].order_id, "B-7_2025-11-03_0");
    assert_eq!(rows[0].customer_id.as_deref(), Some("B-7"));
}

// ============================================================================
// Normalization Tests
// ============================================================================

fn many_rows(n: usize) -> Vec<RawRow> {
    (0..n)
        .map(|i| {
            RawRow::new()
                .with("Customer_Id", format!("C{}", i % 7))
                .with("Order_Date", format!("2025-11-{:02}", i % 28 + 1))
                .with("Sales", format!("{i}.5"))
        })
        .collect()
}

fn normalize(parallelism: usize, rows: Vec<RawRow>) -> Vec<CanonicalRow> {
    let (driver, _) = driver(Vec::new());
    let ctx = context().with_parallelism(parallelism);
    let mut summary = RunSummary::new(&ctx);
    driver.normalize(&ctx, rows, &mut summary).unwrap()
}

#[test]
fn test_normalize_is_independent_of_thread_count() {
    let n = CHUNK_SIZE * 2 + 17;
    let sequential = normalize(1, many_rows(n));
    let parallel = normalize(4, many_rows(n));

    assert_eq!(sequential.len(), n);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_normalize_synthesized_ids_unique() {
    let n = CHUNK_SIZE + 100;
    let rows = normalize(3, many_rows(n));

    let ids: std::collections::HashSet<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(ids.len(), n);
    let expected = format!(
        "C{}_2025-11-{:02}_{}",
        CHUNK_SIZE % 7,
        CHUNK_SIZE % 28 + 1,
        CHUNK_SIZE
    );
    assert_eq!(rows[CHUNK_SIZE].order_id, expected);
}

#[test]
fn test_normalize_canonical_rows_are_fixed_point() {
    let first = normalize(1, scenario_rows());
    let again = normalize(1, first.iter().map(CanonicalRow::to_raw_row).collect());
    assert_eq!(first, again);
}
