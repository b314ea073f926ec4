//! Integration tests for the CSV → Parquet transform
//!
//! Tests the full end-to-end flow: CSV/CSV.gz files on disk → pipeline → dt-partitioned Parquet

use chrono::NaiveDate;
use orders_etl::cli::run_transform;
use orders_etl::output::{
    read_parquet_bytes, record_batch_to_rows, StorageLocation, STAGING_DIR, SUCCESS_MARKER,
};
use orders_etl::{CanonicalRow, PipelineConfig, PipelineState};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

struct Workspace {
    _root: TempDir,
    input: String,
    output: String,
}

impl Workspace {
    fn new() -> Self {
        let root = tempdir().unwrap();
        let input = root.path().join("incoming");
        std::fs::create_dir_all(&input).unwrap();
        let output = root.path().join("curated");
        Self {
            input: input.to_str().unwrap().to_string(),
            output: output.to_str().unwrap().to_string(),
            _root: root,
        }
    }

    fn write_csv(&self, name: &str, content: impl AsRef<[u8]>) {
        std::fs::write(Path::new(&self.input).join(name), content).unwrap();
    }

    fn write_csv_gz(&self, name: &str, content: &str) {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        std::fs::write(Path::new(&self.input).join(name), encoder.finish().unwrap()).unwrap();
    }

    fn config(&self, process_date: &str) -> PipelineConfig {
        PipelineConfig {
            input: Some(self.input.clone()),
            output: Some(self.output.clone()),
            process_date: Some(process_date.to_string()),
            parallelism: 2,
            ..PipelineConfig::default()
        }
    }

    async fn output_files(&self) -> Vec<String> {
        match StorageLocation::open(&self.output).unwrap() {
            Some(location) => location.list(None).await.unwrap(),
            None => Vec::new(),
        }
    }

    async fn partition_files(&self, partition: &str) -> Vec<String> {
        let location = StorageLocation::parse(&self.output).unwrap();
        location.list(Some(partition)).await.unwrap()
    }

    async fn read_partition(&self, partition: &str) -> Vec<CanonicalRow> {
        let location = StorageLocation::parse(&self.output).unwrap();
        let mut rows = Vec::new();
        for key in location.list(Some(partition)).await.unwrap() {
            let data = location.read(&key).await.unwrap();
            for batch in read_parquet_bytes(data).unwrap() {
                rows.extend(record_batch_to_rows(&batch).unwrap());
            }
        }
        rows
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Transform Integration Tests
// ============================================================================

#[tokio::test]
async fn test_transform_mixed_batch() {
    let ws = Workspace::new();
    ws.write_csv(
        "a.csv",
        "Order_Id,Order_Date,Sales\n1,2025-11-01,10.5\n,2025-11-01,\n,bad-date,3\n",
    );

    let summary = run_transform(&ws.config("2025-11-15")).await.unwrap();

    assert_eq!(summary.state, PipelineState::Done);
    assert_eq!(summary.files_read, 1);
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.total_excluded(), 1);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.ids_synthesized, 1);

    let mut rows = ws.read_partition("dt=2025-11-01").await;
    rows.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].order_id, "1");
    assert_eq!(rows[0].measures.sales, Some(10.5));
    assert_eq!(rows[1].order_id, "unknown_2025-11-01_1");
    assert_eq!(rows[1].order_date, date("2025-11-01"));
    assert_eq!(rows[1].measures.sales, None);

    let files = ws.output_files().await;
    assert!(files.contains(&SUCCESS_MARKER.to_string()));
    assert!(files.iter().all(|f| !f.starts_with(STAGING_DIR)));
    assert!(files
        .iter()
        .all(|f| f == SUCCESS_MARKER || f.starts_with("dt=2025-11-01/")));
}

#[tokio::test]
async fn test_transform_plain_and_gzip_inputs_across_partitions() {
    let ws = Workspace::new();
    ws.write_csv("day1.csv", "order_id,order_date,Region\n10,2025-11-01, West \n");
    ws.write_csv_gz(
        "day2.csv.gz",
        "ORDER_ID,ORDER_DATE,Profit\n20,2025-11-02,1.25\n21,2025-11-02,oops\n",
    );

    let summary = run_transform(&ws.config("2025-11-15")).await.unwrap();

    assert_eq!(summary.files_read, 2);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.coercion_failures, 1);
    assert_eq!(summary.rows_per_partition.len(), 2);

    let day1 = ws.read_partition("dt=2025-11-01").await;
    assert_eq!(day1.len(), 1);
    assert_eq!(day1[0].extra("Region"), Some("West"));

    let mut day2 = ws.read_partition("dt=2025-11-02").await;
    day2.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    assert_eq!(day2[0].measures.profit, Some(1.25));
    assert_eq!(day2[1].measures.profit, None);
}

#[tokio::test]
async fn test_transform_without_date_column_uses_process_date() {
    let ws = Workspace::new();
    ws.write_csv("a.csv", "Order_Id,Customer_Id\n1,C1\n2,C2\n");

    let summary = run_transform(&ws.config("2025-11-15")).await.unwrap();

    assert_eq!(summary.rows_written, 2);
    let rows = ws.read_partition("dt=2025-11-15").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.order_date == date("2025-11-15")));
}

#[tokio::test]
async fn test_transform_empty_input_writes_nothing() {
    let ws = Workspace::new();

    let summary = run_transform(&ws.config("2025-11-15")).await.unwrap();

    assert_eq!(summary.state, PipelineState::EmptyExit);
    assert_eq!(summary.rows_written, 0);
    assert!(ws.output_files().await.is_empty());
}

#[tokio::test]
async fn test_transform_rerun_appends_new_part_files() {
    let ws = Workspace::new();
    ws.write_csv("a.csv", "Order_Id,Order_Date\n1,2025-11-01\n");
    let config = ws.config("2025-11-15");

    let first = run_transform(&config).await.unwrap();
    let second = run_transform(&config).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(ws.partition_files("dt=2025-11-01").await.len(), 2);

    let rows = ws.read_partition("dt=2025-11-01").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.order_id == "1"));
}

#[tokio::test]
async fn test_transform_with_separate_staging_dir() {
    let ws = Workspace::new();
    let staging = tempdir().unwrap();
    ws.write_csv("a.csv", "Order_Id,Order_Date\n1,2025-11-03\n2,2025-11-03\n");

    let mut config = ws.config("2025-11-15");
    config.temp_dir = Some(staging.path().to_str().unwrap().to_string());
    config.shards_per_partition = 2;
    config.compression = "zstd".to_string();

    let summary = run_transform(&config).await.unwrap();

    assert_eq!(summary.rows_written, 2);
    let files = ws.partition_files("dt=2025-11-03").await;
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.ends_with(".zstd.parquet")));
    assert_eq!(ws.read_partition("dt=2025-11-03").await.len(), 2);

    let leftover = StorageLocation::parse(staging.path().to_str().unwrap())
        .unwrap()
        .list(None)
        .await
        .unwrap();
    assert!(leftover.is_empty());
}

#[tokio::test]
async fn test_transform_custom_aliases() {
    let ws = Workspace::new();
    ws.write_csv("a.csv", "ref,when\nX-1,2025-11-04\n");

    let mut config = ws.config("2025-11-15");
    config.aliases.insert("order_id".to_string(), vec!["ref".to_string()]);
    config.aliases.insert("order_date".to_string(), vec!["when".to_string()]);

    run_transform(&config).await.unwrap();

    let rows = ws.read_partition("dt=2025-11-04").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, "X-1");
}

#[tokio::test]
async fn test_transform_keeps_rows_with_invalid_utf8() {
    let ws = Workspace::new();
    ws.write_csv(
        "a.csv",
        &b"Order_Id,Order_Date,Notes\n1,2025-11-01,ok\n2,2025-11-01,caf\xE9\n3,2025-11-01,x\n"[..],
    );

    let summary = run_transform(&ws.config("2025-11-15")).await.unwrap();

    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.lossy_cells, 1);
    let mut rows = ws.read_partition("dt=2025-11-01").await;
    rows.sort_by(|a, b| a.order_id.cmp(&b.order_id));
    assert_eq!(rows[1].extra("Notes"), Some("caf\u{fffd}"));
}

#[tokio::test]
async fn test_transform_keeps_duplicate_headers() {
    let ws = Workspace::new();
    ws.write_csv("a.csv", "Order_Id,Order_Date,Notes,Notes\n1,2025-11-01,a,b\n");

    run_transform(&ws.config("2025-11-15")).await.unwrap();

    let rows = ws.read_partition("dt=2025-11-01").await;
    assert_eq!(rows[0].extra("Notes"), Some("a"));
    assert_eq!(rows[0].extra("Notes_1"), Some("b"));
}

#[tokio::test]
async fn test_transform_failed_commit_leaves_no_part_files() {
    let ws = Workspace::new();
    ws.write_csv("a.csv", "Order_Id,Order_Date\n1,2025-11-01\n2,2025-11-02\n");
    std::fs::create_dir_all(&ws.output).unwrap();
    std::fs::write(Path::new(&ws.output).join("dt=2025-11-02"), "blocker").unwrap();

    let err = run_transform(&ws.config("2025-11-15")).await.unwrap_err();

    assert!(err.is_sink_failure());
    let files = ws.output_files().await;
    assert_eq!(files, vec!["dt=2025-11-02".to_string()]);
}

#[tokio::test]
async fn test_transform_requires_output() {
    let ws = Workspace::new();
    let mut config = ws.config("2025-11-15");
    config.output = None;

    assert!(run_transform(&config).await.is_err());
}
