//! CSV batch source and codec
//!
//! Reads every `*.csv` / `*.csv.gz` object under an input prefix. The first
//! record of each file is its header.

use super::types::{Batch, BatchSource, InputScope};
use crate::error::{Error, Result};
use crate::output::StorageLocation;
use crate::types::{RawRow, RawValue};
use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::borrow::Cow;
use std::io::{Read, Write};
use tracing::{debug, info, warn};

/// A parsed CSV file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    /// Trimmed header names
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Cells holding invalid UTF-8, decoded with replacement characters
    pub lossy_cells: usize,
}

/// Whether an object key names a readable input file
///
/// Keys with a `_` or `.` prefixed segment (markers, staging, hidden files)
/// are skipped.
pub fn is_input_file(key: &str) -> bool {
    let lower = key.to_lowercase();
    let hidden = key
        .split('/')
        .any(|segment| segment.starts_with('_') || segment.starts_with('.'));
    !hidden && (lower.ends_with(".csv") || lower.ends_with(".csv.gz"))
}

/// Whether a key or path is gzip compressed
pub fn is_gzip(path: &str) -> bool {
    path.to_lowercase().ends_with(".gz")
}

/// Parse CSV bytes (optionally gzip) into trimmed headers and raw rows
///
/// Short records are padded with nulls; cells past the header get `_c{i}`
/// names. Invalid UTF-8 is replaced with U+FFFD rather than failing the file.
pub fn parse_csv_bytes(data: &[u8], gzip: bool, origin: &str) -> Result<CsvTable> {
    let input: Box<dyn Read + '_> = if gzip {
        Box::new(MultiGzDecoder::new(data))
    } else {
        Box::new(data)
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut lossy_cells = 0;
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| Error::csv_parse(origin, e.to_string()))?
        .iter()
        .map(|h| {
            let (name, _) = decode_cell(h);
            name.trim_start_matches('\u{feff}').trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.byte_records().enumerate() {
        let record =
            record.map_err(|e| Error::csv_parse(origin, format!("record {}: {e}", line + 1)))?;
        let width = headers.len().max(record.len());
        let mut row = RawRow::new();
        for i in 0..width {
            let name = headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("_c{i}"));
            let value = match record.get(i) {
                Some(cell) => {
                    let (text, lossy) = decode_cell(cell);
                    if lossy {
                        lossy_cells += 1;
                        debug!(origin, record = line + 1, column = %name, "replaced invalid utf-8");
                    }
                    RawValue::from(text)
                }
                None => RawValue::Null,
            };
            row.push(name, value);
        }
        rows.push(row);
    }

    if lossy_cells > 0 {
        warn!(origin, cells = lossy_cells, "decoded invalid utf-8 with replacement characters");
    }
    debug!(origin, rows = rows.len(), columns = headers.len(), "parsed csv");
    Ok(CsvTable {
        headers,
        rows,
        lossy_cells,
    })
}

/// Decode a cell as UTF-8, reporting whether any bytes were replaced
fn decode_cell(bytes: &[u8]) -> (String, bool) {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => (text.to_string(), false),
        Cow::Owned(text) => (text, true),
    }
}

/// Encode rows as CSV under the given header (optionally gzip)
///
/// Null cells and columns a row lacks are written as empty fields.
pub fn encode_csv(headers: &[String], rows: &[RawRow], gzip: bool) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.get(h)
                    .and_then(RawValue::as_text)
                    .map(|s| s.into_owned())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }
    let plain = writer
        .into_inner()
        .map_err(|e| Error::output(format!("Failed to flush csv: {e}")))?;

    if !gzip {
        return Ok(plain);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain)?;
    Ok(encoder.finish()?)
}

/// Batch source over CSV files in local or object storage
#[derive(Debug, Clone, Default)]
pub struct CsvSource;

impl CsvSource {
    /// Create a CSV source
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BatchSource for CsvSource {
    async fn load(&self, scope: &InputScope) -> Result<Batch> {
        let unavailable = |e: Error| Error::source_unavailable(scope.as_str(), e.to_string());

        let Some(location) = StorageLocation::open(scope.as_str()).map_err(unavailable)? else {
            warn!(input = %scope, "input prefix does not exist");
            return Ok(Batch::default());
        };

        let keys: Vec<String> = location
            .list(None)
            .await
            .map_err(unavailable)?
            .into_iter()
            .filter(|key| is_input_file(key))
            .collect();

        let mut batch = Batch::default();
        for key in &keys {
            let data = location.read(key).await.map_err(unavailable)?;
            let path = location.display_path(key);
            let table = parse_csv_bytes(&data, is_gzip(key), &path)?;
            debug!(file = %path, rows = table.rows.len(), "read input file");
            batch.rows.extend(table.rows);
            batch.lossy_cells += table.lossy_cells;
            batch.files.push(path);
        }

        info!(input = %scope, files = batch.files.len(), rows = batch.rows.len(), "loaded batch");
        Ok(batch)
    }
}
