//! Batch source types

use crate::error::Result;
use crate::types::RawRow;
use async_trait::async_trait;
use std::fmt;

/// Where a batch is read from: a local directory or an object store prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputScope {
    location: String,
}

impl InputScope {
    /// Create a scope from a path or URL
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// The path or URL
    pub fn as_str(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for InputScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Raw rows of one run plus the files they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub rows: Vec<RawRow>,
    pub files: Vec<String>,
    /// Cells whose bytes were not valid UTF-8 and were decoded lossily
    pub lossy_cells: usize,
}

impl Batch {
    /// Create a batch
    pub fn new(rows: Vec<RawRow>, files: Vec<String>) -> Self {
        Self {
            rows,
            files,
            lossy_cells: 0,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Produces the raw rows of one run
///
/// "No files" and "no rows" are an empty batch, not an error.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Load every row under the scope
    async fn load(&self, scope: &InputScope) -> Result<Batch>;
}
