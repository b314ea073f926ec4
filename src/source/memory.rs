//! In-memory batch source

use super::types::{Batch, BatchSource, InputScope};
use crate::error::{Error, Result};
use crate::types::RawRow;
use async_trait::async_trait;

/// Serves a fixed set of rows for any scope
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<RawRow>,
    unavailable: Option<String>,
}

impl MemorySource {
    /// Create a source serving `rows`
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            unavailable: None,
        }
    }

    /// A source whose every load fails
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            unavailable: Some(message.into()),
        }
    }
}

#[async_trait]
impl BatchSource for MemorySource {
    async fn load(&self, scope: &InputScope) -> Result<Batch> {
        if let Some(message) = &self.unavailable {
            return Err(Error::source_unavailable(scope.as_str(), message.clone()));
        }
        Ok(Batch::new(self.rows.clone(), Vec::new()))
    }
}
