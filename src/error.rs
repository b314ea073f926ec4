//! Error types for the orders pipeline
//!
//! Only infrastructure failures surface as `Error`. Row-level problems
//! (bad numeric cells, unresolvable dates) are absorbed and counted by the
//! pipeline and never reach this type.

use thiserror::Error;

/// The main error type for the orders pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    DateParse(#[from] chrono::ParseError),

    // ============================================================================
    // Source Errors (fatal)
    // ============================================================================
    #[error("Batch source unavailable at '{scope}': {message}")]
    SourceUnavailable { scope: String, message: String },

    #[error("CSV parsing error in '{path}': {message}")]
    CsvParse { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // ============================================================================
    // Sink Errors (fatal)
    // ============================================================================
    #[error("Write to partition '{partition}' failed: {message}")]
    SinkWrite { partition: String, message: String },

    #[error("Commit failed: {message}")]
    Commit { message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Create a CSV parse error for a specific file
    pub fn csv_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CsvParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            partition: partition.into(),
            message: message.into(),
        }
    }

    /// Create a commit error
    pub fn commit(message: impl Into<String>) -> Self {
        Self::Commit {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Whether the error came from reading the batch
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable { .. } | Error::CsvParse { .. } | Error::Csv(_)
        )
    }

    /// Whether the error came from landing output
    pub fn is_sink_failure(&self) -> bool {
        matches!(
            self,
            Error::SinkWrite { .. }
                | Error::Commit { .. }
                | Error::ObjectStore(_)
                | Error::Parquet(_)
                | Error::Output { .. }
        )
    }
}

/// Result type alias for the orders pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
