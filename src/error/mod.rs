//! Error handling for the labeling pipeline.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the labeling pipeline
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error raised by an Arrow compute kernel or the CSV reader/writer
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error reading or writing JSON configuration and summaries
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column required by a rule family is absent from the dataset schema
    #[error("Column '{column}' required by {family} is missing from the dataset")]
    MissingColumn {
        /// Name of the absent column
        column: String,
        /// Rule family or processing step that needed it
        family: String,
    },

    /// The file extension does not map to a supported table format
    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    /// Error evaluating a filter expression or applying a mask
    #[error("Filter error: {0}")]
    Filter(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LabelError {
    /// Create a missing column error for the given family
    pub fn missing_column(column: impl Into<String>, family: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            family: family.into(),
        }
    }

    /// Create a filter error
    pub fn filter_error(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }
}

/// Result type for labeling operations
pub type Result<T> = std::result::Result<T, LabelError>;
