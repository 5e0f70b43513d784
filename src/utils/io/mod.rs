//! IO utilities for table files
//!
//! This module reads whole tables into a single record batch and writes
//! record batches back out, dispatching on CSV or Parquet.

pub mod csv;
pub mod parquet;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Default number of rows per batch while reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Supported table file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Apache Parquet
    Parquet,
}

impl TableFormat {
    /// Determine the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(LabelError::UnsupportedFormat(format!(
                "{} (extension '.{other}')",
                path.display()
            ))),
        }
    }

    /// File extension written for this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for TableFormat {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(LabelError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read a whole table file into one record batch
///
/// The format is chosen from the file extension.
pub fn read_table(path: &Path) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log_operation_start("Reading table", path);

    let batch = match TableFormat::from_path(path)? {
        TableFormat::Csv => csv::read_csv(path)?,
        TableFormat::Parquet => parquet::read_parquet(path)?,
    };

    log_operation_complete("read", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Write a record batch as a table file, creating parent directories
pub fn write_table(batch: &RecordBatch, path: &Path, format: TableFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match format {
        TableFormat::Csv => csv::write_csv(batch, path)?,
        TableFormat::Parquet => parquet::write_parquet(batch, path)?,
    }

    log_operation_complete("wrote", path, batch.num_rows(), None);
    Ok(())
}

/// Path of a table named `stem` inside `dir`
#[must_use]
pub fn table_path(dir: &Path, stem: &str, format: TableFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}
