//! Loading of PSG datasets.
//!
//! Reads a table file and coerces the PSG metric columns to `Float64` so
//! the labeling rules see one consistent numeric type.

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::{CoercionReport, PSG_NUMERIC_COLUMNS, coerce_numeric_columns};
use crate::utils::io::read_table;
use crate::utils::logging::log_warning;

/// A dataset ready for labeling
#[derive(Debug, Clone)]
pub struct PsgDataset {
    /// File the records were read from
    pub source: PathBuf,
    /// Records with numeric metric columns
    pub batch: RecordBatch,
    /// What the numeric coercion changed
    pub coercion: CoercionReport,
}

impl PsgDataset {
    /// Read `path` and coerce its metric columns
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_table(path)?;
        let (batch, coercion) = prepare_batch(&raw)?;

        log::info!("initial dataset size: {} patients", batch.num_rows());
        if !coercion.absent.is_empty() {
            log_warning(
                &format!("Metric columns {:?} not found", coercion.absent),
                Some(path),
            );
        }

        Ok(Self {
            source: path.to_path_buf(),
            batch,
            coercion,
        })
    }

    /// Number of records
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Coerce the PSG metric columns of an in-memory batch
pub fn prepare_batch(batch: &RecordBatch) -> Result<(RecordBatch, CoercionReport)> {
    let (batch, report) = coerce_numeric_columns(batch, &PSG_NUMERIC_COLUMNS)?;
    if report.total_coerced() > 0 {
        log::info!(
            "{} non-numeric metric values treated as missing",
            report.total_coerced()
        );
    }
    Ok((batch, report))
}
