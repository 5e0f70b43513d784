//! Core filtering functionality for record batches
//!
//! This module defines the [`BatchFilter`] trait shared by the cohort
//! filters, the mask application used by all of them, and the AND
//! combinator used to chain filtering steps.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::error::{FilterResultExt, filter_err};

/// Filter a record batch based on a boolean mask
///
/// Null mask entries drop the row, same as `false`.
///
/// # Arguments
/// * `batch` - The record batch to filter
/// * `mask` - The boolean mask indicating which rows to keep
///
/// # Returns
/// A new record batch with only rows where mask is true
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return filter_err(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        ));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<std::result::Result<_, _>>()
        .with_filter_context("Failed to apply boolean filter to columns")?;

    // try_new_with_options keeps the row count for batches without columns
    let options = arrow::record_batch::RecordBatchOptions::new()
        .with_row_count(Some(mask.true_count()));
    RecordBatch::try_new_with_options(batch.schema(), filtered_columns, &options)
        .with_filter_context("Failed to create filtered record batch")
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug {
    /// Filter a record batch, returning a new batch with the kept rows
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;
}

/// A filter that combines multiple filters with a logical AND
///
/// Filters run in order; later filters only see rows kept by earlier ones
/// and are skipped once the batch is empty.
#[derive(Debug, Clone)]
pub struct AndFilter {
    filters: Vec<Arc<dyn BatchFilter + Send + Sync>>,
}

impl AndFilter {
    /// Create a new AND filter
    #[must_use]
    pub fn new(filters: Vec<Arc<dyn BatchFilter + Send + Sync>>) -> Self {
        Self { filters }
    }
}

impl BatchFilter for AndFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mut result_batch = batch.clone();

        for filter in &self.filters {
            if result_batch.num_rows() == 0 {
                return Ok(result_batch);
            }

            result_batch = filter.filter(&result_batch)?;
        }

        Ok(result_batch)
    }

    fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        for filter in &self.filters {
            columns.extend(filter.required_columns());
        }
        columns
    }
}
