//! Missing-data filtering
//!
//! Keeps only the records where every required column holds a usable
//! number. This is the eligibility step in front of each rule family.

use std::collections::HashSet;

use arrow::array::BooleanArray;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::core::{BatchFilter, filter_record_batch};
use crate::schema::{absent_columns, to_float64};

/// Result of applying a [`RequiredColumnsFilter`]
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Records with every required column present
    pub batch: RecordBatch,
    /// Number of records dropped
    pub removed: usize,
    /// Required columns that do not exist in the input schema
    pub absent_columns: Vec<String>,
}

/// Drops records with a missing value in any of the required columns
///
/// A value is missing when it is null, NaN, or cannot be read as a number.
/// If a required column does not exist at all, no record is eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredColumnsFilter {
    columns: Vec<String>,
}

impl RequiredColumnsFilter {
    /// Create a filter over the given column names
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Row mask that is true where every required column is present
    pub fn presence_mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let mut present = vec![true; batch.num_rows()];
        let schema = batch.schema();

        for name in &self.columns {
            let Ok(idx) = schema.index_of(name) else {
                present.fill(false);
                break;
            };

            let values = to_float64(batch.column(idx))?;
            for (keep, value) in present.iter_mut().zip(values.iter()) {
                *keep &= value.is_some();
            }
        }

        Ok(BooleanArray::from(present))
    }

    /// Apply the filter and report what was removed
    pub fn apply(&self, batch: &RecordBatch) -> Result<FilterOutcome> {
        let required: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let absent: Vec<String> = absent_columns(&batch.schema(), &required)
            .into_iter()
            .map(str::to_string)
            .collect();
        if !absent.is_empty() {
            log::warn!(
                "Required columns {absent:?} not found, no records are eligible"
            );
        }

        let mask = self.presence_mask(batch)?;
        let filtered = filter_record_batch(batch, &mask)?;

        Ok(FilterOutcome {
            removed: batch.num_rows() - filtered.num_rows(),
            batch: filtered,
            absent_columns: absent,
        })
    }
}

impl BatchFilter for RequiredColumnsFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        Ok(self.apply(batch)?.batch)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.columns.iter().cloned().collect()
    }
}
