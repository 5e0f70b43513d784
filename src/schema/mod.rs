//! Schema of the polysomnography dataset.
//!
//! Column names used by the labeling rules, presence checks against an
//! Arrow schema, and numeric coercion of the metric columns.

use arrow::datatypes::Schema;

use crate::error::{LabelError, Result};

pub mod coerce;

pub use coerce::{
    CoercionReport, ColumnCoercion, coerce_numeric_columns, nullify_sentinel, to_float64,
};

/// Column names of the PSG metrics consumed by the labeling rules
pub mod columns {
    /// Overall apnea-hypopnea index
    pub const AHI_TOTAL: &str = "AHI_total";
    /// AHI in supine position
    pub const AHI_SUP: &str = "AHI_sup";
    /// AHI in lateral position
    pub const AHI_LAT: &str = "AHI_lat";
    /// AHI during REM sleep
    pub const AHI_REM: &str = "AHI_REM";
    /// AHI during NREM sleep
    pub const AHI_NREM: &str = "AHI_NREM";
    /// Minutes of REM sleep in supine position
    pub const REM_SUP_MIN: &str = "REM_sup_min";
    /// Minutes of REM sleep in lateral position
    pub const REM_LAT_MIN: &str = "REM_lat_min";
}

/// All metric columns coerced to `Float64` before labeling
pub const PSG_NUMERIC_COLUMNS: [&str; 7] = [
    columns::AHI_TOTAL,
    columns::AHI_SUP,
    columns::AHI_LAT,
    columns::AHI_REM,
    columns::AHI_NREM,
    columns::REM_SUP_MIN,
    columns::REM_LAT_MIN,
];

/// Returns the names in `required` that do not exist in `schema`, in order
#[must_use]
pub fn absent_columns<'a>(schema: &Schema, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| schema.index_of(name).is_err())
        .collect()
}

/// Fails with [`LabelError::MissingColumn`] on the first required column
/// absent from `schema`
pub fn require_columns(schema: &Schema, required: &[&str], family: &str) -> Result<()> {
    match absent_columns(schema, required).first() {
        Some(column) => Err(LabelError::missing_column(*column, family)),
        None => Ok(()),
    }
}
