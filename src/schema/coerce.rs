//! Numeric coercion of PSG metric columns.
//!
//! Values that cannot be read as a real number become null instead of
//! failing the load. NaN is normalised to null as well, so downstream code
//! only has one notion of "missing".

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Scalar, new_null_array,
};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{can_cast_types, cast, nullif};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::error::Result;

/// Outcome of coercing one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnCoercion {
    /// Column name
    pub column: String,
    /// Arrow type the column had before coercion
    pub source_type: String,
    /// Values that were present but not interpretable as a number
    pub coerced_to_null: usize,
}

/// Summary of a coercion pass over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    /// Per-column results for the columns that exist in the batch
    pub columns: Vec<ColumnCoercion>,
    /// Requested columns that do not exist in the batch
    pub absent: Vec<String>,
}

impl CoercionReport {
    /// Total number of values turned into nulls across all columns
    #[must_use]
    pub fn total_coerced(&self) -> usize {
        self.columns.iter().map(|c| c.coerced_to_null).sum()
    }

    /// Fold in the report of a coercion pass that ran before this one
    ///
    /// Counts add up per column, and the source type is taken from the
    /// earlier pass since that saw the original data.
    pub fn merge_earlier(&mut self, earlier: &Self) {
        for before in &earlier.columns {
            match self.columns.iter_mut().find(|c| c.column == before.column) {
                Some(after) => {
                    after.coerced_to_null += before.coerced_to_null;
                    after.source_type.clone_from(&before.source_type);
                }
                None => self.columns.push(before.clone()),
            }
        }
    }
}

/// Convert any Arrow array to `Float64`, turning unparseable values and NaN
/// into nulls
///
/// Types Arrow cannot cast to `Float64` at all yield an all-null array.
pub fn to_float64(array: &ArrayRef) -> Result<Float64Array> {
    let casted = match array.data_type() {
        DataType::Float64 => array.clone(),
        source if can_cast_types(source, &DataType::Float64) => cast(array, &DataType::Float64)?,
        source => {
            log::debug!("Type {source} cannot be read as Float64, treating all values as missing");
            new_null_array(&DataType::Float64, array.len())
        }
    };

    Ok(casted
        .as_primitive::<Float64Type>()
        .iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

/// Coerce the named columns of `batch` to nullable `Float64`
///
/// Columns not present in the batch are listed in the report and otherwise
/// ignored; all other columns are carried over unchanged.
pub fn coerce_numeric_columns(
    batch: &RecordBatch,
    columns: &[&str],
) -> Result<(RecordBatch, CoercionReport)> {
    let schema = batch.schema();
    let mut report = CoercionReport::default();
    let mut replacements = HashMap::new();

    for name in columns {
        let Ok(idx) = schema.index_of(name) else {
            report.absent.push((*name).to_string());
            continue;
        };

        let source = batch.column(idx);
        let floats = to_float64(source)?;
        let coerced_to_null = floats.null_count().saturating_sub(source.null_count());
        if coerced_to_null > 0 {
            log::debug!("Column {name}: {coerced_to_null} non-numeric values treated as missing");
        }

        report.columns.push(ColumnCoercion {
            column: (*name).to_string(),
            source_type: source.data_type().to_string(),
            coerced_to_null,
        });
        replacements.insert(idx, Arc::new(floats) as ArrayRef);
    }

    Ok((with_replaced_columns(batch, replacements)?, report))
}

/// Replace `sentinel` with null in the named columns
///
/// Numeric columns come out as `Float64`. Text columns keep their type and
/// only values that read as the sentinel number are nulled, so text answers
/// survive. Returns the new batch and the number of sentinel values
/// replaced. Absent columns are skipped.
pub fn nullify_sentinel(
    batch: &RecordBatch,
    columns: &[String],
    sentinel: f64,
) -> Result<(RecordBatch, usize)> {
    let schema = batch.schema();
    let mut replaced = 0;
    let mut replacements = HashMap::new();

    for name in columns {
        let Ok(idx) = schema.index_of(name) else {
            continue;
        };

        let column = batch.column(idx);
        let (mask, values) = if is_text(column.data_type()) {
            (text_sentinel_mask(column, sentinel)?, column.clone())
        } else {
            let floats: ArrayRef = Arc::new(to_float64(column)?);
            let target = Scalar::new(Float64Array::from(vec![sentinel]));
            (eq(&floats, &target)?, floats)
        };

        replaced += mask.true_count();
        replacements.insert(idx, nullif(values.as_ref(), &mask)?);
    }

    Ok((with_replaced_columns(batch, replacements)?, replaced))
}

const fn is_text(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// True where a text value parses as a number equal to `sentinel`
fn text_sentinel_mask(column: &ArrayRef, sentinel: f64) -> Result<BooleanArray> {
    let text = cast(column, &DataType::Utf8)?;
    Ok(text
        .as_string::<i32>()
        .iter()
        .map(|value| {
            value.is_some_and(|v| v.trim().parse::<f64>().is_ok_and(|n| n == sentinel))
        })
        .map(Some)
        .collect())
}

/// Rebuild `batch` with some columns swapped out; replaced fields become
/// nullable with the new array's type
fn with_replaced_columns(
    batch: &RecordBatch,
    mut replacements: HashMap<usize, ArrayRef>,
) -> Result<RecordBatch> {
    if replacements.is_empty() {
        return Ok(batch.clone());
    }

    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut arrays = Vec::with_capacity(schema.fields().len());

    for (idx, field) in schema.fields().iter().enumerate() {
        match replacements.remove(&idx) {
            Some(array) => {
                fields.push(Field::new(field.name(), array.data_type().clone(), true));
                arrays.push(array);
            }
            None => {
                fields.push(field.as_ref().clone());
                arrays.push(batch.column(idx).clone());
            }
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), arrays)?)
}
