//! Rule evaluation
//!
//! Turns a [`LabelRule`] into an `Int32` column: 1 for positive records,
//! 0 for negative ones and null where the rule's inputs are missing.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::algorithm::osa::rules::LabelRule;
use crate::error::Result;
use crate::filter::{RequiredColumnsFilter, evaluate_expr};
use crate::schema::absent_columns;

/// Compute the label values for every row of `batch`
///
/// Rows missing any of the rule's required columns get a null label. If a
/// required column is absent from the schema, every label is null and the
/// predicate is not evaluated.
pub fn evaluate_rule(batch: &RecordBatch, rule: LabelRule) -> Result<Int32Array> {
    if !absent_columns(&batch.schema(), rule.required_columns()).is_empty() {
        return Ok(Int32Array::new_null(batch.num_rows()));
    }

    let eligible = RequiredColumnsFilter::new(rule.required_columns().iter().copied())
        .presence_mask(batch)?;
    let positive = evaluate_expr(batch, &rule.predicate())?;

    Ok(eligible
        .iter()
        .zip(positive.iter())
        .map(|(eligible, positive)| match eligible {
            Some(true) => Some(i32::from(positive == Some(true))),
            _ => None,
        })
        .collect())
}

/// Return a new batch with the rule's label column appended
///
/// An existing column of the same name is replaced in place so that
/// re-labeling a cohort does not duplicate columns.
pub fn attach_label(batch: &RecordBatch, rule: LabelRule) -> Result<RecordBatch> {
    let labels: ArrayRef = Arc::new(evaluate_rule(batch, rule)?);
    let schema = batch.schema();
    let label_field = Field::new(rule.column_name(), DataType::Int32, true);

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    match schema.index_of(rule.column_name()) {
        Ok(idx) => {
            fields[idx] = label_field;
            columns[idx] = labels;
        }
        Err(_) => {
            fields.push(label_field);
            columns.push(labels);
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Attach several labels in order
pub fn attach_labels(batch: &RecordBatch, rules: &[LabelRule]) -> Result<RecordBatch> {
    rules
        .iter()
        .try_fold(batch.clone(), |labeled, rule| attach_label(&labeled, *rule))
}

/// Number of positive (1) values in a label column; zero if the column is
/// absent
#[must_use]
pub fn count_positive(batch: &RecordBatch, rule: LabelRule) -> usize {
    batch
        .schema()
        .index_of(rule.column_name())
        .ok()
        .and_then(|idx| batch.column(idx).as_any().downcast_ref::<Int32Array>())
        .map_or(0, |labels| labels.iter().filter(|v| *v == Some(1)).count())
}
