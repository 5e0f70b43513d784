//! Cleaning of the raw PSG export
//!
//! Selects the relevant study types and drops records whose sleep
//! questionnaires are incomplete. Numeric questionnaire columns come out as
//! `Float64`; text columns such as `BQ_Risk` keep their answers.

use arrow::record_batch::RecordBatch;

use crate::config::PreprocessConfig;
use crate::error::Result;
use crate::filter::{BatchFilter, Expr, ExpressionFilter};
use crate::schema::{nullify_sentinel, require_columns};

/// Family name used in missing-column errors
const PREPROCESS: &str = "preprocess";

/// A cleaned table plus what each step removed
#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    /// Cleaned records
    pub batch: RecordBatch,
    /// Records in the raw table
    pub initial_rows: usize,
    /// Records dropped for an unselected study type
    pub removed_psg_type: usize,
    /// Sentinel values replaced with null
    pub sentinels_replaced: usize,
    /// Records dropped for an incomplete questionnaire
    pub removed_incomplete_questionnaire: usize,
}

/// Clean a raw export
///
/// Fails with a missing-column error if the study type column or any
/// questionnaire column is absent.
pub fn preprocess(batch: &RecordBatch, config: &PreprocessConfig) -> Result<PreprocessOutcome> {
    config.validate()?;

    let mut required: Vec<&str> = vec![config.psg_type_column.as_str()];
    required.extend(config.questionnaire_columns.iter().map(String::as_str));
    require_columns(&batch.schema(), &required, PREPROCESS)?;

    let initial_rows = batch.num_rows();
    log::info!("total number of rows before preprocessing: {initial_rows}");

    let by_type = ExpressionFilter::new(Expr::In(
        config.psg_type_column.clone(),
        config.psg_types.clone(),
    ))
    .filter(batch)?;
    let removed_psg_type = initial_rows - by_type.num_rows();
    log::info!(
        "removed {removed_psg_type} rows (kept only {} in {:?})",
        config.psg_type_column,
        config.psg_types
    );

    let (recoded, sentinels_replaced) = nullify_sentinel(
        &by_type,
        &config.questionnaire_columns,
        config.missing_sentinel,
    )?;
    log::debug!(
        "replaced {sentinels_replaced} values coded as {}",
        config.missing_sentinel
    );

    let answered = config
        .questionnaire_columns
        .iter()
        .map(|column| Expr::IsNotNull(column.clone()))
        .collect();
    let complete = ExpressionFilter::new(Expr::And(answered)).filter(&recoded)?;
    let removed_incomplete_questionnaire = recoded.num_rows() - complete.num_rows();
    log::info!("removed {removed_incomplete_questionnaire} rows with missing sleep questionnaire scores");
    log::info!("final dataset size: {} rows", complete.num_rows());

    Ok(PreprocessOutcome {
        batch: complete,
        initial_rows,
        removed_psg_type,
        sentinels_replaced,
        removed_incomplete_questionnaire,
    })
}
