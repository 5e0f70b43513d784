//! Positional and REM-related OSA labeling
//!
//! This module derives the labeled cohorts from a PSG table and writes
//! them to disk. The two rule families are independent: a failure in one
//! never prevents the other from producing output.

pub mod cohort;
pub mod evaluate;
pub mod rules;
pub mod statistics;

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::algorithm::preprocess::preprocess;
use crate::config::LabelingConfig;
use crate::error::Result;
use crate::reader::{PsgDataset, prepare_batch};
use crate::schema::{CoercionReport, require_columns};
use crate::utils::io::{table_path, write_table};

pub use cohort::{
    CohortKind, CohortStats, LabeledCohort, PosaCohorts, RemosaCohorts, label_posa, label_remosa,
    severity_filter,
};
pub use evaluate::{attach_label, attach_labels, count_positive, evaluate_rule};
pub use rules::{LabelRule, RuleFamily, severity_gate};
pub use statistics::{LabelingSummary, SUMMARY_FILE_NAME};

/// Result of labeling one table
#[derive(Debug)]
pub struct LabelingRun {
    /// Records in the input table
    pub initial_rows: usize,
    /// What numeric coercion changed in the input
    pub coercion: CoercionReport,
    /// pOSA cohorts, or why the family failed
    pub posa: Result<PosaCohorts>,
    /// REM-OSA cohorts, or why the family failed
    pub remosa: Result<RemosaCohorts>,
}

impl LabelingRun {
    /// Whether neither family produced cohorts
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.posa.is_err() && self.remosa.is_err()
    }

    /// Every derived cohort, pOSA first
    pub fn cohorts(&self) -> impl Iterator<Item = &LabeledCohort> {
        let posa = self.posa.iter().flat_map(|posa| posa.cohorts());
        let remosa = self.remosa.iter().flat_map(|remosa| remosa.cohorts());
        posa.chain(remosa)
    }

    /// Row counts of the run
    #[must_use]
    pub fn summary(&self) -> LabelingSummary {
        LabelingSummary::from_run(self)
    }
}

/// Every column any rule of `family` reads, in first-use order
#[must_use]
pub fn family_columns(family: RuleFamily) -> Vec<&'static str> {
    family
        .base_columns()
        .iter()
        .chain(family.rules().iter().flat_map(|rule| rule.required_columns()))
        .copied()
        .unique()
        .collect()
}

/// Label a PSG table
///
/// Metric columns are coerced to numbers first, so the input may still
/// hold text values. With `validate_schema` a family fails with
/// [`crate::error::LabelError::MissingColumn`] when one of its columns is
/// absent; otherwise it proceeds and yields empty cohorts.
pub fn run_labeling(batch: &RecordBatch, config: &LabelingConfig) -> Result<LabelingRun> {
    let (batch, coercion) = prepare_batch(batch)?;

    let posa = run_family(&batch, RuleFamily::Positional, config, |b| {
        label_posa(b, config.write_posa_subsets)
    });
    let remosa = run_family(&batch, RuleFamily::RemRelated, config, label_remosa);

    Ok(LabelingRun {
        initial_rows: batch.num_rows(),
        coercion,
        posa,
        remosa,
    })
}

/// Label a loaded dataset
///
/// Runs the optional preprocessing from `config` first. The run's coercion
/// report also counts what was coerced while the dataset was loaded.
pub fn label_dataset(dataset: &PsgDataset, config: &LabelingConfig) -> Result<LabelingRun> {
    let mut run = match &config.preprocess {
        Some(preprocess_config) => {
            run_labeling(&preprocess(&dataset.batch, preprocess_config)?.batch, config)?
        }
        None => run_labeling(&dataset.batch, config)?,
    };
    run.coercion.merge_earlier(&dataset.coercion);
    Ok(run)
}

fn run_family<T>(
    batch: &RecordBatch,
    family: RuleFamily,
    config: &LabelingConfig,
    label: impl FnOnce(&RecordBatch) -> Result<T>,
) -> Result<T> {
    let result = if config.validate_schema {
        require_columns(&batch.schema(), &family_columns(family), family.name())
            .and_then(|()| label(batch))
    } else {
        label(batch)
    };

    if let Err(e) = &result {
        log::error!("{family} labeling failed: {e}");
    }
    result
}

/// Write every derived cohort of `run` into `output_dir`
///
/// Cohorts of a failed family are skipped. Returns the paths written.
pub fn save_cohorts(
    run: &LabelingRun,
    output_dir: &Path,
    config: &LabelingConfig,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for cohort in run.cohorts() {
        let path = table_path(output_dir, cohort.kind.file_stem(), config.output_format);
        write_table(&cohort.batch, &path, config.output_format)?;
        written.push(path);
    }

    if config.write_summary {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(SUMMARY_FILE_NAME);
        run.summary().write_json(&path)?;
        written.push(path);
    }

    Ok(written)
}
