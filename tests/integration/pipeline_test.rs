use std::fs;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use psg_labeler::algorithm::osa::SUMMARY_FILE_NAME;
use psg_labeler::{
    CohortKind, LabelError, LabelingConfig, TableFormat, run_labeling, save_cohorts,
};
use tempfile::TempDir;

use crate::utils::{PsgRow, labels, null_count, patient_ids, psg_batch, without_column};

fn sample() -> RecordBatch {
    let missing_lat = PsgRow {
        ahi_lat: None,
        ..PsgRow::positive(3)
    };
    psg_batch(&[PsgRow::positive(1), PsgRow::negative(2), missing_lat])
}

#[test]
fn test_every_cohort_labels_the_positive_example() -> psg_labeler::Result<()> {
    let run = run_labeling(&psg_batch(&[PsgRow::positive(1)]), &LabelingConfig::default())?;

    assert_eq!(run.initial_rows, 1);
    assert!(!run.all_failed());
    assert_eq!(run.cohorts().count(), 4);
    for cohort in run.cohorts() {
        for rule in &cohort.labels {
            assert_eq!(labels(&cohort.batch, rule.column_name()), vec![Some(1)]);
        }
    }
    Ok(())
}

#[test]
fn test_families_use_the_same_input() -> psg_labeler::Result<()> {
    let run = run_labeling(&sample(), &LabelingConfig::default())?;

    let posa = run.posa.as_ref().unwrap();
    assert_eq!(patient_ids(&posa.labeled.batch), vec![1, 2]);

    let remosa = run.remosa.as_ref().unwrap();
    assert_eq!(patient_ids(&remosa.criteria_15.batch), vec![1, 2, 3]);
    assert_eq!(
        remosa.criteria_15.batch.schema().fields().len(),
        sample().num_columns() + 1
    );
    Ok(())
}

#[test]
fn test_absent_column_fails_only_its_family() -> psg_labeler::Result<()> {
    let batch = without_column(&sample(), "REM_sup_min");
    let run = run_labeling(&batch, &LabelingConfig::default())?;

    assert!(run.posa.is_ok());
    match &run.remosa {
        Err(LabelError::MissingColumn { column, family }) => {
            assert_eq!(column, "REM_sup_min");
            assert_eq!(family, "REMOSA");
        }
        other => panic!("expected a missing column error, got {other:?}"),
    }
    assert!(!run.all_failed());
    Ok(())
}

#[test]
fn test_absent_shared_column_fails_every_family() -> psg_labeler::Result<()> {
    let batch = without_column(&sample(), "AHI_total");
    let run = run_labeling(&batch, &LabelingConfig::default())?;

    assert!(run.all_failed());
    assert_eq!(run.summary().failures.len(), 2);
    Ok(())
}

#[test]
fn test_absent_column_without_validation_gives_empty_cohorts() -> psg_labeler::Result<()> {
    let config = LabelingConfig {
        validate_schema: false,
        ..LabelingConfig::default()
    };
    let batch = without_column(&sample(), "REM_sup_min");
    let run = run_labeling(&batch, &config)?;

    let remosa = run.remosa.as_ref().unwrap();
    assert!(remosa.criteria_13.is_empty());
    assert!(remosa.isolated.is_empty());
    assert_eq!(remosa.criteria_15.num_rows(), 3);
    Ok(())
}

#[test]
fn test_non_numeric_values_are_missing() -> psg_labeler::Result<()> {
    let batch = sample();
    let idx = batch.schema().index_of("AHI_sup").unwrap();

    let mut fields: Vec<Field> = batch.schema().fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    fields[idx] = Field::new("AHI_sup", DataType::Utf8, true);
    columns[idx] = Arc::new(StringArray::from(vec![Some("6"), Some("n/a"), Some("6")]));
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

    let run = run_labeling(&batch, &LabelingConfig::default())?;

    assert_eq!(run.coercion.total_coerced(), 1);
    let posa = run.posa.as_ref().unwrap();
    assert_eq!(patient_ids(&posa.labeled.batch), vec![1]);

    let remosa = run.remosa.as_ref().unwrap();
    assert_eq!(remosa.criteria_15.num_rows(), 3);
    assert_eq!(null_count(&remosa.criteria_15.batch, "AHI_sup"), 1);
    Ok(())
}

#[test]
fn test_save_cohorts_is_idempotent() -> psg_labeler::Result<()> {
    let config = LabelingConfig {
        write_posa_subsets: true,
        write_summary: true,
        ..LabelingConfig::default()
    };
    let first = TempDir::new()?;
    let second = TempDir::new()?;

    let written = save_cohorts(&run_labeling(&sample(), &config)?, first.path(), &config)?;
    save_cohorts(&run_labeling(&sample(), &config)?, second.path(), &config)?;

    assert_eq!(written.len(), 8);
    for path in &written {
        let name = path.file_name().unwrap();
        assert_eq!(fs::read(path)?, fs::read(second.path().join(name))?, "{name:?}");
    }
    Ok(())
}

#[test]
fn test_failed_family_writes_nothing() -> psg_labeler::Result<()> {
    let config = LabelingConfig {
        output_format: TableFormat::Parquet,
        write_summary: true,
        ..LabelingConfig::default()
    };
    let dir = TempDir::new()?;
    let batch = without_column(&sample(), "AHI_NREM");
    let run = run_labeling(&batch, &config)?;
    save_cohorts(&run, dir.path(), &config)?;

    assert!(dir.path().join("posa_labeled.parquet").exists());
    assert!(!dir.path().join("remosa_13.parquet").exists());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME))?)?;
    assert_eq!(summary["initial_rows"], 3);
    assert!(summary["failures"]["REMOSA"].is_string());
    assert!(summary["cohorts"][CohortKind::Posa.file_stem()]["rows"].is_number());
    Ok(())
}
