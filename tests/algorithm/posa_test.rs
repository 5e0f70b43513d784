use crate::utils::{PsgRow, labels, patient_ids, psg_batch};
use psg_labeler::algorithm::osa::{CohortKind, LabelRule, label_posa};

#[test]
fn test_positive_example_is_labeled_on_both_criteria() -> psg_labeler::Result<()> {
    let batch = psg_batch(&[PsgRow::positive(1), PsgRow::negative(2)]);
    let posa = label_posa(&batch, false)?;

    assert_eq!(posa.labeled.kind, CohortKind::Posa);
    assert_eq!(patient_ids(&posa.labeled.batch), vec![1, 2]);
    assert_eq!(labels(&posa.labeled.batch, "pOSA_Cartwright"), vec![Some(1), Some(0)]);
    assert_eq!(
        labels(&posa.labeled.batch, "pOSA_OverallNonSupine"),
        vec![Some(1), Some(0)]
    );
    assert_eq!(posa.both_positive, 1);
    assert!(posa.subsets.is_empty());
    Ok(())
}

#[test]
fn test_cartwright_boundary_is_inclusive() -> psg_labeler::Result<()> {
    let exact = PsgRow {
        ahi_sup: Some(8.0),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(1)
    };
    let below = PsgRow {
        ahi_sup: Some(7.99),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(2)
    };
    let posa = label_posa(&psg_batch(&[exact, below]), false)?;

    assert_eq!(labels(&posa.labeled.batch, "pOSA_Cartwright"), vec![Some(1), Some(0)]);
    Ok(())
}

#[test]
fn test_overall_non_supine_boundary_is_inclusive() -> psg_labeler::Result<()> {
    let exact = PsgRow {
        ahi_total: Some(6.0),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(1)
    };
    let below = PsgRow {
        ahi_total: Some(5.99),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(2)
    };
    let posa = label_posa(&psg_batch(&[exact, below]), false)?;

    assert_eq!(
        labels(&posa.labeled.batch, "pOSA_OverallNonSupine"),
        vec![Some(1), Some(0)]
    );
    Ok(())
}

#[test]
fn test_missing_lateral_ahi_is_excluded() -> psg_labeler::Result<()> {
    let missing = PsgRow {
        ahi_lat: None,
        ..PsgRow::positive(1)
    };
    let posa = label_posa(&psg_batch(&[missing, PsgRow::positive(2)]), false)?;

    assert_eq!(patient_ids(&posa.labeled.batch), vec![2]);
    assert_eq!(posa.labeled.stats.removed_missing, 1);
    assert_eq!(posa.labeled.stats.input_rows, 2);
    Ok(())
}

#[test]
fn test_severity_gate_applies_after_labeling() -> psg_labeler::Result<()> {
    let mild = PsgRow {
        ahi_total: Some(4.9),
        ..PsgRow::positive(1)
    };
    let threshold = PsgRow {
        ahi_total: Some(5.0),
        ..PsgRow::positive(2)
    };
    let unknown = PsgRow {
        ahi_total: None,
        ..PsgRow::positive(3)
    };
    let posa = label_posa(&psg_batch(&[mild, threshold, unknown]), false)?;

    assert_eq!(patient_ids(&posa.labeled.batch), vec![2]);
    assert_eq!(posa.labeled.stats.removed_missing, 0);
    assert_eq!(posa.labeled.stats.removed_normal, 2);
    Ok(())
}

#[test]
fn test_labels_are_never_null_in_output() -> psg_labeler::Result<()> {
    let rows: Vec<PsgRow> = (0..20_i32)
        .map(|i| PsgRow {
            ahi_total: Some(5.0 + f64::from(i)),
            ahi_sup: Some(f64::from(i)),
            ahi_lat: Some(f64::from(20 - i) / 2.0),
            ..PsgRow::negative(i64::from(i))
        })
        .collect();
    let posa = label_posa(&psg_batch(&rows), false)?;

    assert_eq!(posa.labeled.num_rows(), 20);
    for rule in [LabelRule::Cartwright, LabelRule::OverallNonSupine] {
        assert!(labels(&posa.labeled.batch, rule.column_name()).iter().all(Option::is_some));
    }
    Ok(())
}

#[test]
fn test_subsets() -> psg_labeler::Result<()> {
    let cartwright_only = PsgRow {
        ahi_total: Some(5.0),
        ahi_sup: Some(8.0),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(1)
    };
    let overall_only = PsgRow {
        ahi_total: Some(12.0),
        ahi_sup: Some(5.0),
        ahi_lat: Some(4.0),
        ..PsgRow::negative(2)
    };
    let rows = [cartwright_only, overall_only, PsgRow::positive(3), PsgRow::negative(4)];
    let posa = label_posa(&psg_batch(&rows), true)?;

    let subset = |kind: CohortKind| {
        let cohort = posa.subsets.iter().find(|c| c.kind == kind).unwrap();
        patient_ids(&cohort.batch)
    };
    assert_eq!(subset(CohortKind::PosaCartwright), vec![1, 3]);
    assert_eq!(subset(CohortKind::PosaOverall), vec![2, 3]);
    assert_eq!(subset(CohortKind::PosaBoth), vec![3]);
    assert_eq!(posa.cohorts().count(), 4);
    Ok(())
}
