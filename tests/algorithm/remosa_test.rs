use crate::utils::{PsgRow, labels, patient_ids, psg_batch, values};
use psg_labeler::algorithm::osa::{LabelRule, label_remosa};

#[test]
fn test_positive_example_is_labeled_in_every_variant() -> psg_labeler::Result<()> {
    let remosa = label_remosa(&psg_batch(&[PsgRow::positive(1), PsgRow::negative(2)]))?;

    for cohort in remosa.cohorts() {
        assert_eq!(patient_ids(&cohort.batch), vec![1, 2]);
        assert_eq!(cohort.labels.len(), 1);
        assert_eq!(
            labels(&cohort.batch, cohort.labels[0].column_name()),
            vec![Some(1), Some(0)]
        );
    }
    Ok(())
}

#[test]
fn test_variants_differ_in_membership() -> psg_labeler::Result<()> {
    let no_rem_minutes = PsgRow {
        rem_sup_min: None,
        ..PsgRow::positive(1)
    };
    let no_total = PsgRow {
        ahi_total: None,
        ..PsgRow::positive(2)
    };
    let no_nrem = PsgRow {
        ahi_nrem: None,
        ..PsgRow::positive(3)
    };
    let remosa = label_remosa(&psg_batch(&[no_rem_minutes, no_total, no_nrem]))?;

    assert_eq!(patient_ids(&remosa.criteria_13.batch), Vec::<i64>::new());
    assert_eq!(patient_ids(&remosa.criteria_15.batch), vec![1]);
    assert_eq!(patient_ids(&remosa.isolated.batch), vec![2]);
    assert_eq!(remosa.criteria_15.stats.removed_missing, 2);
    Ok(())
}

#[test]
fn test_isolated_ignores_severity() -> psg_labeler::Result<()> {
    let mild = PsgRow {
        ahi_total: Some(2.0),
        ..PsgRow::positive(1)
    };
    let remosa = label_remosa(&psg_batch(&[mild]))?;

    assert_eq!(labels(&remosa.criteria_13.batch, "REMOSA_13"), vec![Some(0)]);
    assert_eq!(labels(&remosa.criteria_15.batch, "REMOSA_15"), vec![Some(0)]);
    assert_eq!(labels(&remosa.isolated.batch, "Isolated_REMOSA"), vec![Some(1)]);
    Ok(())
}

#[test]
fn test_rem_dominance_boundary_is_inclusive() -> psg_labeler::Result<()> {
    let exact = PsgRow {
        ahi_rem: Some(6.0),
        ahi_nrem: Some(3.0),
        ..PsgRow::positive(1)
    };
    let below = PsgRow {
        ahi_rem: Some(5.99),
        ahi_nrem: Some(3.0),
        ..PsgRow::positive(2)
    };
    let remosa = label_remosa(&psg_batch(&[exact, below]))?;

    for cohort in remosa.cohorts() {
        assert_eq!(
            labels(&cohort.batch, cohort.labels[0].column_name()),
            vec![Some(1), Some(0)],
            "{}",
            cohort.labels[0]
        );
    }
    Ok(())
}

#[test]
fn test_sleep_and_nrem_thresholds() -> psg_labeler::Result<()> {
    let short_rem = PsgRow {
        rem_sup_min: Some(4.0),
        rem_lat_min: Some(5.99),
        ..PsgRow::positive(1)
    };
    let enough_rem = PsgRow {
        rem_sup_min: Some(4.0),
        rem_lat_min: Some(6.0),
        ..PsgRow::positive(2)
    };
    let high_nrem = PsgRow {
        ahi_rem: Some(40.0),
        ahi_nrem: Some(15.0),
        ..PsgRow::positive(3)
    };
    let remosa = label_remosa(&psg_batch(&[short_rem, enough_rem, high_nrem]))?;

    assert_eq!(
        labels(&remosa.criteria_13.batch, "REMOSA_13"),
        vec![Some(0), Some(1), Some(0)]
    );
    assert_eq!(
        labels(&remosa.criteria_15.batch, "REMOSA_15"),
        vec![Some(1), Some(1), Some(1)]
    );
    Ok(())
}

#[test]
fn test_criteria_13_positives_meet_criteria_15_core() -> psg_labeler::Result<()> {
    let rows: Vec<PsgRow> = (0..40_i32)
        .map(|i| {
            let i = f64::from(i);
            PsgRow {
                ahi_total: Some(i % 9.0),
                ahi_rem: Some(i % 13.0),
                ahi_nrem: Some(i % 7.0),
                rem_sup_min: Some(i % 11.0),
                rem_lat_min: Some(i % 5.0),
                ..PsgRow::negative(0)
            }
        })
        .collect();
    let remosa = label_remosa(&psg_batch(&rows))?;
    let cohort = &remosa.criteria_13;

    let flags = labels(&cohort.batch, LabelRule::Remosa13.column_name());
    let total = values(&cohort.batch, "AHI_total");
    let rem = values(&cohort.batch, "AHI_REM");
    let nrem = values(&cohort.batch, "AHI_NREM");

    let mut positives = 0;
    for i in 0..cohort.num_rows() {
        if flags[i] == Some(1) {
            positives += 1;
            assert!(total[i].unwrap() >= 5.0);
            assert!(rem[i].unwrap() >= 2.0 * nrem[i].unwrap());
        }
    }
    assert_eq!(positives, cohort.positives(LabelRule::Remosa13));
    assert!(positives > 0);
    Ok(())
}
