use std::sync::Arc;

use psg_labeler::filter::{AndFilter, BatchFilter, Expr, ExpressionFilter, Operand};
use psg_labeler::{RequiredColumnsFilter, evaluate_expr};

use crate::utils::{PsgRow, patient_ids, psg_batch};

#[test]
fn test_unrelated_missing_column_keeps_record() -> psg_labeler::Result<()> {
    let no_rem = PsgRow {
        ahi_rem: None,
        ..PsgRow::positive(1)
    };
    let no_sup = PsgRow {
        ahi_sup: None,
        ..PsgRow::positive(2)
    };
    let batch = psg_batch(&[no_rem, no_sup]);

    let outcome = RequiredColumnsFilter::new(["AHI_sup", "AHI_lat"]).apply(&batch)?;
    assert_eq!(patient_ids(&outcome.batch), vec![1]);
    assert_eq!(outcome.removed, 1);
    Ok(())
}

#[test]
fn test_absent_column_removes_everything() -> psg_labeler::Result<()> {
    let batch = psg_batch(&[PsgRow::positive(1)]);

    let outcome = RequiredColumnsFilter::new(["AHI_sup", "AHI_prone"]).apply(&batch)?;
    assert_eq!(outcome.batch.num_rows(), 0);
    assert_eq!(outcome.absent_columns, vec!["AHI_prone".to_string()]);
    assert_eq!(outcome.batch.schema(), batch.schema());
    Ok(())
}

#[test]
fn test_combined_filters() -> psg_labeler::Result<()> {
    let mild = PsgRow {
        ahi_total: Some(3.0),
        ..PsgRow::positive(2)
    };
    let batch = psg_batch(&[PsgRow::positive(1), mild, PsgRow::negative(3)]);

    let filter = AndFilter::new(vec![
        Arc::new(RequiredColumnsFilter::new(["AHI_total"])),
        Arc::new(ExpressionFilter::new(Expr::gt_eq("AHI_total", 5.0))),
    ]);
    assert_eq!(patient_ids(&filter.filter(&batch)?), vec![1, 3]);

    let rem_sleep = Operand::column("REM_sup_min").plus("REM_lat_min");
    let mask = evaluate_expr(&batch, &Expr::gt_eq(rem_sleep, 11.0))?;
    assert_eq!(mask.true_count(), 3);
    Ok(())
}
