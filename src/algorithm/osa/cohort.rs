//! Cohort derivation for the pOSA and REM-OSA rule families
//!
//! pOSA: drop records without supine/lateral AHI, label both positional
//! criteria, then keep only records passing the severity gate. The labels
//! are computed before the gate so they reflect the whole eligible
//! population.
//!
//! REM-OSA: drop records without REM/NREM AHI, then derive three
//! independent cohorts, one per criterion. Each drops records missing its
//! own extra inputs before labeling, so the three tables can differ in
//! membership.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::algorithm::osa::evaluate::{attach_labels, count_positive};
use crate::algorithm::osa::rules::{LabelRule, RuleFamily, severity_gate};
use crate::error::Result;
use crate::filter::{
    AndFilter, BatchFilter, Expr, Operand, RequiredColumnsFilter, evaluate_expr,
    expr_to_filter, filter_record_batch,
};
use crate::schema::columns::AHI_TOTAL;
use crate::utils::logging::log_step;

/// Named output cohorts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CohortKind {
    /// Severity-qualified pOSA cohort with both positional labels
    Posa,
    /// pOSA records positive on the Cartwright criterion
    PosaCartwright,
    /// pOSA records positive on the overall/non-supine criterion
    PosaOverall,
    /// pOSA records positive on both positional criteria
    PosaBoth,
    /// REM-OSA criterion 13 cohort
    Remosa13,
    /// REM-OSA criterion 15 cohort
    Remosa15,
    /// Isolated REM-OSA cohort
    IsolatedRemosa,
}

impl CohortKind {
    /// File name (without extension) the cohort is written to
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Posa => "posa_labeled",
            Self::PosaCartwright => "posa_cartwright",
            Self::PosaOverall => "posa_overall",
            Self::PosaBoth => "posa_both",
            Self::Remosa13 => "remosa_13",
            Self::Remosa15 => "remosa_15",
            Self::IsolatedRemosa => "remosa_isolated",
        }
    }

    /// Family the cohort is derived from
    #[must_use]
    pub const fn family(self) -> RuleFamily {
        match self {
            Self::Posa | Self::PosaCartwright | Self::PosaOverall | Self::PosaBoth => {
                RuleFamily::Positional
            }
            Self::Remosa13 | Self::Remosa15 | Self::IsolatedRemosa => RuleFamily::RemRelated,
        }
    }
}

impl fmt::Display for CohortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// Row counts collected while deriving a cohort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortStats {
    /// Rows handed to the cohort's first filter
    pub input_rows: usize,
    /// Rows dropped because a required value was missing
    pub removed_missing: usize,
    /// Rows dropped by the severity gate (`AHI_total < 5` or missing)
    pub removed_normal: usize,
    /// Rows in the final cohort
    pub rows: usize,
    /// Positive count per label column
    pub positives: BTreeMap<String, usize>,
}

/// A derived cohort: its records plus the label columns attached to them
#[derive(Debug, Clone)]
pub struct LabeledCohort {
    /// Which cohort this is
    pub kind: CohortKind,
    /// Records with label columns appended
    pub batch: RecordBatch,
    /// Labels attached to `batch`
    pub labels: Vec<LabelRule>,
    /// Counts collected during derivation
    pub stats: CohortStats,
}

impl LabeledCohort {
    fn new(kind: CohortKind, batch: RecordBatch, labels: Vec<LabelRule>, mut stats: CohortStats) -> Self {
        stats.rows = batch.num_rows();
        stats.positives = labels
            .iter()
            .map(|rule| (rule.column_name().to_string(), count_positive(&batch, *rule)))
            .collect();
        if batch.num_rows() == 0 {
            log::warn!("Cohort {kind} has no eligible records, writing an empty table");
        }
        Self {
            kind,
            batch,
            labels,
            stats,
        }
    }

    /// Number of records in the cohort
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the cohort has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Positive count for one of the cohort's labels
    #[must_use]
    pub fn positives(&self, rule: LabelRule) -> usize {
        self.stats
            .positives
            .get(rule.column_name())
            .copied()
            .unwrap_or(0)
    }
}

/// The pOSA family's output
#[derive(Debug, Clone)]
pub struct PosaCohorts {
    /// Severity-qualified cohort with both labels
    pub labeled: LabeledCohort,
    /// Records positive on both positional criteria
    pub both_positive: usize,
    /// Per-criterion subsets, when requested
    pub subsets: Vec<LabeledCohort>,
}

impl PosaCohorts {
    /// All cohorts in output order
    pub fn cohorts(&self) -> impl Iterator<Item = &LabeledCohort> {
        std::iter::once(&self.labeled).chain(self.subsets.iter())
    }
}

/// The REM-OSA family's output: one independent cohort per criterion
#[derive(Debug, Clone)]
pub struct RemosaCohorts {
    /// Criterion 13 cohort
    pub criteria_13: LabeledCohort,
    /// Criterion 15 cohort
    pub criteria_15: LabeledCohort,
    /// Isolated REM-OSA cohort
    pub isolated: LabeledCohort,
}

impl RemosaCohorts {
    /// All cohorts in output order
    pub fn cohorts(&self) -> impl Iterator<Item = &LabeledCohort> {
        [&self.criteria_13, &self.criteria_15, &self.isolated].into_iter()
    }
}

/// Filter that keeps records with a present `AHI_total` of at least 5
///
/// The presence check runs first so an absent column yields an empty
/// cohort instead of an evaluation error.
#[must_use]
pub fn severity_filter() -> AndFilter {
    AndFilter::new(vec![
        Arc::new(RequiredColumnsFilter::new([AHI_TOTAL])),
        expr_to_filter(&severity_gate()),
    ])
}

/// Derive the pOSA cohort
///
/// Subsets (Cartwright only, overall only, both) are added when
/// `with_subsets` is set.
pub fn label_posa(batch: &RecordBatch, with_subsets: bool) -> Result<PosaCohorts> {
    let family = RuleFamily::Positional;
    let input_rows = batch.num_rows();

    let eligible = RequiredColumnsFilter::new(family.base_columns().iter().copied()).apply(batch)?;
    log_step(family, "invalid data sample", eligible.removed, eligible.batch.num_rows());

    let labeled = attach_labels(&eligible.batch, family.rules())?;

    let severe = severity_filter().filter(&labeled)?;
    let removed_normal = labeled.num_rows() - severe.num_rows();
    log_step(family, "normal patients", removed_normal, severe.num_rows());

    let stats = CohortStats {
        input_rows,
        removed_missing: eligible.removed,
        removed_normal,
        ..CohortStats::default()
    };
    let labeled = LabeledCohort::new(CohortKind::Posa, severe, family.rules().to_vec(), stats);

    let both = positive_on_all(&labeled.batch, family.rules())?;
    let both_positive = both.num_rows();

    let subsets = if with_subsets {
        vec![
            posa_subset(&labeled, CohortKind::PosaCartwright, &[LabelRule::Cartwright])?,
            posa_subset(&labeled, CohortKind::PosaOverall, &[LabelRule::OverallNonSupine])?,
            posa_subset(&labeled, CohortKind::PosaBoth, family.rules())?,
        ]
    } else {
        Vec::new()
    };

    Ok(PosaCohorts {
        labeled,
        both_positive,
        subsets,
    })
}

fn posa_subset(
    cohort: &LabeledCohort,
    kind: CohortKind,
    rules: &[LabelRule],
) -> Result<LabeledCohort> {
    let batch = positive_on_all(&cohort.batch, rules)?;
    let stats = CohortStats {
        input_rows: cohort.num_rows(),
        ..CohortStats::default()
    };
    Ok(LabeledCohort::new(kind, batch, cohort.labels.clone(), stats))
}

/// Keep records where every listed label equals 1
fn positive_on_all(batch: &RecordBatch, rules: &[LabelRule]) -> Result<RecordBatch> {
    let expr = Expr::And(
        rules
            .iter()
            .map(|rule| Expr::Eq(Operand::column(rule.column_name()), Operand::Literal(1.0)))
            .collect(),
    );
    let mask = evaluate_expr(batch, &expr)?;
    filter_record_batch(batch, &mask)
}

/// Derive the three REM-OSA cohorts
pub fn label_remosa(batch: &RecordBatch) -> Result<RemosaCohorts> {
    let family = RuleFamily::RemRelated;

    let base = RequiredColumnsFilter::new(family.base_columns().iter().copied()).apply(batch)?;
    log_step(family, "invalid data sample", base.removed, base.batch.num_rows());

    let variant = |kind: CohortKind, rule: LabelRule| -> Result<LabeledCohort> {
        let eligible =
            RequiredColumnsFilter::new(rule.required_columns().iter().copied()).apply(&base.batch)?;
        let labeled = attach_labels(&eligible.batch, &[rule])?;
        let stats = CohortStats {
            input_rows: batch.num_rows(),
            removed_missing: base.removed + eligible.removed,
            ..CohortStats::default()
        };
        let cohort = LabeledCohort::new(kind, labeled, vec![rule], stats);
        log::info!(
            "{rule} valid samples: {}, positive cases: {}",
            cohort.num_rows(),
            cohort.positives(rule)
        );
        Ok(cohort)
    };

    Ok(RemosaCohorts {
        criteria_13: variant(CohortKind::Remosa13, LabelRule::Remosa13)?,
        criteria_15: variant(CohortKind::Remosa15, LabelRule::Remosa15)?,
        isolated: variant(CohortKind::IsolatedRemosa, LabelRule::IsolatedRemosa)?,
    })
}
