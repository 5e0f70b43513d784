//! Clinical labeling rules for positional and REM-related OSA
//!
//! Each rule names the columns it needs and a predicate over them. The
//! thresholds are fixed clinical criteria; comparisons are exact, with no
//! tolerance.

use std::fmt;

use crate::filter::{Expr, Operand};
use crate::schema::columns::{
    AHI_LAT, AHI_NREM, AHI_REM, AHI_SUP, AHI_TOTAL, REM_LAT_MIN, REM_SUP_MIN,
};

/// Overall AHI at or above which a patient has OSA
pub const SEVERITY_THRESHOLD: f64 = 5.0;

/// Supine AHI must reach this multiple of lateral AHI (Cartwright)
pub const CARTWRIGHT_RATIO: f64 = 2.0;

/// Overall AHI must reach this multiple of lateral AHI
pub const OVERALL_NON_SUPINE_RATIO: f64 = 1.5;

/// REM AHI must reach this multiple of NREM AHI
pub const REM_NREM_RATIO: f64 = 2.0;

/// Minimum minutes of REM sleep (supine + lateral)
pub const MIN_REM_MINUTES: f64 = 10.0;

/// NREM AHI must stay strictly below this value
pub const NREM_AHI_CEILING: f64 = 15.0;

/// Group of rules that share an eligibility filter and an output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleFamily {
    /// Positional OSA (supine vs. lateral)
    Positional,
    /// REM-related OSA (REM vs. NREM)
    RemRelated,
}

impl RuleFamily {
    /// Columns every record must have to enter the family's base cohort
    #[must_use]
    pub const fn base_columns(self) -> &'static [&'static str] {
        match self {
            Self::Positional => &[AHI_SUP, AHI_LAT],
            Self::RemRelated => &[AHI_REM, AHI_NREM],
        }
    }

    /// Rules belonging to this family
    #[must_use]
    pub const fn rules(self) -> &'static [LabelRule] {
        match self {
            Self::Positional => &[LabelRule::Cartwright, LabelRule::OverallNonSupine],
            Self::RemRelated => &[
                LabelRule::Remosa13,
                LabelRule::Remosa15,
                LabelRule::IsolatedRemosa,
            ],
        }
    }

    /// Short display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Positional => "pOSA",
            Self::RemRelated => "REMOSA",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single labeling criterion producing a 0/1 column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelRule {
    /// Cartwright criterion: supine AHI at least twice the lateral AHI
    Cartwright,
    /// Overall AHI at least 1.5 times the lateral (non-supine) AHI
    OverallNonSupine,
    /// REM-OSA criterion 13: severity gate, REM dominance, enough REM sleep
    /// and low NREM AHI
    Remosa13,
    /// REM-OSA criterion 15: severity gate and REM dominance
    Remosa15,
    /// REM-OSA criterion 13 without the severity gate
    IsolatedRemosa,
}

impl LabelRule {
    /// Every rule, in output order
    pub const ALL: [Self; 5] = [
        Self::Cartwright,
        Self::OverallNonSupine,
        Self::Remosa13,
        Self::Remosa15,
        Self::IsolatedRemosa,
    ];

    /// Name of the label column this rule produces
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Cartwright => "pOSA_Cartwright",
            Self::OverallNonSupine => "pOSA_OverallNonSupine",
            Self::Remosa13 => "REMOSA_13",
            Self::Remosa15 => "REMOSA_15",
            Self::IsolatedRemosa => "Isolated_REMOSA",
        }
    }

    /// Columns a record must have for the rule to be evaluated
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Cartwright => &[AHI_SUP, AHI_LAT],
            Self::OverallNonSupine => &[AHI_SUP, AHI_LAT, AHI_TOTAL],
            Self::Remosa13 => &[AHI_REM, AHI_NREM, REM_SUP_MIN, REM_LAT_MIN, AHI_TOTAL],
            Self::Remosa15 => &[AHI_REM, AHI_NREM, AHI_TOTAL],
            Self::IsolatedRemosa => &[AHI_REM, AHI_NREM, REM_SUP_MIN, REM_LAT_MIN],
        }
    }

    /// Family the rule belongs to
    #[must_use]
    pub const fn family(self) -> RuleFamily {
        match self {
            Self::Cartwright | Self::OverallNonSupine => RuleFamily::Positional,
            Self::Remosa13 | Self::Remosa15 | Self::IsolatedRemosa => RuleFamily::RemRelated,
        }
    }

    /// Predicate that is true for positive records
    #[must_use]
    pub fn predicate(self) -> Expr {
        match self {
            Self::Cartwright => Expr::gt_eq(AHI_SUP, Operand::column(AHI_LAT).times(CARTWRIGHT_RATIO)),
            Self::OverallNonSupine => Expr::gt_eq(
                AHI_TOTAL,
                Operand::column(AHI_LAT).times(OVERALL_NON_SUPINE_RATIO),
            ),
            Self::Remosa13 => Expr::And(vec![severity_gate(), rem_dominance_with_sleep()]),
            Self::Remosa15 => Expr::And(vec![severity_gate(), rem_dominance()]),
            Self::IsolatedRemosa => rem_dominance_with_sleep(),
        }
    }
}

impl fmt::Display for LabelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// `AHI_total >= 5`
#[must_use]
pub fn severity_gate() -> Expr {
    Expr::gt_eq(AHI_TOTAL, SEVERITY_THRESHOLD)
}

fn rem_dominance() -> Expr {
    Expr::gt_eq(AHI_REM, Operand::column(AHI_NREM).times(REM_NREM_RATIO))
}

fn rem_dominance_with_sleep() -> Expr {
    Expr::And(vec![
        rem_dominance(),
        Expr::gt_eq(Operand::column(REM_SUP_MIN).plus(REM_LAT_MIN), MIN_REM_MINUTES),
        Expr::lt(AHI_NREM, NREM_AHI_CEILING),
    ])
}
