//! Labeling statistics and summaries
//!
//! Collects the row counts of a labeling run into one serializable
//! structure and renders it for the console.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::algorithm::osa::LabelingRun;
use crate::algorithm::osa::cohort::{CohortKind, CohortStats};
use crate::algorithm::osa::rules::RuleFamily;
use crate::error::Result;

/// File name of the JSON summary written next to the cohort tables
pub const SUMMARY_FILE_NAME: &str = "labeling_summary.json";

/// Counts describing one labeling run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelingSummary {
    /// Records in the input table
    pub initial_rows: usize,
    /// Metric values that were not numeric and were treated as missing
    pub coerced_values: usize,
    /// Per-cohort counts, keyed by output file stem
    pub cohorts: BTreeMap<String, CohortStats>,
    /// pOSA records positive on both positional criteria
    pub posa_both_positive: Option<usize>,
    /// Families that failed, with the reason
    pub failures: BTreeMap<String, String>,
}

impl LabelingSummary {
    /// Build the summary of a finished run
    #[must_use]
    pub fn from_run(run: &LabelingRun) -> Self {
        let mut summary = Self {
            initial_rows: run.initial_rows,
            coerced_values: run.coercion.total_coerced(),
            ..Self::default()
        };

        match &run.posa {
            Ok(posa) => {
                summary.posa_both_positive = Some(posa.both_positive);
                for cohort in posa.cohorts() {
                    summary
                        .cohorts
                        .insert(cohort.kind.file_stem().to_string(), cohort.stats.clone());
                }
            }
            Err(e) => {
                summary
                    .failures
                    .insert(RuleFamily::Positional.name().to_string(), e.to_string());
            }
        }

        match &run.remosa {
            Ok(remosa) => {
                for cohort in remosa.cohorts() {
                    summary
                        .cohorts
                        .insert(cohort.kind.file_stem().to_string(), cohort.stats.clone());
                }
            }
            Err(e) => {
                summary
                    .failures
                    .insert(RuleFamily::RemRelated.name().to_string(), e.to_string());
            }
        }

        summary
    }

    /// Counts for one cohort, if it was derived
    #[must_use]
    pub fn cohort(&self, kind: CohortKind) -> Option<&CohortStats> {
        self.cohorts.get(kind.file_stem())
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Generate a console report
    #[must_use]
    pub fn render(&self) -> String {
        let mut report = String::new();
        report.push_str("Labeling Summary:\n");
        report.push_str(&format!("  Initial Records: {}\n", self.initial_rows));
        if self.coerced_values > 0 {
            report.push_str(&format!(
                "  Non-numeric Values Treated as Missing: {}\n",
                self.coerced_values
            ));
        }

        for (stem, stats) in &self.cohorts {
            report.push_str(&format!("\n{stem}:\n"));
            report.push_str(&format!("  Input Records: {}\n", stats.input_rows));
            if stats.removed_missing > 0 {
                report.push_str(&format!(
                    "  Removed (missing values): {}\n",
                    stats.removed_missing
                ));
            }
            if stats.removed_normal > 0 {
                report.push_str(&format!(
                    "  Removed (AHI below threshold): {}\n",
                    stats.removed_normal
                ));
            }
            report.push_str(&format!("  Records: {}\n", stats.rows));
            for (label, positives) in &stats.positives {
                let percentage = if stats.rows > 0 {
                    (*positives as f64 / stats.rows as f64) * 100.0
                } else {
                    0.0
                };
                report.push_str(&format!("    {label}: {positives} ({percentage:.1}%)\n"));
            }
        }

        if let Some(both) = self.posa_both_positive {
            report.push_str(&format!("\npOSA Positive on Both Criteria: {both}\n"));
        }

        if !self.failures.is_empty() {
            report.push_str("\nFailed Families:\n");
            for (family, reason) in &self.failures {
                report.push_str(&format!("  {family}: {reason}\n"));
            }
        }

        report
    }
}
