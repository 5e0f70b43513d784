//! Configuration for the labeling pipeline.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};
use crate::utils::io::TableFormat;

/// Configuration for a labeling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Fail a rule family when one of its required columns is absent from
    /// the input schema; when false the family yields empty cohorts
    pub validate_schema: bool,
    /// Format of the cohort tables written to disk
    pub output_format: TableFormat,
    /// Also write the Cartwright-only, overall-only and both-positive pOSA
    /// subsets
    pub write_posa_subsets: bool,
    /// Write `labeling_summary.json` next to the cohort tables
    pub write_summary: bool,
    /// Optional cleaning of the raw export before labeling
    pub preprocess: Option<PreprocessConfig>,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            validate_schema: true,
            output_format: TableFormat::Csv,
            write_posa_subsets: false,
            write_summary: false,
            preprocess: None,
        }
    }
}

impl LabelingConfig {
    /// Load a configuration from a JSON file; missing keys keep their
    /// defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        match &self.preprocess {
            Some(preprocess) => preprocess.validate(),
            None => Ok(()),
        }
    }
}

impl fmt::Display for LabelingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Labeling Configuration:")?;
        writeln!(f, "  Validate Schema: {}", self.validate_schema)?;
        writeln!(f, "  Output Format: {}", self.output_format)?;
        writeln!(f, "  pOSA Subsets: {}", self.write_posa_subsets)?;
        writeln!(f, "  Summary File: {}", self.write_summary)?;
        if let Some(preprocess) = &self.preprocess {
            write!(f, "{preprocess}")?;
        }
        Ok(())
    }
}

/// Cleaning applied to the raw PSG export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Column holding the study type code
    pub psg_type_column: String,
    /// Study types to keep
    pub psg_types: Vec<String>,
    /// Questionnaire total columns that must all be present
    pub questionnaire_columns: Vec<String>,
    /// Value used in the export to code a missing questionnaire answer
    pub missing_sentinel: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            psg_type_column: "PSG_Type".to_string(),
            psg_types: vec!["P".to_string(), "PE".to_string()],
            questionnaire_columns: ["SSS", "PSQI_Total", "ESS_Total", "ISI_Total", "BQ_Risk"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            missing_sentinel: 9999.0,
        }
    }
}

impl PreprocessConfig {
    /// Load a preprocessing configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would silently drop every record
    pub fn validate(&self) -> Result<()> {
        if self.psg_types.is_empty() {
            return Err(LabelError::Config(
                "psg_types must list at least one study type".to_string(),
            ));
        }
        if self.missing_sentinel.is_nan() {
            return Err(LabelError::Config(
                "missing_sentinel must be a number".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PreprocessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Preprocessing:")?;
        writeln!(
            f,
            "  {} In: {}",
            self.psg_type_column,
            self.psg_types.join(", ")
        )?;
        writeln!(
            f,
            "  Questionnaires: {}",
            self.questionnaire_columns.join(", ")
        )?;
        writeln!(f, "  Missing Sentinel: {}", self.missing_sentinel)
    }
}
