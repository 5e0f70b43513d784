//! A Rust library for labeling polysomnography (PSG) records with
//! positional and REM-related obstructive sleep apnea phenotypes.
//!
//! Records are read from CSV or Parquet into Arrow record batches, filtered
//! for missing data per rule family, labeled with 0/1 columns, and written
//! back out as one table per cohort.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod filter;
pub mod reader;
pub mod schema;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{LabelingConfig, PreprocessConfig};
pub use error::{LabelError, Result};
pub use reader::PsgDataset;

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Labeling
pub use algorithm::osa::{
    CohortKind, LabelRule, LabeledCohort, LabelingRun, LabelingSummary, RuleFamily, label_dataset,
    run_labeling, save_cohorts,
};
pub use algorithm::preprocess::{PreprocessOutcome, preprocess};

// Filtering capabilities
pub use filter::{Expr, Operand, RequiredColumnsFilter, evaluate_expr, filter_record_batch};

// Utility functions
pub use utils::{TableFormat, read_table, write_table};
