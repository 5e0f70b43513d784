//! Algorithm implementations for PSG labeling workflows
//!
//! This module contains the OSA phenotype labeling rules and cohort
//! derivation, and the cleaning of raw PSG exports.

pub mod osa;
pub mod preprocess;
