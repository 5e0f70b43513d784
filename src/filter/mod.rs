//! Filtering capabilities for PSG record batches
//!
//! This module provides the missing-data cohort filter and an
//! expression-based filter for column arithmetic predicates, both built on
//! the [`BatchFilter`] trait.

pub mod core;
pub mod error;
pub mod expr;
pub mod missing;

pub use self::core::{AndFilter, BatchFilter, filter_record_batch};
pub use self::expr::{Expr, ExpressionFilter, Operand, evaluate_expr, evaluate_operand, expr_to_filter};
pub use self::missing::{FilterOutcome, RequiredColumnsFilter};
