//! Logging utilities
//!
//! Standardized log lines for file operations and cohort filtering steps.

pub mod log;

pub use self::log::{log_operation_complete, log_operation_start, log_step, log_warning};
