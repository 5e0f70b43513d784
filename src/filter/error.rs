//! Error handling utilities for the filter module
//!
//! This module provides consistent error construction for the filter module.

use crate::error::{LabelError, Result};

/// Create a filter error
///
/// # Arguments
/// * `message` - The error message
pub fn filter_err<T>(message: impl AsRef<str>) -> Result<T> {
    Err(LabelError::filter_error(message.as_ref()))
}

/// Create a column not found error
///
/// # Arguments
/// * `column_name` - The name of the column that was not found
pub fn column_not_found<T>(column_name: &str) -> Result<T> {
    filter_err(format!("Column '{column_name}' not found"))
}

/// Extension trait for Arrow results to add filter-specific context
pub trait FilterResultExt<T> {
    /// Add a filter-specific context message
    fn with_filter_context(self, message: impl AsRef<str>) -> Result<T>;

    /// Add context about the column being processed
    fn with_column_context(self, column_name: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> FilterResultExt<T> for std::result::Result<T, E> {
    fn with_filter_context(self, message: impl AsRef<str>) -> Result<T> {
        self.map_err(|e| LabelError::filter_error(format!("{}: {e}", message.as_ref())))
    }

    fn with_column_context(self, column_name: &str) -> Result<T> {
        self.map_err(|e| {
            LabelError::filter_error(format!("Error processing column '{column_name}': {e}"))
        })
    }
}
