//! Log lines for file operations and cohort filtering steps

use std::path::Path;
use std::time::Duration;

/// Announce work on a file
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{operation} {}", path.display());
}

/// Report rows read from or written to a file, with timing when known
pub fn log_operation_complete(operation: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => {
            log::info!("{operation} {rows} rows, {} ({duration:?})", path.display());
        }
        None => log::info!("{operation} {rows} rows, {}", path.display()),
    }
}

/// Warn, optionally naming the file involved
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}

/// Report the records a filtering step removed from a cohort
pub fn log_step(family: impl std::fmt::Display, step: &str, removed: usize, remaining: usize) {
    log::info!("{step} removed ({family}): {removed} patients (remaining: {remaining})");
}
