//! Utility functions for table files and logging

pub mod io;
pub mod logging;

pub use io::{DEFAULT_BATCH_SIZE, TableFormat, read_table, table_path, write_table};
