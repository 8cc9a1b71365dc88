//! Record sink trait and output errors

use crate::feed::PostRecord;
use crate::output::stats::RunStatistics;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No run in progress")]
    NoActiveRun,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for harvested records
///
/// A run is bracketed by `begin_run` and `finish_run`; records and failures
/// in between belong to that run and arrive in traversal order.
pub trait RecordSink {
    /// Opens a new run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration the run was started with
    ///
    /// # Returns
    ///
    /// The id of the new run
    fn begin_run(&mut self, config_hash: &str) -> OutputResult<i64>;

    /// Stores one post record
    fn record_post(&mut self, record: &PostRecord) -> OutputResult<()>;

    /// Stores the error that stopped a target early
    ///
    /// # Arguments
    ///
    /// * `target` - Target name
    /// * `reason` - Rendered error
    fn record_failure(&mut self, target: &str, reason: &str) -> OutputResult<()>;

    /// Closes the current run with its final statistics
    fn finish_run(&mut self, stats: &RunStatistics) -> OutputResult<()>;
}
