//! Error types for scheduling runs

use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur while planning or executing a run
///
/// Everything except `Maintenance` is fatal for the run. `Maintenance` is
/// recorded per table and only escalates under `FailureMode::Abort`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Cannot reach or authenticate to the database
    #[error("Connection error: {0}")]
    Connection(String),

    /// The statistics query failed, no scheduling decision is possible
    #[error("Snapshot query failed: {0}")]
    SnapshotQuery(String),

    /// A single table's maintenance operation failed
    #[error("Vacuum of {table} failed: {message}")]
    Maintenance {
        /// Schema-qualified table name
        table: String,
        /// Underlying cause as reported by the database
        message: String,
    },

    /// Invalid policy values
    #[error("Configuration error: {0}")]
    Config(String),
}
