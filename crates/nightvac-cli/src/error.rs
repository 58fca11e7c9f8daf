//! Error types for the CLI application.

use nightvac_scheduler::SchedulerError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scheduling error (connection, snapshot, policy)
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Run stopped after a failed vacuum with fail-fast enabled
    #[error("Run aborted: {0}")]
    Aborted(String),
}
