//! Nightvac CLI library.
//!
//! This library provides the pieces of the `nightvac` command: argument
//! parsing, configuration loading, the run command and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
