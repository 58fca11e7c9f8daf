//! Command implementations.

pub mod run;

pub use run::{drive, execute_run, RunOutput};
