//! Nightvac Domain Layer
//!
//! This crate holds the vocabulary shared by the scheduler and the database
//! adapter. It has ZERO external dependencies and defines the statistics
//! record, the qualification reasons and the trait interfaces at the
//! infrastructure boundary.
//!
//! ## Key Concepts
//!
//! - **TableStat**: One row of per-table statistics, read once per run
//! - **TableName**: Schema-qualified identifier, safely quotable for SQL
//! - **Reason**: Why a table was scheduled (freeze age, dead or inserted tuples)
//! - **VacuumCost**: Cost-based throttling values forwarded to the server
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Infrastructure implementations live in other crates (nightvac-postgres)
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod reason;
pub mod table;
pub mod traits;

// Re-exports for convenience
pub use reason::Reason;
pub use table::{TableName, TableStat, VacuumCost};
