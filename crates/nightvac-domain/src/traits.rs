//! Trait definitions for external interactions
//!
//! These traits define the boundaries between scheduling logic and the
//! database. Infrastructure implementations live in other crates.

use crate::{TableName, TableStat};

/// Trait for reading the per-table statistics snapshot
///
/// Implemented by the infrastructure layer (nightvac-postgres)
pub trait StatsProvider {
    /// Error type for snapshot queries
    type Error;

    /// Return the current statistics for every candidate table
    fn snapshot(&self) -> Result<Vec<TableStat>, Self::Error>;
}

/// Trait for running the maintenance operation on one table
///
/// Implemented by the infrastructure layer (nightvac-postgres). The call is
/// synchronous and may take arbitrarily long; cost throttling is the
/// implementation's concern.
pub trait Maintainer {
    /// Error type for maintenance operations
    type Error;

    /// Vacuum a single table
    fn vacuum(&mut self, table: &TableName) -> Result<(), Self::Error>;
}
