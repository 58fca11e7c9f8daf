//! Nightvac Scheduler
//!
//! Preemptive vacuum scheduling: vacuum the tables autovacuum is about to
//! pick up, during a quiet window, before it picks them at a bad time.
//!
//! # Overview
//!
//! The scheduler is responsible for:
//! - **Selection**: Deciding which tables qualify and in what order
//! - **Execution**: Vacuuming them one at a time within a wall-clock budget
//! - **Reporting**: Logging each vacuum and summarizing the run
//!
//! # Selection
//!
//! | Tier | Reason | Predicate | Order |
//! |------|--------|-----------|-------|
//! | 1 | `FREEZE_AGE` | `freeze_age > freeze_max_age` | freeze age, descending |
//! | 2 | `DEAD_TUPLES` | `dead > threshold + scale * live` | dead/live, descending |
//! | 3 | `INSERTED_TUPLES` | `inserted > insert_threshold + insert_scale * live` | inserted/live, descending |
//!
//! A table appears once, in the first tier it qualifies for. Tiers 2 and 3
//! skip tables autovacuumed within the cooldown.
//!
//! # Execution
//!
//! Before each vacuum the elapsed time since run start is compared against
//! the timeout. Once it is reached the run stops with `BUDGET_EXCEEDED`; a
//! vacuum already running is never interrupted. An empty queue ends the run
//! with `DRAINED`. A failed vacuum is recorded and, by default, skipped over.
//!
//! # Usage
//!
//! ```
//! use nightvac_domain::traits::{Maintainer, StatsProvider};
//! use nightvac_domain::{TableName, TableStat};
//! use nightvac_scheduler::{Policy, RunReport, RunState, Scheduler};
//!
//! struct Fixed {
//!     tables: Vec<TableStat>,
//!     vacuumed: Vec<TableName>,
//! }
//!
//! impl StatsProvider for Fixed {
//!     type Error = String;
//!     fn snapshot(&self) -> Result<Vec<TableStat>, String> {
//!         Ok(self.tables.clone())
//!     }
//! }
//!
//! impl Maintainer for Fixed {
//!     type Error = String;
//!     fn vacuum(&mut self, table: &TableName) -> Result<(), String> {
//!         self.vacuumed.push(table.clone());
//!         Ok(())
//!     }
//! }
//!
//! let mut session = Fixed {
//!     tables: vec![TableStat::new(TableName::new("public", "t"), 200_000_000, 0, 1)],
//!     vacuumed: Vec::new(),
//! };
//! let scheduler = Scheduler::new(Policy::default()).unwrap();
//!
//! match scheduler.run(&mut session).unwrap() {
//!     RunReport::Executed(summary) => assert_eq!(summary.state, RunState::Drained),
//!     RunReport::Planned(_) => unreachable!(),
//! }
//! ```
//!
//! # Configuration
//!
//! The policy can be loaded from TOML:
//!
//! ```toml
//! freeze_max_age = 150000000
//! dead_tuple_threshold = 50
//! dead_tuple_scale_factor = 0.05
//! insert_threshold = 1000
//! insert_scale_factor = 0.1
//! autovacuum_cooldown_secs = 3600
//! timeout_secs = 1200
//! cost_delay_ms = 2
//! cost_limit = 200
//! on_failure = "continue"
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod clock;
mod config;
mod error;
mod executor;
mod metrics;
mod scheduler;
mod selector;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FailureMode, Policy};
pub use error::{Result, SchedulerError};
pub use executor::Executor;
pub use metrics::{DispatchRecord, RunState, RunSummary};
pub use scheduler::{RunReport, Scheduler};
pub use selector::{qualifies, select, ScheduledItem};
