//! Scheduling policy
//!
//! Thresholds mirror PostgreSQL's own autovacuum settings so that nightvac
//! fires slightly before autovacuum would.

use crate::{Result, SchedulerError};
use nightvac_domain::VacuumCost;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound PostgreSQL accepts for `vacuum_cost_delay` (ms)
const MAX_COST_DELAY_MS: u32 = 100;

/// Upper bound PostgreSQL accepts for `vacuum_cost_limit`
const MAX_COST_LIMIT: u32 = 10_000;

/// What the execution loop does after a table fails to vacuum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Record the failure and move on to the next table
    #[default]
    Continue,

    /// Record the failure and stop the run
    Abort,
}

/// Immutable policy for one run
///
/// Built once at startup (defaults, then config file, then flags) and passed
/// by reference into the selector and the execution loop.
///
/// # Examples
///
/// ```
/// use nightvac_scheduler::Policy;
///
/// let policy = Policy::default();
/// assert_eq!(policy.freeze_max_age, 150_000_000);
/// assert_eq!(policy.timeout_secs, 1200);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Freeze age above which a table is scheduled first
    /// Default: 150 million (PostgreSQL's `autovacuum_freeze_max_age`)
    pub freeze_max_age: u64,

    /// Base number of dead tuples before a table qualifies
    /// Default: 50 (`autovacuum_vacuum_threshold`)
    pub dead_tuple_threshold: u64,

    /// Fraction of the live estimate added to the dead-tuple threshold
    /// Default: 0.05 (PostgreSQL uses 0.2)
    pub dead_tuple_scale_factor: f64,

    /// Base number of inserted tuples before a table qualifies
    /// Default: 1000 (`autovacuum_vacuum_insert_threshold`)
    pub insert_threshold: u64,

    /// Fraction of the live estimate added to the insert threshold
    /// Default: 0.1
    pub insert_scale_factor: f64,

    /// Skip dead/insert qualifiers autovacuumed within this many seconds
    /// Default: 3600, 0 disables the check
    pub autovacuum_cooldown_secs: u64,

    /// Wall-clock budget for the whole run, checked between vacuums
    /// Default: 1200 (20 minutes)
    pub timeout_secs: u64,

    /// `vacuum_cost_delay` in milliseconds, forwarded verbatim
    /// Default: 2
    pub cost_delay_ms: u32,

    /// `vacuum_cost_limit`, forwarded verbatim
    /// Default: 200
    pub cost_limit: u32,

    /// Behaviour after a failed vacuum
    /// Default: continue
    pub on_failure: FailureMode,

    /// Dry-run mode: plan and report without vacuuming anything
    /// Default: false
    pub dry_run: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            freeze_max_age: 150_000_000,
            dead_tuple_threshold: 50,
            dead_tuple_scale_factor: 0.05,
            insert_threshold: 1000,
            insert_scale_factor: 0.1,
            autovacuum_cooldown_secs: 3600,
            timeout_secs: 20 * 60,
            cost_delay_ms: 2,
            cost_limit: 200,
            on_failure: FailureMode::Continue,
            dry_run: false,
        }
    }
}

impl Policy {
    /// Reject values that would make the selection meaningless
    ///
    /// Called before any database interaction.
    pub fn validate(&self) -> Result<()> {
        check_scale_factor("dead_tuple_scale_factor", self.dead_tuple_scale_factor)?;
        check_scale_factor("insert_scale_factor", self.insert_scale_factor)?;

        if self.freeze_max_age == 0 {
            return Err(SchedulerError::Config(
                "freeze_max_age must be greater than zero".into(),
            ));
        }
        if self.cost_delay_ms > MAX_COST_DELAY_MS {
            return Err(SchedulerError::Config(format!(
                "cost_delay_ms must be at most {}, got {}",
                MAX_COST_DELAY_MS, self.cost_delay_ms
            )));
        }
        if self.cost_limit == 0 || self.cost_limit > MAX_COST_LIMIT {
            return Err(SchedulerError::Config(format!(
                "cost_limit must be between 1 and {}, got {}",
                MAX_COST_LIMIT, self.cost_limit
            )));
        }
        Ok(())
    }

    /// Get the run budget as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the autovacuum cooldown as Duration
    pub fn autovacuum_cooldown(&self) -> Duration {
        Duration::from_secs(self.autovacuum_cooldown_secs)
    }

    /// Cost settings for the maintenance session
    pub fn cost(&self) -> VacuumCost {
        VacuumCost {
            delay_ms: self.cost_delay_ms,
            limit: self.cost_limit,
        }
    }
}

fn check_scale_factor(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SchedulerError::Config(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}
