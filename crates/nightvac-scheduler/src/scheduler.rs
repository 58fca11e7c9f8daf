//! Run orchestration: snapshot, selection, execution

use crate::{select, Clock, Executor, Policy, Result, RunSummary, ScheduledItem, SchedulerError, SystemClock};
use nightvac_domain::traits::{Maintainer, StatsProvider};
use nightvac_domain::Reason;
use std::fmt::Display;
use std::time::Instant;

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// Dry run: the queue that would have been executed
    Planned(Vec<ScheduledItem>),

    /// The queue was executed
    Executed(RunSummary),
}

/// Preemptive vacuum scheduler
///
/// Responsible for:
/// - Reading one statistics snapshot per run
/// - Selecting and ordering the tables that are close to an autovacuum trigger
/// - Vacuuming them one by one within the time budget
///
/// # Examples
///
/// ```no_run
/// use nightvac_postgres::PgSession;
/// use nightvac_scheduler::{Policy, RunReport, Scheduler};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let policy = Policy::default();
/// let scheduler = Scheduler::new(policy.clone())?;
/// let mut session = PgSession::connect("host=localhost dbname=app", policy.cost())?;
///
/// if let RunReport::Executed(summary) = scheduler.run(&mut session)? {
///     println!("{}", summary.summary());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Scheduler<C: Clock = SystemClock> {
    policy: Policy,
    clock: C,
}

impl Scheduler<SystemClock> {
    /// Create a scheduler on the system clock, validating the policy
    pub fn new(policy: Policy) -> Result<Self> {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> Scheduler<C> {
    /// Create a scheduler on a custom clock, validating the policy
    pub fn with_clock(policy: Policy, clock: C) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, clock })
    }

    /// Get the policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Mark the start of the run; the budget counts from here
    pub fn start(&self) -> Instant {
        self.clock.now()
    }

    /// Read the snapshot and build the ordered work queue
    ///
    /// A provider failure is fatal: without a snapshot there is nothing to decide.
    pub fn plan<P>(&self, provider: &P) -> Result<Vec<ScheduledItem>>
    where
        P: StatsProvider,
        P::Error: Display,
    {
        let snapshot = provider
            .snapshot()
            .map_err(|e| SchedulerError::SnapshotQuery(e.to_string()))?;
        tracing::debug!("Read statistics for {} tables", snapshot.len());

        let plan = select(&snapshot, &self.policy);
        log_plan(&plan);
        Ok(plan)
    }

    /// Execute a work queue against a maintainer
    pub fn execute<M>(&self, plan: Vec<ScheduledItem>, maintainer: &mut M, started: Instant) -> RunSummary
    where
        M: Maintainer,
        M::Error: Display,
    {
        Executor::new(&self.policy, &self.clock).execute(plan, maintainer, started)
    }

    /// Plan and, unless the policy is a dry run, execute
    ///
    /// One session answers the snapshot and runs the vacuums, the way a
    /// single database connection does.
    pub fn run<S>(&self, session: &mut S) -> Result<RunReport>
    where
        S: StatsProvider + Maintainer,
        <S as StatsProvider>::Error: Display,
        <S as Maintainer>::Error: Display,
    {
        let started = self.start();
        let plan = self.plan(&*session)?;

        if self.policy.dry_run {
            for item in &plan {
                tracing::info!("DRY RUN: Would vacuum {} ({})", item.table(), item.reason);
            }
            return Ok(RunReport::Planned(plan));
        }

        Ok(RunReport::Executed(self.execute(plan, session, started)))
    }
}

fn log_plan(plan: &[ScheduledItem]) {
    for reason in Reason::ALL {
        tracing::debug!("To vacuum due to {}:", reason);
        for item in plan.iter().filter(|item| item.reason == reason) {
            tracing::debug!("    {}: {}", item.table(), item.metric());
        }
    }
}
