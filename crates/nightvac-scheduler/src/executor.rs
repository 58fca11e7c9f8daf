//! Time-gated execution loop

use crate::{Clock, FailureMode, Policy, RunState, RunSummary, ScheduledItem, SchedulerError};
use nightvac_domain::traits::Maintainer;
use std::fmt::Display;
use std::time::Instant;

/// Dispatches vacuums one at a time until the queue drains or the budget runs out
///
/// The budget is only checked between dispatches. A vacuum that has started
/// always runs to completion, even if it overruns the timeout.
pub struct Executor<'a, C: Clock> {
    policy: &'a Policy,
    clock: C,
}

impl<'a, C: Clock> Executor<'a, C> {
    /// Create an executor for a policy and time source
    pub fn new(policy: &'a Policy, clock: C) -> Self {
        Self { policy, clock }
    }

    /// Run the queue against a maintainer, starting the budget at `started`
    pub fn execute<M>(
        &self,
        queue: Vec<ScheduledItem>,
        maintainer: &mut M,
        started: Instant,
    ) -> RunSummary
    where
        M: Maintainer,
        M::Error: Display,
    {
        let mut summary = RunSummary::new(&queue);
        let mut pending = queue.into_iter();
        let mut state = RunState::Running;

        while !state.is_terminal() {
            state = self.step(&mut pending, maintainer, started, &mut summary);
        }

        summary.finish(state, self.clock.now().saturating_duration_since(started));
        log_termination(&summary);
        summary
    }

    /// One transition of the state machine
    fn step<M>(
        &self,
        pending: &mut impl Iterator<Item = ScheduledItem>,
        maintainer: &mut M,
        started: Instant,
        summary: &mut RunSummary,
    ) -> RunState
    where
        M: Maintainer,
        M::Error: Display,
    {
        let Some(item) = pending.next() else {
            return RunState::Drained;
        };

        let elapsed = self.clock.now().saturating_duration_since(started);
        if elapsed >= self.policy.timeout() {
            tracing::info!(
                elapsed_secs = elapsed.as_secs(),
                timeout_secs = self.policy.timeout_secs,
                "Exceeded timeout, finishing before {}",
                item.table()
            );
            return RunState::BudgetExceeded;
        }

        tracing::info!(table = %item.table(), reason = %item.reason, "Vacuuming {}", item.table());
        let dispatched = self.clock.now();
        let result = maintainer.vacuum(item.table());
        let duration = self.clock.now().saturating_duration_since(dispatched);

        match result {
            Ok(()) => {
                tracing::info!(
                    table = %item.table(),
                    duration_ms = duration.as_millis() as u64,
                    "Vacuumed {}",
                    item.table()
                );
                summary.record_success(&item, duration);
                RunState::Running
            }
            Err(e) => {
                let error = SchedulerError::Maintenance {
                    table: item.table().to_string(),
                    message: e.to_string(),
                };
                tracing::error!(
                    table = %item.table(),
                    duration_ms = duration.as_millis() as u64,
                    "{}",
                    error
                );
                summary.record_failure(&item, duration, e.to_string());

                match self.policy.on_failure {
                    FailureMode::Continue => RunState::Running,
                    FailureMode::Abort => RunState::Aborted,
                }
            }
        }
    }
}

fn log_termination(summary: &RunSummary) {
    tracing::info!(
        state = %summary.state,
        scheduled = summary.scheduled,
        attempted = summary.attempted(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        elapsed_secs = summary.elapsed.as_secs(),
        "Run finished: {} of {} vacuumed, {} failed ({})",
        summary.succeeded(),
        summary.scheduled,
        summary.failed(),
        summary.state
    );
}
