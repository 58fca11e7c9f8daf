//! Run summary collected by the execution loop

use crate::ScheduledItem;
use nightvac_domain::{Reason, TableName};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// State of the execution loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Still dispatching
    Running,

    /// Pre-dispatch check found the budget spent (terminal)
    BudgetExceeded,

    /// Every scheduled table was attempted (terminal)
    Drained,

    /// Stopped after a failure under `FailureMode::Abort` (terminal)
    Aborted,
}

impl RunState {
    /// Whether the loop stops in this state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }

    /// Get the state name as it appears in logs and output
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "RUNNING",
            RunState::BudgetExceeded => "BUDGET_EXCEEDED",
            RunState::Drained => "DRAINED",
            RunState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one vacuum
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    /// Table that was vacuumed
    pub table: TableName,

    /// Why it was scheduled
    pub reason: Reason,

    /// How long the vacuum took
    pub duration: Duration,

    /// Failure cause, `None` on success
    pub error: Option<String>,
}

impl DispatchRecord {
    /// Whether the vacuum succeeded
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one run
///
/// Tracks what was scheduled, what was attempted and how each attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Tables in the work queue
    pub scheduled: usize,

    /// Scheduled tables per reason
    pub scheduled_by_reason: BTreeMap<Reason, usize>,

    /// One record per attempted vacuum, in dispatch order
    pub dispatches: Vec<DispatchRecord>,

    /// Terminal state (or `Running` while the loop is active)
    pub state: RunState,

    /// Wall-clock time from run start to termination
    pub elapsed: Duration,
}

impl RunSummary {
    /// Create an empty summary for a work queue
    pub fn new(queue: &[ScheduledItem]) -> Self {
        let mut scheduled_by_reason = BTreeMap::new();
        for item in queue {
            *scheduled_by_reason.entry(item.reason).or_insert(0) += 1;
        }

        Self {
            scheduled: queue.len(),
            scheduled_by_reason,
            dispatches: Vec::new(),
            state: RunState::Running,
            elapsed: Duration::ZERO,
        }
    }

    /// Record a successful vacuum
    pub fn record_success(&mut self, item: &ScheduledItem, duration: Duration) {
        self.dispatches.push(DispatchRecord {
            table: item.table().clone(),
            reason: item.reason,
            duration,
            error: None,
        });
    }

    /// Record a failed vacuum
    pub fn record_failure(&mut self, item: &ScheduledItem, duration: Duration, error: String) {
        self.dispatches.push(DispatchRecord {
            table: item.table().clone(),
            reason: item.reason,
            duration,
            error: Some(error),
        });
    }

    /// Record loop termination
    pub fn finish(&mut self, state: RunState, elapsed: Duration) {
        self.state = state;
        self.elapsed = elapsed;
    }

    /// Vacuums started
    pub fn attempted(&self) -> usize {
        self.dispatches.len()
    }

    /// Vacuums that completed without error
    pub fn succeeded(&self) -> usize {
        self.dispatches.iter().filter(|d| d.succeeded()).count()
    }

    /// Vacuums that reported an error
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Scheduled tables that were never attempted
    pub fn skipped(&self) -> usize {
        self.scheduled - self.attempted()
    }

    /// Failed dispatches, in order
    pub fn failures(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.dispatches.iter().filter(|d| !d.succeeded())
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Nightvac Run Summary".to_string(),
            "====================".to_string(),
            format!("Terminal state: {}", self.state),
            format!("Elapsed: {}s", self.elapsed.as_secs()),
            format!("Scheduled: {}", self.scheduled),
            format!("Attempted: {}", self.attempted()),
            format!("Succeeded: {}", self.succeeded()),
            format!("Failed: {}", self.failed()),
            format!("Skipped: {}", self.skipped()),
        ];

        if !self.scheduled_by_reason.is_empty() {
            lines.push(String::new());
            lines.push("Scheduled by reason:".to_string());
            for (reason, count) in &self.scheduled_by_reason {
                lines.push(format!("  {}: {}", reason, count));
            }
        }

        if self.failed() > 0 {
            lines.push(String::new());
            lines.push("Failures:".to_string());
            for record in self.failures() {
                lines.push(format!(
                    "  {}: {}",
                    record.table,
                    record.error.as_deref().unwrap_or_default()
                ));
            }
        }

        lines.join("\n")
    }
}
