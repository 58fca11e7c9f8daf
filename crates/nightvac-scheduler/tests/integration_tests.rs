//! Integration tests for nightvac-scheduler
//!
//! These tests drive full runs (snapshot → selection → execution) against
//! an in-memory session and a manually advanced clock.

mod common;

use common::capture_logs;
use nightvac_domain::traits::{Maintainer, StatsProvider};
use nightvac_domain::{Reason, TableName, TableStat};
use nightvac_scheduler::{
    select, ManualClock, Policy, RunReport, RunState, RunSummary, ScheduledItem, Scheduler,
};
use std::time::Duration;
use tracing::Level;

/// Session double that takes a fixed amount of simulated time per table
struct SimulatedSession {
    tables: Vec<TableStat>,
    clock: ManualClock,
    per_table: Duration,
    failing: Vec<TableName>,
    attempted: Vec<TableName>,
}

impl SimulatedSession {
    fn new(clock: &ManualClock, per_table: Duration) -> Self {
        Self {
            tables: Vec::new(),
            clock: clock.clone(),
            per_table,
            failing: Vec::new(),
            attempted: Vec::new(),
        }
    }

    fn with_tables(mut self, tables: Vec<TableStat>) -> Self {
        self.tables = tables;
        self
    }
}

impl StatsProvider for SimulatedSession {
    type Error = String;

    fn snapshot(&self) -> Result<Vec<TableStat>, Self::Error> {
        Ok(self.tables.clone())
    }
}

impl Maintainer for SimulatedSession {
    type Error = String;

    fn vacuum(&mut self, table: &TableName) -> Result<(), Self::Error> {
        self.attempted.push(table.clone());
        self.clock.advance(self.per_table);
        if self.failing.contains(table) {
            return Err("canceling statement due to lock timeout".to_string());
        }
        Ok(())
    }
}

fn table(name: &str) -> TableName {
    TableName::new("public", name)
}

fn executed(report: RunReport) -> RunSummary {
    match report {
        RunReport::Executed(summary) => summary,
        RunReport::Planned(_) => panic!("Expected an executed run"),
    }
}

fn dead_queue(names: &[&str]) -> Vec<ScheduledItem> {
    names
        .iter()
        .map(|name| ScheduledItem {
            stat: TableStat::new(table(name), 0, 5_000, 10_000),
            reason: Reason::DeadTuples,
        })
        .collect()
}

#[test]
fn test_single_old_table_is_scheduled_for_freeze_age() {
    let snapshot = vec![TableStat::new(table("accounts"), 200_000_000, 0, 1_000)];

    let queue = select(&snapshot, &Policy::default());

    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].table(), &table("accounts"));
    assert_eq!(queue[0].reason, Reason::FreezeAge);
}

#[test]
fn test_only_dead_tuple_table_above_threshold_is_scheduled() {
    let snapshot = vec![
        TableStat::new(table("table1"), 0, 1_000, 10_000),
        TableStat::new(table("table2"), 0, 40, 10_000),
    ];

    let queue = select(&snapshot, &Policy::default());

    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].table(), &table("table1"));
    assert_eq!(queue[0].reason, Reason::DeadTuples);
}

#[test]
fn test_zero_timeout_dispatches_nothing() {
    let clock = ManualClock::new();
    let policy = Policy {
        timeout_secs: 0,
        ..Default::default()
    };
    let scheduler = Scheduler::with_clock(policy, clock.clone()).unwrap();
    let mut session = SimulatedSession::new(&clock, Duration::from_secs(1));

    let summary = scheduler.execute(dead_queue(&["a", "b"]), &mut session, scheduler.start());

    assert_eq!(summary.state, RunState::BudgetExceeded);
    assert_eq!(summary.attempted(), 0);
    assert!(session.attempted.is_empty());
}

#[test]
fn test_failed_dispatch_does_not_block_the_rest() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::with_clock(Policy::default(), clock.clone()).unwrap();
    let mut session = SimulatedSession::new(&clock, Duration::from_secs(10));
    session.failing.push(table("second"));

    let (summary, logs) = capture_logs(|| {
        scheduler.execute(
            dead_queue(&["first", "second", "third"]),
            &mut session,
            scheduler.start(),
        )
    });

    assert_eq!(session.attempted.len(), 3);
    assert_eq!(summary.state, RunState::Drained);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(summary.summary().contains("public.second: canceling statement"));

    // The failure is logged with its table and cause
    let failure = logs
        .iter()
        .find(|record| record.level == Level::ERROR)
        .expect("No error record for the failed vacuum");
    assert_eq!(failure.field("table"), Some("public.second"));
    assert!(failure.message.contains("canceling statement due to lock timeout"));

    // One summary record reports the terminal state and the counts
    let finished: Vec<_> = logs
        .iter()
        .filter(|record| record.message.starts_with("Run finished"))
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].field("state"), Some("DRAINED"));
    assert_eq!(finished[0].field("succeeded"), Some("2"));
    assert_eq!(finished[0].field("failed"), Some("1"));
}

#[test]
fn test_full_run_respects_tiers_and_budget() {
    let clock = ManualClock::new();
    let policy = Policy {
        timeout_secs: 250,
        ..Default::default()
    };
    let scheduler = Scheduler::with_clock(policy, clock.clone()).unwrap();
    let mut session = SimulatedSession::new(&clock, Duration::from_secs(100)).with_tables(vec![
        TableStat::new(table("hot"), 0, 8_000, 10_000),
        TableStat::new(table("ancient"), 400_000_000, 0, 10),
        TableStat::new(table("warm"), 0, 3_000, 10_000),
        TableStat::new(table("old"), 160_000_000, 9_000, 10_000),
        TableStat::new(table("calm"), 1_000, 10, 10_000),
    ]);

    let summary = executed(scheduler.run(&mut session).unwrap());

    // Starts at 0, 100, 200; the fourth check at 300 trips the 250s budget
    assert_eq!(
        session.attempted,
        vec![table("ancient"), table("old"), table("hot")]
    );
    assert_eq!(summary.scheduled, 4);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.state, RunState::BudgetExceeded);
    assert_eq!(summary.elapsed, Duration::from_secs(300));
}

#[test]
fn test_snapshot_is_not_refreshed_mid_run() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::with_clock(Policy::default(), clock.clone()).unwrap();
    let mut session = SimulatedSession::new(&clock, Duration::ZERO).with_tables(vec![
        TableStat::new(table("a"), 300_000_000, 0, 1),
        TableStat::new(table("b"), 200_000_000, 0, 1),
    ]);

    let summary = executed(scheduler.run(&mut session).unwrap());

    assert_eq!(summary.state, RunState::Drained);
    assert_eq!(session.attempted, vec![table("a"), table("b")]);
}

#[test]
fn test_dry_run_logs_each_planned_table() {
    let clock = ManualClock::new();
    let policy = Policy {
        dry_run: true,
        ..Default::default()
    };
    let scheduler = Scheduler::with_clock(policy, clock.clone()).unwrap();
    let mut session = SimulatedSession::new(&clock, Duration::ZERO).with_tables(vec![
        TableStat::new(table("old"), 300_000_000, 0, 1),
        TableStat::new(table("busy"), 0, 5_000, 10_000),
    ]);

    let (report, logs) = capture_logs(|| scheduler.run(&mut session).unwrap());

    assert!(matches!(report, RunReport::Planned(ref plan) if plan.len() == 2));
    assert!(session.attempted.is_empty());
    let planned: Vec<&str> = logs
        .iter()
        .filter(|record| record.message.starts_with("DRY RUN"))
        .map(|record| record.message.as_str())
        .collect();
    assert_eq!(
        planned,
        vec![
            "DRY RUN: Would vacuum public.old (FREEZE_AGE)",
            "DRY RUN: Would vacuum public.busy (DEAD_TUPLES)",
        ]
    );
}
