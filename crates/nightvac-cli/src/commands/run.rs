//! Run command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use nightvac_domain::traits::{Maintainer, StatsProvider};
use nightvac_postgres::PgSession;
use nightvac_scheduler::{Clock, Policy, RunReport, RunState, Scheduler, SchedulerError};
use std::fmt::Display;

/// Rendered result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Plan (dry run) or summary, formatted for stdout
    pub rendered: String,

    /// Set when the run stopped after a failed vacuum
    pub aborted: Option<String>,
}

/// Connect, plan and vacuum.
///
/// The policy is validated before any connection is attempted.
pub fn execute_run(conninfo: &str, policy: Policy, formatter: &Formatter) -> Result<()> {
    let scheduler = Scheduler::new(policy)?;

    let mut session = PgSession::connect(conninfo, scheduler.policy().cost())
        .map_err(|e| SchedulerError::Connection(e.to_string()))?;
    tracing::info!("Connected to PostgreSQL {}", session.server_major());

    let output = drive(&scheduler, &mut session, formatter)?;
    if !output.rendered.is_empty() {
        println!("{}", output.rendered);
    }

    match output.aborted {
        Some(cause) => Err(CliError::Aborted(cause)),
        None => Ok(()),
    }
}

/// Run the scheduler against a session and render what it produced.
pub fn drive<S, C>(scheduler: &Scheduler<C>, session: &mut S, formatter: &Formatter) -> Result<RunOutput>
where
    S: StatsProvider + Maintainer,
    <S as StatsProvider>::Error: Display,
    <S as Maintainer>::Error: Display,
    C: Clock,
{
    match scheduler.run(session)? {
        RunReport::Planned(plan) => Ok(RunOutput {
            rendered: formatter.format_plan(&plan)?,
            aborted: None,
        }),
        RunReport::Executed(summary) => {
            tracing::debug!("{}", summary.summary());

            let aborted = (summary.state == RunState::Aborted).then(|| {
                summary
                    .failures()
                    .last()
                    .map(|record| format!("vacuum of {} failed", record.table))
                    .unwrap_or_else(|| "vacuum failed".to_string())
            });

            Ok(RunOutput {
                rendered: formatter.format_summary(&summary)?,
                aborted,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use nightvac_domain::{TableName, TableStat};
    use nightvac_scheduler::{FailureMode, ManualClock};

    /// In-memory session that can fail chosen tables
    struct MockSession {
        tables: Vec<TableStat>,
        failing: Vec<TableName>,
        vacuumed: Vec<TableName>,
    }

    impl MockSession {
        fn new(tables: Vec<TableStat>) -> Self {
            Self {
                tables,
                failing: Vec::new(),
                vacuumed: Vec::new(),
            }
        }
    }

    impl StatsProvider for MockSession {
        type Error = String;

        fn snapshot(&self) -> std::result::Result<Vec<TableStat>, Self::Error> {
            Ok(self.tables.clone())
        }
    }

    impl Maintainer for MockSession {
        type Error = String;

        fn vacuum(&mut self, table: &TableName) -> std::result::Result<(), Self::Error> {
            if self.failing.contains(table) {
                return Err("permission denied".to_string());
            }
            self.vacuumed.push(table.clone());
            Ok(())
        }
    }

    fn table(name: &str) -> TableName {
        TableName::new("public", name)
    }

    fn session() -> MockSession {
        MockSession::new(vec![
            TableStat::new(table("old"), 300_000_000, 0, 100),
            TableStat::new(table("busy"), 0, 5_000, 10_000),
            TableStat::new(table("calm"), 0, 1, 10_000),
        ])
    }

    fn quiet() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[test]
    fn test_drive_vacuums_in_priority_order() {
        let scheduler = Scheduler::with_clock(Policy::default(), ManualClock::new()).unwrap();
        let mut session = session();

        let output = drive(&scheduler, &mut session, &quiet()).unwrap();

        assert_eq!(session.vacuumed, vec![table("old"), table("busy")]);
        assert_eq!(output.rendered, "public.old\npublic.busy");
        assert_eq!(output.aborted, None);
    }

    #[test]
    fn test_dry_run_vacuums_nothing() {
        let policy = Policy {
            dry_run: true,
            ..Default::default()
        };
        let scheduler = Scheduler::with_clock(policy, ManualClock::new()).unwrap();
        let mut session = session();

        let output = drive(&scheduler, &mut session, &quiet()).unwrap();

        assert!(session.vacuumed.is_empty());
        assert_eq!(output.rendered, "public.old\npublic.busy");
    }

    #[test]
    fn test_failure_is_tolerated_by_default() {
        let scheduler = Scheduler::with_clock(Policy::default(), ManualClock::new()).unwrap();
        let mut session = session();
        session.failing.push(table("old"));

        let output = drive(&scheduler, &mut session, &quiet()).unwrap();

        assert_eq!(session.vacuumed, vec![table("busy")]);
        assert_eq!(output.rendered, "public.busy");
        assert_eq!(output.aborted, None);
    }

    #[test]
    fn test_abort_mode_reports_cause_with_summary() {
        let policy = Policy {
            on_failure: FailureMode::Abort,
            ..Default::default()
        };
        let scheduler = Scheduler::with_clock(policy, ManualClock::new()).unwrap();
        let mut session = session();
        session.failing.push(table("old"));

        let json = Formatter::new(OutputFormat::Json, false);

        let output = drive(&scheduler, &mut session, &json).unwrap();

        assert!(session.vacuumed.is_empty());
        let rendered: serde_json::Value = serde_json::from_str(&output.rendered).unwrap();
        assert_eq!(rendered["state"], "ABORTED");
        assert_eq!(rendered["skipped"], 1);
        let cause = output.aborted.expect("Run should report the abort");
        assert!(cause.contains("public.old"));
    }

    #[test]
    fn test_invalid_policy_fails_before_connecting() {
        let policy = Policy {
            cost_limit: 0,
            ..Default::default()
        };
        let result = execute_run("host=127.0.0.1 port=1", policy, &quiet());
        assert!(matches!(
            result,
            Err(CliError::Scheduler(SchedulerError::Config(_)))
        ));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let result = execute_run(
            "host=127.0.0.1 port=1 dbname=nightvac connect_timeout=2",
            Policy::default(),
            &quiet(),
        );
        assert!(matches!(
            result,
            Err(CliError::Scheduler(SchedulerError::Connection(_)))
        ));
    }
}
