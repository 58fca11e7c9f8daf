//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use nightvac_domain::Reason;
use nightvac_scheduler::{RunState, RunSummary, ScheduledItem};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the work queue of a dry run.
    pub fn format_plan(&self, plan: &[ScheduledItem]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_plan_json(plan),
            OutputFormat::Table => self.format_plan_table(plan),
            OutputFormat::Quiet => Ok(plan
                .iter()
                .map(|item| item.table().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format the outcome of an executed run.
    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_summary_json(summary),
            OutputFormat::Table => self.format_summary_table(summary),
            // Only what was actually vacuumed
            OutputFormat::Quiet => Ok(summary
                .dispatches
                .iter()
                .filter(|record| record.succeeded())
                .map(|record| record.table.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_plan_json(&self, plan: &[ScheduledItem]) -> Result<String> {
        let items: Vec<serde_json::Value> = plan
            .iter()
            .map(|item| {
                serde_json::json!({
                    "table": item.table().to_string(),
                    "reason": item.reason.as_str(),
                    "freeze_age": item.stat.freeze_age,
                    "dead_tuple_count": item.stat.dead_tuple_count,
                    "live_tuple_estimate": item.stat.live_tuple_estimate,
                    "inserted_since_vacuum": item.stat.inserted_since_vacuum,
                    "metric": item.metric(),
                })
            })
            .collect();

        Ok(serde_json::to_string_pretty(&items)?)
    }

    fn format_plan_table(&self, plan: &[ScheduledItem]) -> Result<String> {
        if plan.is_empty() {
            return Ok(self.colorize("No tables need vacuuming.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Table", "Reason", "Metric", "Freeze Age", "Dead", "Live"]);

        for (position, item) in plan.iter().enumerate() {
            builder.push_record([
                (position + 1).to_string(),
                item.table().to_string(),
                self.reason(item.reason),
                item.metric(),
                item.stat.freeze_age.to_string(),
                item.stat.dead_tuple_count.to_string(),
                item.stat.live_tuple_estimate.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        Ok(table.to_string())
    }

    fn format_summary_json(&self, summary: &RunSummary) -> Result<String> {
        let by_reason: serde_json::Map<String, serde_json::Value> = summary
            .scheduled_by_reason
            .iter()
            .map(|(reason, count)| (reason.as_str().to_string(), (*count).into()))
            .collect();
        let dispatches: Vec<serde_json::Value> = summary
            .dispatches
            .iter()
            .map(|record| {
                serde_json::json!({
                    "table": record.table.to_string(),
                    "reason": record.reason.as_str(),
                    "duration_secs": record.duration.as_secs_f64(),
                    "error": record.error,
                })
            })
            .collect();

        let value = serde_json::json!({
            "state": summary.state.as_str(),
            "elapsed_secs": summary.elapsed.as_secs_f64(),
            "scheduled": summary.scheduled,
            "scheduled_by_reason": by_reason,
            "attempted": summary.attempted(),
            "succeeded": summary.succeeded(),
            "failed": summary.failed(),
            "skipped": summary.skipped(),
            "dispatches": dispatches,
        });

        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_summary_table(&self, summary: &RunSummary) -> Result<String> {
        let mut builder = Builder::default();
        builder.push_record(["Table", "Reason", "Duration", "Result"]);

        for record in &summary.dispatches {
            let result = match &record.error {
                None => self.colorize("ok", "green"),
                Some(error) => self.colorize(error, "red"),
            };
            builder.push_record([
                record.table.to_string(),
                self.reason(record.reason),
                format!("{:.1}s", record.duration.as_secs_f64()),
                result,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let headline = format!(
            "{}: {} scheduled, {} vacuumed, {} failed, {} skipped in {:.1}s",
            summary.state,
            summary.scheduled,
            summary.succeeded(),
            summary.failed(),
            summary.skipped(),
            summary.elapsed.as_secs_f64()
        );
        let headline = match summary.state {
            RunState::Drained if summary.failed() == 0 => self.success(&headline),
            RunState::Aborted => self.error(&headline),
            _ => self.warning(&headline),
        };

        if summary.dispatches.is_empty() {
            return Ok(headline);
        }
        Ok(format!("{}\n{}", table, headline))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn reason(&self, reason: Reason) -> String {
        let color = match reason {
            Reason::FreezeAge => "red",
            Reason::DeadTuples => "yellow",
            Reason::InsertedTuples => "cyan",
        };
        self.colorize(reason.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}
