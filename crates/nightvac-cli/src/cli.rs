//! CLI argument definitions and parsing.

use clap::{ArgAction, Parser};
use nightvac_scheduler::{FailureMode, Policy};
use std::path::PathBuf;

/// Nightvac - Preemptively vacuum your PostgreSQL database during off-hours.
///
/// Every threshold flag overrides the config file, which overrides the
/// built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "nightvac")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection string (libpq keyword/value or postgresql:// URI)
    #[arg(env = "NIGHTVAC_CONNINFO")]
    pub conninfo: String,

    /// Runtime budget in seconds, checked before each vacuum; never aborts a running vacuum [default: 1200]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Session `vacuum_cost_delay` in milliseconds [default: 2]
    #[arg(long)]
    pub cost_delay: Option<u32>,

    /// Session `vacuum_cost_limit` [default: 200]
    #[arg(long)]
    pub cost_limit: Option<u32>,

    /// Minimum dead tuples to trigger a vacuum, like `autovacuum_vacuum_threshold` [default: 50]
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Fraction of table size added to the threshold, like `autovacuum_vacuum_scale_factor` [default: 0.05]
    #[arg(long)]
    pub scale_factor: Option<f64>,

    /// Minimum inserted tuples to trigger a vacuum, like `autovacuum_vacuum_insert_threshold` [default: 1000]
    #[arg(long)]
    pub insert_threshold: Option<u64>,

    /// Fraction of table size added to the insert threshold [default: 0.1]
    #[arg(long)]
    pub insert_scale_factor: Option<f64>,

    /// Maximum `relfrozenxid` age in millions before vacuuming, like `autovacuum_freeze_max_age` [default: 150]
    #[arg(long)]
    pub freeze_max_age: Option<u64>,

    /// Seconds after an autovacuum during which dead/insert triggers are ignored, 0 to disable [default: 3600]
    #[arg(long)]
    pub autovacuum_cooldown: Option<u64>,

    /// Stop the run at the first failed vacuum instead of moving on
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the tables that would be vacuumed without vacuuming them
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path [default: ~/.nightvac/config.toml if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (table names only)
    Quiet,
}

impl Cli {
    /// Layer the flags that were given over a base policy.
    pub fn apply_overrides(&self, mut policy: Policy) -> Policy {
        if let Some(timeout) = self.timeout {
            policy.timeout_secs = timeout;
        }
        if let Some(delay) = self.cost_delay {
            policy.cost_delay_ms = delay;
        }
        if let Some(limit) = self.cost_limit {
            policy.cost_limit = limit;
        }
        if let Some(threshold) = self.threshold {
            policy.dead_tuple_threshold = threshold;
        }
        if let Some(scale) = self.scale_factor {
            policy.dead_tuple_scale_factor = scale;
        }
        if let Some(threshold) = self.insert_threshold {
            policy.insert_threshold = threshold;
        }
        if let Some(scale) = self.insert_scale_factor {
            policy.insert_scale_factor = scale;
        }
        if let Some(millions) = self.freeze_max_age {
            policy.freeze_max_age = millions.saturating_mul(1_000_000);
        }
        if let Some(cooldown) = self.autovacuum_cooldown {
            policy.autovacuum_cooldown_secs = cooldown;
        }
        if self.fail_fast {
            policy.on_failure = FailureMode::Abort;
        }
        if self.dry_run {
            policy.dry_run = true;
        }
        policy
    }

    /// Default log filter for the verbosity count; `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::parse_from(["nightvac", "host=localhost dbname=app"]);
        assert_eq!(cli.conninfo, "host=localhost dbname=app");
        assert!(cli.timeout.is_none());
        assert!(!cli.dry_run);

        let policy = cli.apply_overrides(Policy::default());
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "nightvac",
            "postgresql://localhost/app",
            "-t",
            "600",
            "--cost-delay",
            "5",
            "--cost-limit",
            "500",
            "--threshold",
            "100",
            "--scale-factor",
            "0.2",
            "--insert-threshold",
            "2000",
            "--insert-scale-factor",
            "0.3",
            "--freeze-max-age",
            "200",
            "--autovacuum-cooldown",
            "0",
            "--fail-fast",
            "--dry-run",
        ]);
        let policy = cli.apply_overrides(Policy::default());

        assert_eq!(policy.timeout_secs, 600);
        assert_eq!(policy.cost_delay_ms, 5);
        assert_eq!(policy.cost_limit, 500);
        assert_eq!(policy.dead_tuple_threshold, 100);
        assert_eq!(policy.dead_tuple_scale_factor, 0.2);
        assert_eq!(policy.insert_threshold, 2000);
        assert_eq!(policy.insert_scale_factor, 0.3);
        assert_eq!(policy.freeze_max_age, 200_000_000);
        assert_eq!(policy.autovacuum_cooldown_secs, 0);
        assert_eq!(policy.on_failure, FailureMode::Abort);
        assert!(policy.dry_run);
    }

    #[test]
    fn test_flags_override_only_what_is_given() {
        let base = Policy {
            timeout_secs: 300,
            cost_limit: 1000,
            ..Default::default()
        };
        let cli = Cli::parse_from(["nightvac", "dbname=app", "--timeout", "60"]);
        let policy = cli.apply_overrides(base);

        assert_eq!(policy.timeout_secs, 60);
        assert_eq!(policy.cost_limit, 1000);
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let result = Cli::try_parse_from(["nightvac", "dbname=app", "--timeout=-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity() {
        let quiet = Cli::parse_from(["nightvac", "dbname=app"]);
        let info = Cli::parse_from(["nightvac", "dbname=app", "-v"]);
        let debug = Cli::parse_from(["nightvac", "dbname=app", "-vvv"]);

        assert_eq!(quiet.log_filter(), "warn");
        assert_eq!(info.log_filter(), "info");
        assert_eq!(debug.log_filter(), "debug");
    }

    #[test]
    fn test_format_conversion() {
        let format: crate::config::OutputFormat = CliFormat::Json.into();
        assert!(matches!(format, crate::config::OutputFormat::Json));
    }
}
