//! Nightvac - Preemptively vacuum a PostgreSQL database during off-hours.

use clap::Parser;
use nightvac_cli::commands;
use nightvac_cli::{Cli, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Logs to stderr, report to stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> nightvac_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let policy = cli.apply_overrides(config.policy);

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    commands::execute_run(&cli.conninfo, policy, &formatter)
}
