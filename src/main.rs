mod config;
mod db;
mod error;
mod models;
mod report;
mod run;
mod spreadsheet;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use config::AppConfig;

#[derive(Parser)]
#[command(
    name = "gastomagico",
    version,
    about = "GastoMágico - local personal expense tracker",
    long_about = "Track expenses by category and payment method in a local SQLite \
                  store. Run without a command to open the terminal dashboard."
)]
struct Cli {
    /// SQLite database file (default: platform data directory)
    #[arg(long, global = true, env = "GASTOMAGICO_DB")]
    db: Option<PathBuf>,

    /// Log filter, e.g. "info" or "gastomagico=debug"
    #[arg(long, global = true, env = "GASTOMAGICO_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<run::Command>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> Result<()> {
    let config = AppConfig::resolve(cli.db, cli.log_level, std::env::var("RUST_LOG").ok())?;
    init_logging(&config, cli.command.is_none())?;

    let mut db = db::Database::open(&config.db_path)?;
    match cli.command {
        Some(command) => run::as_cli(command, &mut db),
        None => run::as_tui(&mut db),
    }
}

/// Logs go to stderr, or to a file beside the database while the dashboard
/// owns the terminal.
fn init_logging(config: &AppConfig, dashboard: bool) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|e| {
        eprintln!("{}", config::filter_warning(&config.log_filter, &e));
        EnvFilter::new(config::DEFAULT_LOG_FILTER)
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if dashboard {
        let path = config.log_path();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}
