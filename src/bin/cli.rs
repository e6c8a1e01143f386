//! waitlog CLI
//!
//! Local and cron entry point. For AWS Lambda, use `waitlog-lambda`.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use waitlog::{
    error::ConfigError,
    models::{Config, LedgerBackend},
    pipeline::{self, DefaultBackends, Report, RunFailure},
};

/// waitlog - resort wait-time ledger
#[derive(Parser, Debug)]
#[command(
    name = "waitlog",
    version,
    about = "Append resort live wait times to a yearly spreadsheet ledger"
)]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, default_value = "waitlog.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write to a local directory ledger instead of the configured backend
    #[arg(long, global = true)]
    local_ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch statuses and append one row per facility to this year's ledger
    Run,

    /// Fetch and print statuses without writing anything
    Fetch,

    /// Check settings, year mapping and credentials without network access
    Validate,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print the report's line to the matching stream and map it to an exit code.
fn finish(report: &Report) -> ExitCode {
    match report {
        Report::Success(line) => println!("{line}"),
        Report::Failure(line) => eprintln!("{line}"),
    }
    ExitCode::from(report.exit_code())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });

    if let Some(dir) = &cli.local_ledger {
        config.ledger.backend = LedgerBackend::Local;
        config.ledger.local_dir = dir.to_string_lossy().into_owned();
    }

    let now = Local::now().fixed_offset();
    let env = |key: &str| std::env::var(key).ok();

    match cli.command {
        Command::Run => {
            let result = pipeline::run_once(&config, env, &DefaultBackends, now).await;
            match &result {
                Ok(summary) if summary.degraded() > 0 => log::warn!(
                    "{} of {} facilities recorded without live data",
                    summary.degraded(),
                    summary.statuses.len()
                ),
                Ok(_) => {}
                Err(failure) => log::error!("Run failed in state {}", failure.state),
            }
            finish(&Report::from(&result))
        }

        Command::Fetch => match pipeline::run_fetch(&config).await {
            Ok(statuses) => {
                print!("{}", pipeline::format_statuses(&statuses));
                ExitCode::SUCCESS
            }
            Err(e) => {
                let failure = RunFailure::configuration(ConfigError::Client(e));
                finish(&Report::from(&failure))
            }
        },

        Command::Validate => match pipeline::run_validate(&config, env, now) {
            Ok(report) => {
                println!("facilities: {}", report.facilities);
                println!("ledger backend: {}", report.backend);
                println!("mapped years: {}", report.years.join(", "));
                match &report.target {
                    Ok(target) => println!(
                        "current target: {} ({}/{})",
                        target.ledger_id, target.year, target.tab_name
                    ),
                    Err(e) => println!("current target: none ({e})"),
                }
                println!(
                    "next year mapped: {}",
                    if report.next_year_ready { "yes" } else { "no" }
                );
                if report.is_runnable() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => finish(&Report::from(&RunFailure::configuration(e))),
        },
    }
}
