//! chirp CLI
//!
//! Runs one posting cycle and exits. Meant to be triggered by a scheduler.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use chirp::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RunMode},
    services::CrashReporter,
    utils::http,
};

/// chirp - Reddit to Twitter meme reposter
#[derive(Parser, Debug)]
#[command(
    name = "chirp",
    version,
    about = "Reposts fresh memes from Reddit to Twitter"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "chirp.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post the first fresh meme (default)
    Run,

    /// Post up to `posting.max_memes` fresh memes
    Batch,

    /// Validate the config file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Forward a run-ending error to the crash tracker, if one is configured.
async fn report_crash(config: &Config, error: &AppError) {
    let Some(crash) = &config.crash_reporting else {
        return;
    };

    let reporter = match http::create_client(&config.http) {
        Ok(client) => CrashReporter::new(client, crash.clone()),
        Err(e) => {
            log::error!("Could not build crash reporting client: {}", e);
            return;
        }
    };
    if let Err(e) = reporter.report(error).await {
        log::error!("Failed to send crash report: {}", e);
    }
}

async fn run(config_path: &PathBuf, mode: RunMode) {
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load config from {}: {}", config_path.display(), e);
            return;
        }
    };
    log::info!("Loaded configuration from {}", config_path.display());

    if let Err(e) = pipeline::run_cycle(&config, mode).await {
        log::error!("Run failed: {}", e);
        report_crash(&config, &e).await;
    }
}

fn validate(config_path: &PathBuf) -> Result<()> {
    log::info!("Validating {}...", config_path.display());
    let config = Config::load(config_path)?;
    config.validate()?;

    log::info!(
        "Config OK: {} subreddits, {:?} storage",
        config.reddit.subreddits.len(),
        config.storage.backend
    );
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("chirp starting...");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&cli.config, RunMode::Generator).await,
        Command::Batch => run(&cli.config, RunMode::Batch).await,
        Command::Validate => {
            if let Err(e) = validate(&cli.config) {
                log::error!("Config validation failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    log::info!("Done!");
    ExitCode::SUCCESS
}
