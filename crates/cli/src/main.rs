//! Portal CLI - student portal session and catalog client

mod commands;
mod config;
mod logging;
mod state_dir;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use state_dir::StateDir;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Command-line client for the student portal")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (defaults to <data dir>/config.json when present)
    #[arg(short = 'c', long, global = true, env = "PORTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the session file and logs
    #[arg(short = 'd', long, global = true, env = "PORTAL_STATE_DIR")]
    data_dir: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let state = StateDir::resolve(cli.data_dir);

    let log_file = (!cli.no_file_log).then(|| state.log_file());
    logging::init_logging(cli.log_level.into(), log_file.as_deref(), cli.json_logs)?;

    info!(data_dir = %state.root().display(), "starting portal CLI");

    let ctx = Context {
        state,
        config_path: cli.config,
    };

    // Execute command with optional timeout
    if cli.timeout == 0 {
        if let Err(e) = cli.command.execute(ctx).await {
            error!("Command failed: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(ctx)).await {
            Ok(Ok(())) => {
                info!("Command completed successfully");
            }
            Ok(Err(e)) => {
                error!("Command failed: {e:#}");
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                eprintln!("error: timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
