//! datesync: replay dated export folders one simulation date at a time.

use anyhow::Result;
use clap::{Parser, Subcommand};
use datesync::checkpoint::DEFAULT_HISTORY_LIMIT;
use datesync_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::error::{HelpfulError, ReportedFailure};
use cli::LedgerArgs;

#[derive(Parser, Debug)]
#[command(
    name = "datesync",
    version,
    about = "Incrementally copy dated export files, one simulation date per run"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// TOML file with source, target and [ledger] settings
    #[arg(long, global = true, env = "DATESYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process the next unprocessed simulation date
    Run {
        /// Root whose subfolders hold dated exports
        #[arg(long, env = "DATESYNC_SOURCE")]
        source: Option<PathBuf>,

        /// Root receiving one subfolder per export folder
        #[arg(long, env = "DATESYNC_TARGET")]
        target: Option<PathBuf>,

        #[command(flatten)]
        ledger: LedgerArgs,

        /// Drop and recreate the ledger table before running
        #[arg(long)]
        restart: bool,

        /// Process this date (YYYY-MM-DD) instead of the next one
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent checkpoint records, newest first
    History {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Number of dates to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show totals across every processed date
    Progress {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the checkpoint for one date so it is processed again
    Reset {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Date to reset (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved paths and settings
    Config {
        #[arg(long, env = "DATESYNC_SOURCE")]
        source: Option<PathBuf>,

        #[arg(long, env = "DATESYNC_TARGET")]
        target: Option<PathBuf>,

        #[command(flatten)]
        ledger: LedgerArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Run { json, .. }
        | Commands::History { json, .. }
        | Commands::Progress { json, .. }
        | Commands::Reset { json, .. }
        | Commands::Config { json, .. } => *json,
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let file = cli::load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            source,
            target,
            ledger,
            restart,
            date,
            json,
        } => cli::run::run(
            cli::run::RunArgs {
                source,
                target,
                ledger,
                restart,
                date,
                json,
            },
            &file,
        ),

        Commands::History {
            ledger,
            limit,
            json,
        } => cli::history::run_history(
            cli::history::HistoryArgs {
                ledger,
                limit,
                json,
            },
            &file,
        ),

        Commands::Progress { ledger, json } => {
            cli::history::run_progress(cli::history::ProgressArgs { ledger, json }, &file)
        }

        Commands::Reset { ledger, date, json } => {
            cli::reset::run(cli::reset::ResetArgs { ledger, date, json }, &file)
        }

        Commands::Config {
            source,
            target,
            ledger,
            json,
        } => cli::config::run(
            cli::config::ConfigArgs {
                source,
                target,
                ledger,
                config_file: cli.config,
                json,
            },
            &file,
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // JSON goes to stdout; keep the console log quiet so callers can parse it
    let json_mode = command_wants_json(&cli.command);
    let _log_guard = match init_logging(LogConfig {
        app_name: "datesync",
        verbose: cli.verbose,
        quiet: json_mode,
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(reported) = err.downcast_ref::<ReportedFailure>() {
                tracing::error!("{}", reported);
            } else if json_mode {
                cli::error::print_json_error(&err);
            } else if let Some(helpful) = err.downcast_ref::<HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("ERROR: {:#}", err);
            }
            ExitCode::from(1)
        }
    }
}
