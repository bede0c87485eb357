//! Logging setup shared by datesync binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "datesync=info,datesync_db=warn";
const HOME_ENV: &str = "DATESYNC_HOME";

/// Logging options for one process.
pub struct LogConfig<'a> {
    /// Base name of the rolling log file (`<app_name>.log.YYYY-MM-DD`)
    pub app_name: &'a str,
    /// Debug-level console output
    pub verbose: bool,
    /// Only warnings and errors on the console (machine-readable stdout)
    pub quiet: bool,
}

/// Install the global subscriber: daily rolling file under the logs
/// directory plus stderr.
///
/// Keep the returned guard alive for the whole process, dropping it flushes
/// the file writer.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let mut guard = None;
    let file_layer = match ensure_logs_dir() {
        Ok(dir) => {
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.app_name));
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(env_filter.clone()),
            )
        }
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    let console_filter = if config.verbose {
        EnvFilter::new("datesync=debug,datesync_db=debug")
    } else if config.quiet {
        EnvFilter::new("warn")
    } else {
        env_filter
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// datesync home: `$DATESYNC_HOME`, else `~/.datesync`.
pub fn datesync_home() -> PathBuf {
    resolve_home(
        std::env::var_os(HOME_ENV).map(PathBuf::from),
        dirs::home_dir(),
    )
}

fn resolve_home(override_path: Option<PathBuf>, user_home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }
    user_home
        .map(|home| home.join(".datesync"))
        .unwrap_or_else(|| PathBuf::from(".datesync"))
}

/// `<home>/logs`
pub fn logs_dir() -> PathBuf {
    datesync_home().join("logs")
}

pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
