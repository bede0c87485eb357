//! `datesync run`: process one simulation date.

use anyhow::Result;
use datesync::checkpoint::DuckDbLedger;
use datesync::config::{ConfigOverrides, FileConfig};
use datesync::store::LocalStore;
use datesync::sync::{parse_override, render_report, RunReport, RunStatus, SyncEngine};
use std::path::PathBuf;
use tracing::info;

use super::error::{HelpfulError, ReportedFailure};
use super::output::print_json;
use super::LedgerArgs;

pub struct RunArgs {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub ledger: LedgerArgs,
    pub restart: bool,
    pub date: Option<String>,
    pub json: bool,
}

pub fn run(args: RunArgs, file: &FileConfig) -> Result<()> {
    // Malformed overrides fail before any discovery or ledger work
    let date_override = match parse_override(args.date.as_deref()) {
        Ok(date) => date,
        Err(_) => {
            return Err(HelpfulError::invalid_date(args.date.as_deref().unwrap_or_default()).into())
        }
    };

    let overrides = ConfigOverrides {
        source: args.source,
        target: args.target,
        ..args.ledger.overrides()
    };
    let config = overrides
        .resolve(file, &datesync_logging::datesync_home())
        .map_err(|e| HelpfulError::from_config(&e))?;
    info!(
        source = %config.source_root.display(),
        target = %config.target_root.display(),
        ledger = %config.ledger.path.display(),
        restart = args.restart,
        "Starting sync run"
    );

    let ledger = DuckDbLedger::open(&config.ledger, args.restart)
        .map_err(|e| HelpfulError::from_ledger(&e, &config.ledger.path))?;
    let engine = SyncEngine::new(&LocalStore, &ledger, &config.source_root, &config.target_root);
    let report = engine
        .run(date_override)
        .map_err(|e| HelpfulError::from_sync(&e, &config.ledger.path))?;

    if args.json {
        print_json(&report)?;
    } else {
        print!("{}", render_report(&report));
    }

    match &report {
        RunReport::NoFolders {
            unreadable: Some(reason),
        } => {
            if args.json {
                Err(ReportedFailure(format!("Cannot list source root: {}", reason)).into())
            } else {
                Err(HelpfulError::source_unreadable(&config.source_root, reason).into())
            }
        }
        RunReport::Processed(summary) if summary.status() == RunStatus::Failed => {
            let err = HelpfulError::run_failed(summary.record.simulation_date, summary.files_failed);
            if args.json {
                Err(ReportedFailure(err.message).into())
            } else {
                Err(err.into())
            }
        }
        _ => Ok(()),
    }
}
