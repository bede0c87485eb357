//! `datesync history` and `datesync progress`: read-only ledger views.

use anyhow::Result;
use datesync::config::FileConfig;

use super::output::{format_size, print_json, print_table};
use super::{open_ledger_readonly, resolve_ledger, LedgerArgs};

pub struct HistoryArgs {
    pub ledger: LedgerArgs,
    pub limit: usize,
    pub json: bool,
}

pub fn run_history(args: HistoryArgs, file: &FileConfig) -> Result<()> {
    let config = resolve_ledger(&args.ledger, file)?;
    let ledger = open_ledger_readonly(&config)?;
    let records = ledger.history(args.limit)?;

    if args.json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No simulation dates processed yet.");
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.simulation_date.to_string(),
                r.total_folders_found.to_string(),
                r.folders_with_files.to_string(),
                r.folders_skipped.to_string(),
                r.total_files_transferred.to_string(),
                format!("{:.2}", r.megabytes()),
                r.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
                r.status.to_string(),
            ]
        })
        .collect();
    print_table(
        &[
            "DATE", "FOLDERS", "WITH FILES", "SKIPPED", "FILES", "MB", "UPDATED", "STATUS",
        ],
        rows,
    );
    println!("{} of the most recent dates shown (ledger: {})", records.len(), ledger.location());
    Ok(())
}

pub struct ProgressArgs {
    pub ledger: LedgerArgs,
    pub json: bool,
}

pub fn run_progress(args: ProgressArgs, file: &FileConfig) -> Result<()> {
    let config = resolve_ledger(&args.ledger, file)?;
    let ledger = open_ledger_readonly(&config)?;
    let progress = ledger.progress()?;

    if args.json {
        return print_json(&progress);
    }

    let date_or_dash = |d: Option<datesync::sync::SimulationDate>| {
        d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    };
    let avg_or_dash = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string());

    println!("Simulation progress ({})", config.qualified_table());
    println!("  Dates processed:        {}", progress.dates_processed);
    println!("  First date:             {}", date_or_dash(progress.first_date));
    println!("  Latest date:            {}", date_or_dash(progress.latest_date));
    println!("  Files transferred:      {}", progress.total_files);
    println!(
        "  Bytes transferred:      {} ({})",
        progress.total_bytes,
        format_size(progress.total_bytes)
    );
    println!("  Avg folders with files: {}", avg_or_dash(progress.avg_folders_with_files));
    println!("  Avg folders skipped:    {}", avg_or_dash(progress.avg_folders_skipped));
    println!(
        "  Runs:                   {} success, {} partial, {} failed",
        progress.successful_runs, progress.partial_runs, progress.failed_runs
    );
    Ok(())
}
