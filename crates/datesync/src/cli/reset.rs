//! `datesync reset`: delete one checkpoint record so the date can be re-run.

use anyhow::Result;
use datesync::checkpoint::DuckDbLedger;
use datesync::config::FileConfig;
use datesync::sync::SimulationDate;

use super::error::HelpfulError;
use super::output::print_json;
use super::{resolve_ledger, LedgerArgs};

pub struct ResetArgs {
    pub ledger: LedgerArgs,
    pub date: String,
    pub json: bool,
}

pub fn run(args: ResetArgs, file: &FileConfig) -> Result<()> {
    let date: SimulationDate = args
        .date
        .parse()
        .map_err(|_| HelpfulError::invalid_date(&args.date))?;
    let config = resolve_ledger(&args.ledger, file)?;
    if !config.path.exists() {
        return Err(HelpfulError::ledger_not_found(&config.path).into());
    }

    let ledger = DuckDbLedger::open(&config, false)
        .map_err(|e| HelpfulError::from_ledger(&e, &config.path))?;
    let deleted = ledger.reset_date(date)?;

    if args.json {
        return print_json(&serde_json::json!({
            "date": date,
            "deleted": deleted,
        }));
    }

    if deleted {
        println!("Reset checkpoint for {}; the next run can process it again.", date);
    } else {
        println!("No checkpoint recorded for {}; nothing to reset.", date);
    }
    Ok(())
}
