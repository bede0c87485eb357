//! `datesync config`: show the resolved configuration.

use anyhow::Result;
use datesync::config::FileConfig;
use std::path::{Path, PathBuf};

use super::output::print_json;
use super::{resolve_ledger, LedgerArgs};

pub struct ConfigArgs {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub ledger: LedgerArgs,
    pub config_file: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: ConfigArgs, file: &FileConfig) -> Result<()> {
    let home = datesync_logging::datesync_home();
    let logs = datesync_logging::logs_dir();
    let ledger = resolve_ledger(&args.ledger, file)?;
    let source = args.source.or_else(|| file.source.clone());
    let target = args.target.or_else(|| file.target.clone());

    if args.json {
        let path_info = |p: &Path| {
            serde_json::json!({
                "path": p.display().to_string(),
                "exists": p.exists(),
            })
        };
        let optional = |p: &Option<PathBuf>| match p {
            Some(p) => path_info(p.as_path()),
            None => serde_json::Value::Null,
        };
        return print_json(&serde_json::json!({
            "home": path_info(home.as_path()),
            "logs": path_info(logs.as_path()),
            "config_file": optional(&args.config_file),
            "source": optional(&source),
            "target": optional(&target),
            "ledger": {
                "path": ledger.path.display().to_string(),
                "exists": ledger.path.exists(),
                "schema": ledger.schema,
                "table": ledger.table,
            },
        }));
    }

    let show = |label: &str, p: Option<&Path>| match p {
        Some(p) => println!(
            "  {:<12}{} {}",
            label,
            p.display(),
            if p.exists() { "" } else { "(missing)" }
        ),
        None => println!("  {:<12}(not set)", label),
    };

    println!("datesync configuration");
    show("Home:", Some(home.as_path()));
    show("Logs:", Some(logs.as_path()));
    show("Config:", args.config_file.as_deref());
    show("Source:", source.as_deref());
    show("Target:", target.as_deref());
    show("Ledger:", Some(ledger.path.as_path()));
    println!("  {:<12}{}", "Table:", ledger.qualified_table());
    Ok(())
}
