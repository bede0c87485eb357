mod cli_support;

use cli_support::{
    args, assert_cli_success, parse_json_stdout, path_arg, run_cli, run_cli_json,
    run_cli_json_value,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct HistoryRow {
    simulation_date: String,
    total_folders_found: u32,
    folders_with_files: u32,
    folders_skipped: u32,
    total_files_transferred: u64,
    total_bytes_transferred: u64,
    status: String,
}

#[derive(Debug, Deserialize)]
struct Progress {
    dates_processed: u64,
    first_date: Option<String>,
    latest_date: Option<String>,
    total_files: u64,
    successful_runs: u64,
}

struct Fixture {
    home: TempDir,
    data: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            home: TempDir::new().expect("create temp home"),
            data: TempDir::new().expect("create data dir"),
        };
        let src = fixture.source();
        write(&src.join("A").join("2024-01-01_a.csv"), "id\n1\n");
        write(&src.join("A").join("2024-01-02_a.csv"), "id\n2\n");
        write(&src.join("B").join("2024-01-01").join("part-0.csv"), "x\n");
        fixture
    }

    fn source(&self) -> std::path::PathBuf {
        self.data.path().join("source")
    }

    fn target(&self) -> std::path::PathBuf {
        self.data.path().join("target")
    }

    fn home_str(&self) -> String {
        path_arg(self.home.path())
    }

    fn run_args(&self, extra: &[&str]) -> Vec<String> {
        let mut parts = vec![
            "run".to_string(),
            "--source".to_string(),
            path_arg(&self.source()),
            "--target".to_string(),
            path_arg(&self.target()),
        ];
        parts.extend(args(extra));
        parts
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_run_history_progress_json() {
    let fx = Fixture::new();
    let home = fx.home_str();
    let envs = [("DATESYNC_HOME", home.as_str()), ("RUST_LOG", "error")];

    let first = run_cli_json_value(&fx.run_args(&["--json"]), &envs);
    assert_eq!(first["result"], "processed");
    assert_eq!(first["record"]["simulation_date"], "2024-01-01");
    assert_eq!(first["record"]["folders_with_files"], 2);
    assert_eq!(first["record"]["status"], "success");
    assert!(fx.target().join("B").join("2024-01-01").join("part-0.csv").exists());
    assert!(fx.home.path().join("ledger.duckdb").exists());

    let second = run_cli_json_value(&fx.run_args(&["--json"]), &envs);
    assert_eq!(second["record"]["simulation_date"], "2024-01-02");
    assert_eq!(second["record"]["folders_skipped"], 1);

    let third = run_cli_json_value(&fx.run_args(&["--json"]), &envs);
    assert_eq!(third["result"], "up_to_date");
    assert_eq!(third["last_processed"], "2024-01-02");

    let history: Vec<HistoryRow> = run_cli_json(&args(&["history", "--json"]), &envs);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].simulation_date, "2024-01-02");
    assert_eq!(history[0].total_folders_found, 2);
    assert_eq!(history[0].folders_with_files, 1);
    assert_eq!(history[0].folders_skipped, 1);
    assert_eq!(history[0].total_files_transferred, 1);
    assert_eq!(history[0].total_bytes_transferred, 5);
    assert_eq!(history[1].status, "success");

    let limited: Vec<HistoryRow> =
        run_cli_json(&args(&["history", "--limit", "1", "--json"]), &envs);
    assert_eq!(limited.len(), 1);

    let progress: Progress = run_cli_json(&args(&["progress", "--json"]), &envs);
    assert_eq!(progress.dates_processed, 2);
    assert_eq!(progress.first_date.as_deref(), Some("2024-01-01"));
    assert_eq!(progress.latest_date.as_deref(), Some("2024-01-02"));
    assert_eq!(progress.total_files, 3);
    assert_eq!(progress.successful_runs, 2);
}

#[test]
fn test_malformed_date_fails_before_any_work() {
    let fx = Fixture::new();
    let home = fx.home_str();
    let envs = [("DATESYNC_HOME", home.as_str()), ("RUST_LOG", "error")];

    let run_args = fx.run_args(&["--date", "2024-1-5", "--json"]);
    let output = run_cli(&run_args, &envs);
    assert!(!output.status.success());
    let error = parse_json_stdout(&output);
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Invalid simulation date"));
    assert!(!fx.target().exists());
    assert!(!fx.home.path().join("ledger.duckdb").exists());
}

#[test]
fn test_override_rerun_requires_reset() {
    let fx = Fixture::new();
    let home = fx.home_str();
    let envs = [("DATESYNC_HOME", home.as_str()), ("RUST_LOG", "error")];

    let run_args = fx.run_args(&["--date", "2024-01-02"]);
    assert_cli_success(&run_cli(&run_args, &envs), &run_args);

    let again = run_cli(&run_args, &envs);
    assert!(!again.status.success());
    let stderr = String::from_utf8_lossy(&again.stderr);
    assert!(stderr.contains("already been processed"), "stderr: {}", stderr);
    assert!(stderr.contains("datesync reset --date 2024-01-02"));

    let reset = run_cli_json_value(&args(&["reset", "--date", "2024-01-02", "--json"]), &envs);
    assert_eq!(reset["deleted"], true);
    assert_cli_success(&run_cli(&run_args, &envs), &run_args);
}

#[test]
fn test_missing_target_is_a_helpful_error() {
    let fx = Fixture::new();
    let home = fx.home_str();
    let envs = [("DATESYNC_HOME", home.as_str()), ("RUST_LOG", "error")];

    let run_args = args(&["run", "--source", &path_arg(&fx.source())]);
    let output = run_cli(&run_args, &envs);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Missing required setting: target"));
    assert!(stderr.contains("TRY:"));
}

#[test]
fn test_config_file_and_env_resolution() {
    let fx = Fixture::new();
    let home = fx.home_str();
    let config_path = fx.home.path().join("datesync.toml");
    fs::write(
        &config_path,
        format!(
            "source = {:?}\ntarget = {:?}\n\n[ledger]\nschema = \"tracking\"\n",
            path_arg(&fx.source()),
            path_arg(&fx.target())
        ),
    )
    .unwrap();
    let config_arg = path_arg(&config_path);
    let custom_ledger = path_arg(&fx.home.path().join("custom").join("ledger.duckdb"));
    let envs = [
        ("DATESYNC_HOME", home.as_str()),
        ("DATESYNC_LEDGER", custom_ledger.as_str()),
        ("RUST_LOG", "error"),
    ];

    let shown = run_cli_json_value(&args(&["--config", &config_arg, "config", "--json"]), &envs);
    assert_eq!(shown["source"]["path"], path_arg(&fx.source()));
    assert_eq!(shown["source"]["exists"], true);
    assert_eq!(shown["ledger"]["path"], custom_ledger);
    assert_eq!(shown["ledger"]["schema"], "tracking");
    assert_eq!(shown["ledger"]["table"], "file_transfer_tracker");

    let run_args = args(&["--config", &config_arg, "run", "--json"]);
    let report = run_cli_json_value(&run_args, &envs);
    assert_eq!(report["record"]["simulation_date"], "2024-01-01");
    assert!(Path::new(&custom_ledger).exists());
}

#[test]
fn test_history_without_ledger_suggests_running() {
    let home = TempDir::new().unwrap();
    let home_str = path_arg(home.path());
    let envs = [("DATESYNC_HOME", home_str.as_str()), ("RUST_LOG", "error")];

    let output = run_cli(&args(&["history"]), &envs);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ledger not found"));
    assert!(stderr.contains("datesync run"));
}
