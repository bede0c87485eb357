#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn datesync_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_datesync"))
}

pub fn run_cli(args: &[String], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(datesync_bin());
    cmd.args(args);
    for key in [
        "DATESYNC_SOURCE",
        "DATESYNC_TARGET",
        "DATESYNC_LEDGER",
        "DATESYNC_LEDGER_SCHEMA",
        "DATESYNC_CONFIG",
    ] {
        cmd.env_remove(key);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute datesync CLI")
}

pub fn assert_cli_success(output: &Output, args: &[String]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn parse_json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find(|c| c == '{' || c == '[').unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn run_cli_json_value(args: &[String], envs: &[(&str, &str)]) -> serde_json::Value {
    let output = run_cli(args, envs);
    assert_cli_success(&output, args);
    parse_json_stdout(&output)
}

pub fn run_cli_json<T: DeserializeOwned>(args: &[String], envs: &[(&str, &str)]) -> T {
    let value = run_cli_json_value(args, envs);
    serde_json::from_value(value).expect("failed to deserialize JSON output")
}

pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
