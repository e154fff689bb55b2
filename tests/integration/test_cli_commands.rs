//! Binary-level tests for commands that never load the embedding model.

use crate::common::{SAMPLE_CSV, TestWorkspace};
use std::path::Path;
use std::process::{Command, Output};

fn labelseek(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_labelseek"))
        .args(args)
        .current_dir(workspace)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run labelseek")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn test_init_writes_settings_once() {
    let workspace = TestWorkspace::new();

    let first = labelseek(workspace.path(), &["init"]);
    assert!(first.status.success(), "{first:?}");
    assert!(workspace.path().join(".labelseek/settings.toml").is_file());

    let second = labelseek(workspace.path(), &["init"]);
    assert_eq!(second.status.code(), Some(1));

    let forced = labelseek(workspace.path(), &["init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn test_config_shows_cli_overrides() {
    let workspace = TestWorkspace::new();
    labelseek(workspace.path(), &["init"]);

    let output = labelseek(
        workspace.path(),
        &["config", "--model", "bge-small-en-v1.5"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[semantic_search]"));
    assert!(stdout.contains("bge-small-en-v1.5"));
    assert!(stdout.contains("label_column = \"label\""));
}

#[test]
fn test_domains_json() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);

    let output = labelseek(workspace.path(), &["domains", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    assert_eq!(json["status"], "success");
    let domains = json["data"].as_array().unwrap();
    assert_eq!(domains.len(), 3);
    assert_eq!(domains[0]["domain"], "lifestyle");
    assert_eq!(domains[0]["labels"], 3);
    assert_eq!(domains[2]["domain"], "imaging");
}

#[test]
fn test_domains_with_explicit_data_path() {
    let workspace = TestWorkspace::new();
    workspace.write("survey.csv", "label,domain\nWeight,body\nHeight,body\n");

    let output = labelseek(
        workspace.path(),
        &["domains", "--json", "--data", "survey.csv"],
    );
    assert!(output.status.success(), "{output:?}");
    let json = stdout_json(&output);
    assert_eq!(json["data"][0]["domain"], "body");
    assert_eq!(json["data"][0]["labels"], 2);
}

#[test]
fn test_missing_data_exits_with_io_code() {
    let workspace = TestWorkspace::new();

    let output = labelseek(workspace.path(), &["domains", "--json"]);
    assert_eq!(output.status.code(), Some(5));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "DATA_NOT_FOUND");
    assert!(!json["error"]["suggestions"].as_array().unwrap().is_empty());
}

#[test]
fn test_blank_query_returns_empty_without_model() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);

    let output = labelseek(workspace.path(), &["search", "   ", "--json"]);
    assert_eq!(output.status.code(), Some(3));

    let json = stdout_json(&output);
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["data"]["hits"].as_array().unwrap().is_empty());
    // Nothing was embedded, so no cache was written
    assert!(!workspace.path().join(".labelseek/cache").exists());
}

#[test]
fn test_blank_query_with_unknown_model_is_config_error() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);

    let output = labelseek(
        workspace.path(),
        &["search", "  ", "--model", "word2vec", "--json"],
    );
    assert_eq!(output.status.code(), Some(6));

    let json = stdout_json(&output);
    assert_eq!(json["code"], "UNSUPPORTED_MODEL");
}

#[test]
fn test_blank_query_with_missing_data_is_io_error() {
    let workspace = TestWorkspace::new();

    let output = labelseek(
        workspace.path(),
        &["search", "", "--data", "missing.csv", "--json"],
    );
    assert_eq!(output.status.code(), Some(5));

    let json = stdout_json(&output);
    assert_eq!(json["code"], "DATA_NOT_FOUND");
}

#[test]
fn test_unknown_model_is_config_error() {
    let workspace = TestWorkspace::with_csv(SAMPLE_CSV);

    let output = labelseek(
        workspace.path(),
        &["search", "sleep", "--model", "word2vec", "--json"],
    );
    assert_eq!(output.status.code(), Some(6));

    let json = stdout_json(&output);
    assert_eq!(json["code"], "UNSUPPORTED_MODEL");
    assert!(json["message"].as_str().unwrap().contains("all-MiniLM-L6-v2"));
}
