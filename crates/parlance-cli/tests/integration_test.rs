//! Integration tests for the parlance command line.

use clap::Parser;
use parlance_cli::{load_config, run, Cli, Command};
use parlance_common::test_utils::{create_temp_dir, locale_fixtures, write_locale_file};
use parlance_config::Config;
use serde_json::Value;
use std::path::Path;

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    config.locales.path = root.to_path_buf();
    config.locales.languages = vec!["en".to_string(), "zh-CN".to_string()];
    config
}

fn locales() -> tempfile::TempDir {
    let dir = create_temp_dir();
    write_locale_file(dir.path(), "en.json", locale_fixtures::english_json());
    write_locale_file(dir.path(), "zh-CN.json", locale_fixtures::simplified_chinese_json());
    dir
}

async fn run_args(args: &[&str], config: Config) -> (anyhow::Result<()>, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let result = run(&cli, config, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_parse_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "parlance",
        "translate",
        "zh-CN",
        "HELLO_USER",
        "-d",
        "name=Ada",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(
        cli.command,
        Command::Translate {
            language: "zh-CN".to_string(),
            id: "HELLO_USER".to_string(),
            data: vec!["name=Ada".to_string()],
            count: None,
        }
    );
}

#[test]
fn test_repeated_config_files_are_layered() {
    let dir = create_temp_dir();
    let shared = dir.path().join("shared.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(&shared, "default_language: ja\ncache:\n  max_entries: 40\n").unwrap();
    std::fs::write(&local, "cache:\n  max_entries: 80\n").unwrap();

    let cli = Cli::try_parse_from([
        "parlance",
        "stats",
        "--config",
        shared.to_str().unwrap(),
        "-c",
        local.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(cli.config, vec![shared.clone(), local.clone()]);

    let config = load_config(&cli).unwrap();
    assert_eq!(config.default_language, "ja");
    assert_eq!(config.cache.max_entries, 80);
}

#[test]
fn test_missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["parlance"]).is_err());
}

#[tokio::test]
async fn test_translate_command() {
    let dir = locales();
    let (result, out) = run_args(
        &["parlance", "translate", "zh-CN", "HELLO_USER", "--data", "name=Ada"],
        config_for(dir.path()),
    )
    .await;

    result.unwrap();
    assert_eq!(out.trim_end(), "你好，Ada！");
}

#[tokio::test]
async fn test_translate_plural_command() {
    let dir = locales();
    let (result, out) = run_args(
        &["parlance", "translate", "en", "UNREAD_MESSAGES", "--count", "1"],
        config_for(dir.path()),
    )
    .await;

    result.unwrap();
    assert_eq!(out.trim_end(), "You have 1 unread message");
}

#[tokio::test]
async fn test_check_reports_missing_translations() {
    let dir = locales();
    let (result, out) = run_args(&["parlance", "check"], config_for(dir.path())).await;

    result.unwrap();
    assert!(out.contains("zh-CN: 2 missing"));
    assert!(out.contains("  WELCOME"));
    assert!(out.contains("  USER_NOT_FOUND"));
}

#[tokio::test]
async fn test_check_reports_missing_files() {
    let dir = locales();
    let mut config = config_for(dir.path());
    config.locales.languages.push("fr".to_string());

    let (result, out) = run_args(&["parlance", "check"], config).await;

    result.unwrap();
    assert!(out.contains("missing file:"));
    assert!(out.contains("fr.json"));
}

#[tokio::test]
async fn test_codes_command_json() {
    let (result, out) = run_args(&["parlance", "codes", "--json"], Config::default()).await;

    result.unwrap();
    let codes: Value = serde_json::from_str(&out).unwrap();
    let codes = codes.as_array().unwrap();
    assert!(codes
        .iter()
        .any(|definition| definition["code"] == 0 && definition["message"] == "SUCCESS"));
}

#[tokio::test]
async fn test_codes_command_table() {
    let (result, out) = run_args(&["parlance", "codes"], Config::default()).await;

    result.unwrap();
    let header = out.lines().next().unwrap();
    assert!(header.contains("CODE"));
    assert!(out.contains("client_error"));
}

#[tokio::test]
async fn test_stats_command() {
    let dir = locales();
    let (result, out) = run_args(&["parlance", "stats"], config_for(dir.path())).await;

    result.unwrap();
    let report: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["service"]["num_locales"], 2);
    assert_eq!(report["files"]["total_files"], 2);
    assert_eq!(report["build"]["package"], "parlance-response");

    let languages = report["languages"].as_array().unwrap();
    assert!(languages
        .iter()
        .any(|l| l["code"] == "zh-CN" && l["name"] == "简体中文"));
}
