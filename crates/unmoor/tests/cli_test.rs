#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("順番どおりに畳む"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("check"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("unmoor"));
}

/// downコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_down_help() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--karpenter"))
        .stdout(predicate::str::contains("--yes"));
}

/// checkコマンドのヘルプが正しく表示されることを確認
#[test]
fn test_check_help() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("check")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// 設定ファイル未指定でdownを実行するとエラーになることを確認
#[test]
fn test_down_without_config() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.env_remove("UNMOOR_CONFIG").arg("down").assert().failure();
}

/// 存在しない設定ファイルでエラーになることを確認
#[test]
fn test_down_missing_config_file() {
    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg("/nonexistent/env.kdl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("environment file not found"));
}

/// region欠落の設定ファイルでエラーになることを確認
#[test]
fn test_down_config_missing_region() {
    let project = TestProject::new();
    let config = project.write_env_kdl(r#"name "demo1""#);

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("region"));
}

/// KDLとして壊れた設定ファイルでエラーになることを確認
#[test]
fn test_down_malformed_config() {
    let project = TestProject::new();
    let config = project.write_env_kdl("name \"demo1\nregion");

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down").arg("-c").arg(&config).assert().failure();
}
