#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

//! 確認プロンプトのテスト
//!
//! 拒否されたテアダウンは、クラウド API に一切触れずに非ゼロ終了する。

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const VALID_ENV: &str = r#"
name "demo1"
region "us-east-1"
"#;

/// "no" と入力すると非ゼロ終了し、認証チェックまで進まないことを確認
#[test]
fn test_decline_exits_nonzero_before_any_cloud_call() {
    let project = TestProject::new();
    let config = project.write_env_kdl(VALID_ENV);

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg(&config)
        .write_stdin("no\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("キャンセルしました"))
        // 認証チェックのステップヘッダが出ていない = AWS を呼んでいない
        .stdout(predicate::str::contains("AWS 認証情報を確認中").not());
}

/// 空入力（EOF）も拒否として扱われることを確認
#[test]
fn test_empty_input_declines() {
    let project = TestProject::new();
    let config = project.write_env_kdl(VALID_ENV);

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("キャンセルしました"));
}

/// "yep" のような曖昧な入力も拒否として扱われることを確認
#[test]
fn test_ambiguous_input_declines() {
    let project = TestProject::new();
    let config = project.write_env_kdl(VALID_ENV);

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg(&config)
        .write_stdin("yep\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("キャンセルしました"));
}

/// プロンプトに環境・クラスタ名が表示されることを確認
#[test]
fn test_prompt_shows_target_environment() {
    let project = TestProject::new();
    let config = project.write_env_kdl(VALID_ENV);

    let mut cmd = Command::cargo_bin("unmoor").unwrap();
    cmd.arg("down")
        .arg("-c")
        .arg(&config)
        .write_stdin("n\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("demo1"))
        .stdout(predicate::str::contains("eks-demo-demo1-cluster"));
}
