//! Basic smoke tests for the tt binary.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_help_runs() {
    let env = TestEnv::new();
    env.tt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let env = TestEnv::new();
    env.tt().arg("frobnicate").assert().failure();
}

#[test]
fn test_missing_required_args_fail() {
    let env = TestEnv::new();
    env.tt().arg("set").assert().failure();
    env.tt().args(["set", "editor.tabSize"]).assert().failure();
}
