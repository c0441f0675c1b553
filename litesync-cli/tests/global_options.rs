//! Integration tests for global options, exit codes and the file-level
//! commands (`delete`, `completions`).

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_missing_database_exits_3() {
    let env = TestEnv::new();
    env.command_bare()
        .arg("--data-dir")
        .arg(&env.data_dir)
        .arg("tables")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("No database given"));
}

#[test]
fn test_database_from_environment() {
    let env = TestEnv::new();
    env.command_bare()
        .env("LITESYNC_DATA_DIR", &env.data_dir)
        .env("LITESYNC_DATABASE", common::DB_NAME)
        .args(["execute", "CREATE TABLE t (id INTEGER);"])
        .assert()
        .success();

    assert!(env.db_path().exists());
}

#[test]
fn test_read_only_rejects_writes() {
    let env = TestEnv::new();
    env.execute("CREATE TABLE t (id INTEGER);");

    env.command()
        .args(["--read-only", "execute", "INSERT INTO t VALUES (1);"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));

    env.command()
        .args(["--read-only", "tables"])
        .assert()
        .success()
        .stdout("t\n");
}

#[test]
fn test_read_only_missing_file_fails() {
    let env = TestEnv::new();
    env.command()
        .args(["--read-only", "tables"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Open:"));
    assert!(!env.db_path().exists());
}

#[test]
fn test_bad_upgrade_file_is_config_error() {
    let env = TestEnv::new();
    let upgrades = env.path().join("upgrades.yaml");
    std::fs::write(&upgrades, "upgrades: [not, a, list, of, steps]").unwrap();

    env.command()
        .arg("--upgrades")
        .arg(&upgrades)
        .arg("tables")
        .assert()
        .failure()
        .code(7);
}

#[test]
fn test_delete_requires_force() {
    let env = TestEnv::new();
    env.execute("CREATE TABLE t (id INTEGER);");

    env.command()
        .arg("delete")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("--force"));
    assert!(env.db_path().exists());

    env.command()
        .args(["delete", "--force"])
        .assert()
        .success();
    assert!(!env.db_path().exists());
}

#[test]
fn test_quiet_suppresses_notices() {
    let env = TestEnv::new();
    env.execute("CREATE TABLE t (id INTEGER);");

    env.command()
        .args(["--quiet", "delete", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_completions_generate_script() {
    let env = TestEnv::new();
    env.command_bare()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("litesync"));
}

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();
    env.command_bare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("execute-set"))
        .stdout(predicate::str::contains("delete-exported-rows"));
}
