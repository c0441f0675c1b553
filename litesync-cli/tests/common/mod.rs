//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing:
//! - Test environment setup with temporary directories
//! - Command builders with the database pre-selected
//! - Helpers for writing input documents and parsing JSON output

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the database used by [`TestEnv::command`].
#[allow(dead_code)]
pub const DB_NAME: &str = "notes";

/// Test environment with an isolated data directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the litesync data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let data_dir = temp_path.join("litesync-data");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        Self {
            temp_dir,
            temp_path,
            data_dir,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// Environment variables that would select a database are cleared so the
    /// host environment cannot leak into tests.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("litesync").expect("Failed to find litesync binary");
        cmd.env_remove("LITESYNC_DATABASE")
            .env_remove("LITESYNC_DATA_DIR")
            .env_remove("LITESYNC_DB_VERSION")
            .env_remove("LITESYNC_UPGRADES")
            .env_remove("LITESYNC_OUTPUT_FORMAT")
            .env_remove("LITESYNC_LOG_MODE");
        cmd
    }

    /// Get a command builder with the data directory and database selected.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir")
            .arg(&self.data_dir)
            .arg("--database")
            .arg(DB_NAME);
        cmd
    }

    /// Path of the database file used by [`TestEnv::command`].
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{DB_NAME}SQLite.db"))
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Run a script through `execute`, asserting success.
    pub fn execute(&self, sql: &str) {
        self.command().arg("execute").arg(sql).assert().success();
    }

    /// Run a command and parse its stdout as JSON, asserting success.
    pub fn json_output(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to run litesync");
        assert!(
            output.status.success(),
            "command {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }
}

/// Schema with sync columns on every table.
#[allow(dead_code)]
pub const SYNC_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    body TEXT,
    sql_deleted BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1)),
    last_modified INTEGER DEFAULT (strftime('%s', 'now'))
);
";

/// A small full export document with one table.
#[allow(dead_code)]
pub const FULL_DOCUMENT: &str = r#"{
  "database": "notes",
  "version": 1,
  "encrypted": false,
  "mode": "full",
  "tables": [
    {
      "name": "notes",
      "schema": [
        {"column": "id", "value": "INTEGER PRIMARY KEY NOT NULL"},
        {"column": "title", "value": "TEXT NOT NULL"},
        {"column": "body", "value": "TEXT"},
        {"column": "sql_deleted", "value": "BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1))"},
        {"column": "last_modified", "value": "INTEGER DEFAULT (strftime('%s', 'now'))"}
      ],
      "values": [
        [1, "first", "hello", 0, 1700000000],
        [2, "second", null, 0, 1700000000]
      ]
    }
  ]
}"#;
