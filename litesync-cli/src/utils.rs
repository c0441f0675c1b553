//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including database resolution, input reading and output writing.

use crate::error::CliError;
use litesync::database::{resolve_data_dir, DatabaseConfig, UpgradeMap};
use litesync::{Database, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Database name or file path.
    pub database: Option<String>,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Schema version expected after open.
    pub db_version: Option<i32>,

    /// YAML upgrade file.
    pub upgrades: Option<PathBuf>,

    /// Open the database read-only.
    pub read_only: bool,

    /// Allow encoded exports.
    pub encrypted: bool,

    /// Override the default busy timeout (in seconds).
    pub busy_timeout: Option<u64>,
}

/// Build the database configuration from global options.
///
/// Names are resolved under the data directory (`--data-dir`, then
/// `LITESYNC_DATA_DIR`, then `~/.litesync`).
pub fn database_config(global: &GlobalOptions) -> Result<DatabaseConfig, CliError> {
    let name = global.database.as_deref().ok_or(CliError::NoDatabase)?;
    if name.trim().is_empty() {
        return Err(CliError::InvalidArguments("database name cannot be empty".into()));
    }

    let data_dir = match &global.data_dir {
        Some(dir) => dir.clone(),
        None => resolve_data_dir().map_err(|e| CliError::Config(e.to_string()))?,
    };
    let mut config = DatabaseConfig::for_name(data_dir, name);

    if let Some(version) = global.db_version {
        config = config.with_version(version);
    }
    if let Some(path) = &global.upgrades {
        config = config.with_upgrades(UpgradeMap::from_yaml_file(path)?);
    }
    if let Some(seconds) = global.busy_timeout {
        config = config.with_busy_timeout(Duration::from_secs(seconds));
    }
    if global.read_only {
        config = config.read_only();
    }
    if global.encrypted {
        config = config.encrypted();
    }
    Ok(config)
}

/// Open the database named by the global options.
pub fn open_database(global: &GlobalOptions) -> Result<Database, CliError> {
    let config = database_config(global)?;
    Database::connect(config).map_err(CliError::from)
}

/// Read text from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        Ok(contents)
    } else {
        fs::read_to_string(path).map_err(|e| {
            CliError::InvalidArguments(format!("cannot read {}: {e}", path.display()))
        })
    }
}

/// Write text to a file, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            fs::write(path, contents)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{contents}")?;
        }
    }
    Ok(())
}

/// Parse bound values given as a JSON array.
pub fn parse_values(json: Option<&str>) -> Result<Vec<Value>, CliError> {
    match json {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| CliError::InvalidArguments(format!("--values must be a JSON array: {e}"))),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    Ok(())
}
