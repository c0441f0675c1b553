//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, CreateSyncTableCommand, DeleteCommand, DeleteExportedRowsCommand,
    ExecuteCommand, ExecuteSetCommand, ExportCommand, ImportCommand, QueryCommand, RunCommand,
    SyncDateCommand, TableExistsCommand, TablesCommand, ValidateCommand, VersionCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for working with litesync databases.
#[derive(Parser)]
#[command(name = "litesync")]
#[command(version, about = "Transactional SQLite access with JSON sync", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Database name (resolved under the data directory) or file path
    #[arg(long, short = 'd', value_name = "NAME", global = true, env = "LITESYNC_DATABASE")]
    pub database: Option<String>,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "LITESYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Schema version expected after open
    #[arg(long, value_name = "VERSION", global = true, env = "LITESYNC_DB_VERSION")]
    pub db_version: Option<i32>,

    /// YAML file with per-version upgrade statements
    #[arg(long, value_name = "PATH", global = true, env = "LITESYNC_UPGRADES")]
    pub upgrades: Option<PathBuf>,

    /// Open the database read-only
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Allow encoded exports for this database
    #[arg(long, global = true)]
    pub encrypted: bool,

    /// Override the default busy timeout (in seconds)
    #[arg(long, value_name = "SECONDS", global = true, env = "LITESYNC_BUSY_TIMEOUT")]
    pub busy_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Execute a multi-statement SQL script
    Execute(ExecuteCommand),

    /// Run one statement with bound values
    Run(RunCommand),

    /// Run a JSON list of statements in one transaction
    ExecuteSet(ExecuteSetCommand),

    /// Run a read-only query and print the rows
    Query(QueryCommand),

    /// List user tables
    Tables(TablesCommand),

    /// Check whether a table exists
    TableExists(TableExistsCommand),

    /// Print the stored schema version
    Version(VersionCommand),

    /// Export the database as a JSON document
    Export(ExportCommand),

    /// Import a JSON document into the database
    Import(ImportCommand),

    /// Validate a JSON document without opening a database
    Validate(ValidateCommand),

    /// Show or set the sync date
    SyncDate(SyncDateCommand),

    /// Create the sync bookkeeping table
    CreateSyncTable(CreateSyncTableCommand),

    /// Purge soft-deleted rows already exported
    DeleteExportedRows(DeleteExportedRowsCommand),

    /// Delete the database file
    Delete(DeleteCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
