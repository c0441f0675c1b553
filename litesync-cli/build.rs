//! Build script for litesync-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("litesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Transactional SQLite access with JSON sync")
        .long_about(
            "Command-line tool for executing statements against SQLite databases, \
             upgrading them between schema versions, and exporting or importing them as JSON",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .short('d')
                .help("Database name (resolved under the data directory) or file path")
                .value_name("NAME")
                .global(true)
                .env("LITESYNC_DATABASE"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("LITESYNC_DATA_DIR"),
        )
        .arg(
            Arg::new("db-version")
                .long("db-version")
                .help("Schema version expected after open")
                .value_name("VERSION")
                .global(true)
                .env("LITESYNC_DB_VERSION"),
        )
        .arg(
            Arg::new("upgrades")
                .long("upgrades")
                .help("YAML file with per-version upgrade statements")
                .value_name("PATH")
                .global(true)
                .env("LITESYNC_UPGRADES"),
        )
        .arg(
            Arg::new("read-only")
                .long("read-only")
                .help("Open the database read-only")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("encrypted")
                .long("encrypted")
                .help("Allow encoded exports for this database")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the default busy timeout (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("LITESYNC_BUSY_TIMEOUT"),
        )
        .subcommands(vec![
            Command::new("execute")
                .about("Execute a multi-statement SQL script")
                .long_about("Execute a script, inside one transaction unless --no-transaction"),
            Command::new("run")
                .about("Run one statement with bound values")
                .long_about("Run one statement and print changes, lastId and returned rows"),
            Command::new("execute-set")
                .about("Run a JSON list of statements in one transaction")
                .long_about("Run [{statement, values}] items in order as one transaction"),
            Command::new("query")
                .about("Run a read-only query and print the rows")
                .long_about("Print query rows as JSON, CSV or a tab-separated table"),
            Command::new("tables")
                .about("List user tables")
                .long_about("List user tables in creation order"),
            Command::new("table-exists")
                .about("Check whether a table exists")
                .long_about("Print true or false; exit with status 1 when the table is missing"),
            Command::new("version")
                .about("Print the stored schema version")
                .long_about("Print the schema version stored in the database file"),
            Command::new("export")
                .about("Export the database as a JSON document")
                .long_about("Export everything (full) or changes since the sync date (partial)"),
            Command::new("import")
                .about("Import a JSON document into the database")
                .long_about("Import a full or partial document in one transaction"),
            Command::new("validate")
                .about("Validate a JSON document without opening a database")
                .long_about("Check the shape of an export document and report the first problem"),
            Command::new("sync-date")
                .about("Show or set the sync date")
                .long_about("Show the sync date, or set it from an ISO-8601 timestamp"),
            Command::new("create-sync-table")
                .about("Create the sync bookkeeping table")
                .long_about("Create sync_table when every table carries the sync columns"),
            Command::new("delete-exported-rows")
                .about("Purge soft-deleted rows already exported")
                .long_about("Physically delete soft-deleted rows older than the last export"),
            Command::new("delete")
                .about("Delete the database file")
                .long_about("Remove the database file; requires --force"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    // Generate main litesync.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("litesync.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
