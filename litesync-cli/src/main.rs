//! Main entry point for the litesync CLI.
//!
//! This is the command-line interface over the litesync access layer. It
//! provides commands for working with one database file:
//! - `execute`, `run`, `execute-set`, `query`: Run statements
//! - `tables`, `table-exists`, `version`: Inspect the schema
//! - `export`, `import`, `validate`: Move data as JSON documents
//! - `sync-date`, `create-sync-table`, `delete-exported-rows`: Incremental sync

use clap::Parser;
use litesync_cli::cli::{Cli, Command};
use litesync_cli::utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Route library logging to stderr based on verbosity
    litesync::install_logger(cli.verbose, cli.quiet);

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        database: cli.database,
        data_dir: cli.data_dir,
        db_version: cli.db_version,
        upgrades: cli.upgrades,
        read_only: cli.read_only,
        encrypted: cli.encrypted,
        busy_timeout: cli.busy_timeout,
    };

    // Execute the command
    let result = match cli.command {
        Command::Execute(cmd) => cmd.execute(&global),
        Command::Run(cmd) => cmd.execute(&global),
        Command::ExecuteSet(cmd) => cmd.execute(&global),
        Command::Query(cmd) => cmd.execute(&global),
        Command::Tables(cmd) => cmd.execute(&global),
        Command::TableExists(cmd) => cmd.execute(&global),
        Command::Version(cmd) => cmd.execute(&global),
        Command::Export(cmd) => cmd.execute(&global),
        Command::Import(cmd) => cmd.execute(&global),
        Command::Validate(cmd) => cmd.execute(&global),
        Command::SyncDate(cmd) => cmd.execute(&global),
        Command::CreateSyncTable(cmd) => cmd.execute(&global),
        Command::DeleteExportedRows(cmd) => cmd.execute(&global),
        Command::Delete(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
