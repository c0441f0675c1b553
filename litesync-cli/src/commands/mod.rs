//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `execute`: Execute a multi-statement script
//! - `run`: Run one statement with bound values
//! - `execute_set`: Run a list of statements in one transaction
//! - `query`: Run a read-only query and print the rows
//! - `tables`: List user tables
//! - `table_exists`: Check whether a table exists
//! - `version`: Print the stored schema version
//! - `export`: Export the database as JSON
//! - `import`: Import a JSON document
//! - `validate`: Validate a JSON document
//! - `sync_date`: Show or set the sync date
//! - `create_sync_table`: Create the sync bookkeeping table
//! - `delete_exported_rows`: Purge exported soft-deleted rows
//! - `delete`: Delete the database file
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod create_sync_table;
pub mod delete;
pub mod delete_exported_rows;
pub mod execute;
pub mod execute_set;
pub mod export;
pub mod import;
pub mod query;
pub mod run;
pub mod sync_date;
pub mod table_exists;
pub mod tables;
pub mod validate;
pub mod version;

pub use completions::CompletionsCommand;
pub use create_sync_table::CreateSyncTableCommand;
pub use delete::DeleteCommand;
pub use delete_exported_rows::DeleteExportedRowsCommand;
pub use execute::ExecuteCommand;
pub use execute_set::ExecuteSetCommand;
pub use export::ExportCommand;
pub use import::ImportCommand;
pub use query::QueryCommand;
pub use run::RunCommand;
pub use sync_date::SyncDateCommand;
pub use table_exists::TableExistsCommand;
pub use tables::TablesCommand;
pub use validate::ValidateCommand;
pub use version::VersionCommand;
