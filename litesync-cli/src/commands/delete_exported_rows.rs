//! Delete-exported-rows command implementation.

use crate::error::CliError;
use crate::utils::{open_database, print_json, GlobalOptions};
use clap::Args;

/// Purge soft-deleted rows that were already exported.
#[derive(Args)]
pub struct DeleteExportedRowsCommand {}

impl DeleteExportedRowsCommand {
    /// Execute the delete-exported-rows command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut db = open_database(global)?;
        let changes = db.delete_exported_rows()?;
        print_json(&serde_json::json!({ "changes": changes }))
    }
}
