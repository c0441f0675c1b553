//! Create-sync-table command implementation.

use crate::error::CliError;
use crate::utils::{open_database, print_json, GlobalOptions};
use clap::Args;

/// Create the sync bookkeeping table.
#[derive(Args)]
pub struct CreateSyncTableCommand {}

impl CreateSyncTableCommand {
    /// Execute the create-sync-table command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut db = open_database(global)?;
        let changes = db.create_sync_table()?;
        print_json(&serde_json::json!({ "changes": changes }))
    }
}
