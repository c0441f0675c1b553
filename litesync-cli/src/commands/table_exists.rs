//! Table-exists command implementation.
//!
//! Prints `true` or `false`; a missing table also exits with status 1 so the
//! command can be used in shell conditionals.

use crate::error::CliError;
use crate::utils::{open_database, GlobalOptions};
use clap::Args;

/// Check whether a table exists.
#[derive(Args)]
pub struct TableExistsCommand {
    /// Table name
    #[arg(value_name = "TABLE")]
    pub table: String,
}

impl TableExistsCommand {
    /// Execute the table-exists command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let db = open_database(global)?;
        let exists = db.is_table_exists(&self.table)?;
        println!("{exists}");
        if exists {
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "Table {} does not exist",
                self.table
            )))
        }
    }
}
