//! Tables command implementation.

use crate::error::CliError;
use crate::utils::{open_database, GlobalOptions};
use clap::Args;

/// List user tables, one per line.
#[derive(Args)]
pub struct TablesCommand {}

impl TablesCommand {
    /// Execute the tables command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let db = open_database(global)?;
        for table in db.get_table_list()? {
            println!("{table}");
        }
        Ok(())
    }
}
