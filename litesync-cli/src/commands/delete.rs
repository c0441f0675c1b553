//! Delete command implementation.
//!
//! Removes the database file. The file is not opened first, so a database
//! that fails to open can still be deleted.

use crate::error::CliError;
use crate::utils::{database_config, GlobalOptions};
use clap::Args;
use litesync::Database;

/// Delete the database file.
#[derive(Args)]
pub struct DeleteCommand {
    /// Confirm the deletion
    #[arg(long)]
    pub force: bool,
}

impl DeleteCommand {
    /// Execute the delete command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !self.force {
            return Err(CliError::InvalidArguments(
                "refusing to delete without --force".into(),
            ));
        }
        let config = database_config(global)?;
        let path = config.path.clone();
        Database::new(config).delete_database()?;
        if !global.quiet {
            eprintln!("Deleted {}", path.display());
        }
        Ok(())
    }
}
