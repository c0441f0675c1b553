//! Version command implementation.

use crate::error::CliError;
use crate::utils::{open_database, GlobalOptions};
use clap::Args;

/// Print the stored schema version.
#[derive(Args)]
pub struct VersionCommand {}

impl VersionCommand {
    /// Execute the version command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let db = open_database(global)?;
        println!("{}", db.get_version()?);
        Ok(())
    }
}
