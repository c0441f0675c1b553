//! Command to validate a JSON document.

use crate::error::CliError;
use crate::utils::{read_input, GlobalOptions};
use clap::Args;
use std::path::PathBuf;

/// Validate a JSON document without opening a database.
#[derive(Args)]
pub struct ValidateCommand {
    /// JSON document to validate (`-` for stdin)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

impl ValidateCommand {
    /// Execute the validate command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let contents = read_input(&self.path)?;
        litesync::is_json_valid(&contents)?;
        if !global.quiet {
            println!("Document is valid");
        }
        Ok(())
    }
}
