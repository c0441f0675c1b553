//! Execute-set command implementation.
//!
//! Reads a JSON array of `{"statement": ..., "values": [...]}` objects and
//! runs them in order, by default as one transaction.

use crate::error::CliError;
use crate::utils::{open_database, print_json, read_input, GlobalOptions};
use clap::Args;
use litesync::{ReturnMode, SetStatement};
use std::path::PathBuf;

/// Run a JSON list of statements.
#[derive(Args)]
pub struct ExecuteSetCommand {
    /// JSON file holding the statements (`-` for stdin)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Which returned rows to print
    #[arg(long, value_name = "MODE", default_value = "no")]
    pub return_mode: ReturnMode,

    /// Do not wrap the set in a transaction
    #[arg(long)]
    pub no_transaction: bool,
}

impl ExecuteSetCommand {
    /// Execute the execute-set command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let contents = read_input(&self.path)?;
        let set: Vec<SetStatement> = serde_json::from_str(&contents).map_err(|e| {
            CliError::InvalidArguments(format!("statement set must be a JSON array: {e}"))
        })?;

        let mut db = open_database(global)?;
        let result = db.execute_set(&set, !self.no_transaction, self.return_mode)?;
        print_json(&result)
    }
}
