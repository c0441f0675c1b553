//! Run command implementation.
//!
//! Runs one statement with bound values and prints the execution result
//! (`changes`, `lastId` and any returned rows).

use crate::error::CliError;
use crate::utils::{open_database, parse_values, print_json, GlobalOptions};
use clap::Args;
use litesync::ReturnMode;

/// Run one statement with bound values.
#[derive(Args)]
pub struct RunCommand {
    /// SQL statement to run
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Bound values as a JSON array, e.g. '[1, "text", null]'
    #[arg(long, value_name = "JSON")]
    pub values: Option<String>,

    /// Which returned rows to print
    #[arg(long, value_name = "MODE", default_value = "no")]
    pub return_mode: ReturnMode,

    /// Do not wrap the statement in a transaction
    #[arg(long)]
    pub no_transaction: bool,
}

impl RunCommand {
    /// Execute the run command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let values = parse_values(self.values.as_deref())?;
        let mut db = open_database(global)?;
        let result = db.run(&self.sql, &values, !self.no_transaction, self.return_mode)?;
        print_json(&result)
    }
}
