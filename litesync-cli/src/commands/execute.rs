//! Execute command implementation.
//!
//! Runs a multi-statement script without bound values and prints the number
//! of changed rows.

use crate::error::CliError;
use crate::utils::{open_database, print_json, read_input, GlobalOptions};
use clap::Args;
use std::path::PathBuf;

/// Execute a multi-statement SQL script.
#[derive(Args)]
pub struct ExecuteCommand {
    /// SQL script to execute
    #[arg(value_name = "SQL", required_unless_present = "file")]
    pub sql: Option<String>,

    /// Read the script from a file (`-` for stdin)
    #[arg(long, short = 'f', value_name = "PATH", conflicts_with = "sql")]
    pub file: Option<PathBuf>,

    /// Do not wrap the script in a transaction
    #[arg(long)]
    pub no_transaction: bool,
}

impl ExecuteCommand {
    /// Execute the execute command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let sql = match (self.sql, self.file) {
            (Some(sql), _) => sql,
            (None, Some(path)) => read_input(&path)?,
            (None, None) => return Err(CliError::InvalidArguments("no SQL given".into())),
        };

        let mut db = open_database(global)?;
        let changes = db.execute(&sql, !self.no_transaction)?;
        print_json(&serde_json::json!({ "changes": changes }))
    }
}
