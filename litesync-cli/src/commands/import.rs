//! Import command implementation.
//!
//! Reads a JSON document (or an encoded envelope) and imports it, printing
//! the number of changes.

use crate::error::CliError;
use crate::utils::{open_database, print_json, read_input, GlobalOptions};
use clap::Args;
use litesync::{
    Direction, DocumentCipher, EncodedDocument, ExportDocument, Logger, LogLevel, Passthrough,
};
use std::path::PathBuf;

/// Import a JSON document into the database.
#[derive(Args)]
pub struct ImportCommand {
    /// JSON document to import (`-` for stdin)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// The document is an encoded envelope
    #[arg(long)]
    pub encoded: bool,
}

impl ImportCommand {
    /// Execute the import command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let contents = read_input(&self.path)?;
        // Parse before opening so a bad document never creates a file.
        let doc = if self.encoded {
            let envelope: EncodedDocument = serde_json::from_str(&contents).map_err(|e| {
                CliError::InvalidArguments(format!("not an encoded document: {e}"))
            })?;
            ExportDocument::from_json_str(&Passthrough.decode(&envelope.exp_data)?)?
        } else {
            ExportDocument::from_json_str(&contents)?
        };

        let mut db = open_database(global)?;
        let logger = Logger::new(if global.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Quiet
        });
        let progress = |direction: Direction, message: &str| {
            logger.info(&format!("{direction}: {message}"));
        };
        let changes = db.import_from_json_with(&doc, &progress)?;
        print_json(&serde_json::json!({ "changes": changes }))
    }
}
