//! Export command implementation.
//!
//! Writes the database as a JSON document to stdout or a file. With
//! `--encoded` the document is wrapped as `{"expData": ...}`, which requires
//! the global `--encrypted` flag.

use crate::error::CliError;
use crate::utils::{open_database, write_output, GlobalOptions};
use clap::Args;
use litesync::{Direction, ExportMode, Logger, LogLevel, Passthrough};
use std::path::PathBuf;

/// Export the database as a JSON document.
#[derive(Args)]
pub struct ExportCommand {
    /// Export mode: everything, or only changes since the sync date
    #[arg(long, value_name = "MODE", default_value = "full")]
    pub mode: ExportMode,

    /// Write the document to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,

    /// Wrap the document as an encoded envelope
    #[arg(long)]
    pub encoded: bool,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut db = open_database(global)?;
        let logger = Logger::new(if global.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Quiet
        });
        let progress = |direction: Direction, message: &str| {
            logger.info(&format!("{direction}: {message}"));
        };

        let json = if self.encoded {
            let encoded = db.export_encoded(self.mode, &Passthrough, &progress)?;
            if self.pretty {
                serde_json::to_string_pretty(&encoded)?
            } else {
                serde_json::to_string(&encoded)?
            }
        } else {
            db.export_to_json_with(self.mode, &progress)?
                .to_json_string(self.pretty)?
        };

        write_output(self.output.as_deref(), &json)?;
        if let Some(path) = &self.output {
            if !global.quiet {
                eprintln!("Exported {} to {}", db.config().database_name(), path.display());
            }
        }
        Ok(())
    }
}
