//! Sync-date command implementation.
//!
//! Without arguments prints the sync date as epoch seconds and ISO-8601.
//! With `--set` stores a new one.

use crate::error::CliError;
use crate::utils::{open_database, print_json, GlobalOptions};
use clap::Args;
use litesync::database::format_sync_date;

/// Show or set the sync date.
#[derive(Args)]
pub struct SyncDateCommand {
    /// New sync date, ISO-8601 with fractional seconds (e.g. 2024-03-01T12:00:00.000Z)
    #[arg(long, value_name = "ISO_DATE")]
    pub set: Option<String>,
}

impl SyncDateCommand {
    /// Execute the sync-date command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut db = open_database(global)?;
        if let Some(iso) = &self.set {
            db.set_sync_date(iso)?;
        }
        let seconds = db.get_sync_date()?;
        print_json(&serde_json::json!({
            "syncDate": seconds,
            "iso": format_sync_date(seconds),
        }))
    }
}
