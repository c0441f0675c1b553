//! Query command implementation.
//!
//! This module implements the `query` command, which runs a read-only
//! statement and prints the rows in various formats (table, JSON, CSV).

use crate::error::CliError;
use crate::utils::{open_database, parse_values, print_json, GlobalOptions};
use clap::{Args, ValueEnum};
use litesync::{RowSet, Value};
use std::io::Write;

/// Run a read-only query and print the rows.
#[derive(Args)]
pub struct QueryCommand {
    /// SQL query to run
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Bound values as a JSON array
    #[arg(long, value_name = "JSON")]
    pub values: Option<String>,

    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "json",
        env = "LITESYNC_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,
}

/// Output format for the query command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Header row followed by one object per row
    Json,
    /// CSV format
    Csv,
    /// Tab-separated table format (human-readable)
    Table,
}

impl QueryCommand {
    /// Execute the query command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let values = parse_values(self.values.as_deref())?;
        let db = open_database(global)?;

        match self.format {
            OutputFormat::Json => print_json(&db.query(&self.sql, &values)?),
            OutputFormat::Csv => format_as_csv(&db.select(&self.sql, &values)?),
            OutputFormat::Table => format_as_table(&db.select(&self.sql, &values)?),
        }
    }
}

/// Text of one cell for delimited output; NULL is empty.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Format rows as a human-readable table.
fn format_as_table(rows: &RowSet) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let header_line = rows
        .columns
        .iter()
        .map(|s| s.to_uppercase())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(handle, "{header_line}")?;

    for row in &rows.rows {
        let line = row.iter().map(ToString::to_string).collect::<Vec<_>>().join("\t");
        writeln!(handle, "{line}")?;
    }

    Ok(())
}

/// Convert csv::Error to CliError.
fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}

/// Format rows as CSV.
fn format_as_csv(rows: &RowSet) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::Writer::from_writer(handle);

    writer.write_record(&rows.columns).map_err(csv_error)?;
    for row in &rows.rows {
        writer
            .write_record(row.iter().map(cell_text))
            .map_err(csv_error)?;
    }

    writer.flush()?;

    Ok(())
}
