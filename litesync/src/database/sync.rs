//! The sync anchor table.
//!
//! `sync_table(id INTEGER PRIMARY KEY NOT NULL, sync_date INTEGER)` holds
//! two rows: `id = 1` is the sync anchor that partial exports compare
//! `last_modified` against, `id = 2` is the time of the last export. Dates
//! are epoch seconds.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Operation, Result};

use super::connection::Database;
use super::executor::measure_changes;
use super::schema::{
    has_column, is_sync_eligible, quote_identifier, table_exists, table_names, DELETE_FLAG,
    LAST_MODIFIED, SYNC_TABLE,
};

const SYNC_ANCHOR_ID: i64 = 1;
const LAST_EXPORT_ID: i64 = 2;

const CREATE_SYNC_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS sync_table (id INTEGER PRIMARY KEY NOT NULL, sync_date INTEGER)";

impl Database {
    /// Creates `sync_table` with the anchor set to now.
    ///
    /// Returns the number of rows changed, 0 when the table already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailed`] if the schema has no table or a table
    /// lacks `last_modified` / `sql_deleted`, or the table cannot be created.
    pub fn create_sync_table(&mut self) -> Result<i64> {
        let operation = Operation::CreateSyncTable;
        let conn = self.connection_for(operation)?;
        if table_exists(conn, SYNC_TABLE).map_err(|e| fail(operation, &e))? {
            return Ok(0);
        }
        if !is_sync_eligible(conn).map_err(|e| fail(operation, &e))? {
            return Err(Error::ExportFailed {
                operation,
                message: "No last_modified/sql_deleted columns in tables".into(),
            });
        }
        let wrap = !self.transaction_active;
        self.with_transaction(operation, wrap, |conn| {
            measure_changes(conn, operation, |conn| {
                create_sync_table(conn, Utc::now().timestamp())
                    .map_err(|e| fail(operation, &e))
            })
        })
    }

    /// Reads the sync anchor, in epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailed`] if `sync_table` or its anchor row is
    /// missing.
    pub fn get_sync_date(&self) -> Result<i64> {
        let operation = Operation::GetSyncDate;
        let conn = self.connection_for(operation)?;
        require_sync_table(conn, operation)?;
        read_date(conn, SYNC_ANCHOR_ID)
            .map_err(|e| fail(operation, &e))?
            .ok_or_else(|| Error::ExportFailed {
                operation,
                message: "No sync date available".into(),
            })
    }

    /// Writes the sync anchor from an ISO-8601 timestamp with fractional
    /// seconds and an explicit offset, e.g. `2021-08-04T15:27:41.000Z`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSyncDate`] if the timestamp cannot be parsed
    /// and [`Error::ExportFailed`] if `sync_table` is missing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    ///
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// db.set_sync_date("2021-08-04T15:27:41.000Z").unwrap();
    /// assert_eq!(db.get_sync_date().unwrap(), 1_628_090_861);
    /// ```
    pub fn set_sync_date(&mut self, iso: &str) -> Result<()> {
        let operation = Operation::SetSyncDate;
        let conn = self.connection_for(operation)?;
        let seconds = parse_sync_date(iso)?.timestamp();
        require_sync_table(conn, operation)?;
        write_date(conn, SYNC_ANCHOR_ID, seconds).map_err(|e| fail(operation, &e))?;
        log::debug!("sync date set to {seconds}");
        Ok(())
    }

    /// Physically deletes soft-deleted rows that the last export already
    /// carried: `sql_deleted = 1` and `last_modified` at or before the last
    /// export time. Runs in one transaction; returns rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailed`] if `sync_table` or the last export
    /// time is missing, or a delete fails.
    pub fn delete_exported_rows(&mut self) -> Result<i64> {
        let operation = Operation::DeleteExportedRows;
        let conn = self.connection_for(operation)?;
        require_sync_table(conn, operation)?;
        let Some(last_export) = read_date(conn, LAST_EXPORT_ID).map_err(|e| fail(operation, &e))?
        else {
            return Err(Error::ExportFailed {
                operation,
                message: "No last exported date available".into(),
            });
        };

        let wrap = !self.transaction_active;
        self.with_transaction(operation, wrap, |conn| {
            measure_changes(conn, operation, |conn| {
                for table in table_names(conn).map_err(|e| fail(operation, &e))? {
                    if !has_column(conn, &table, DELETE_FLAG).map_err(|e| fail(operation, &e))? {
                        continue;
                    }
                    let sql = format!(
                        "DELETE FROM {} WHERE {DELETE_FLAG} = 1 AND {LAST_MODIFIED} <= ?",
                        quote_identifier(&table)
                    );
                    let deleted = conn
                        .execute(&sql, [last_export])
                        .map_err(|e| fail(operation, &e))?;
                    log::debug!("{table}: purged {deleted} exported row(s)");
                }
                Ok(())
            })
        })
    }
}

fn fail(operation: Operation, e: &rusqlite::Error) -> Error {
    Error::for_operation(operation, e.to_string())
}

fn require_sync_table(conn: &Connection, operation: Operation) -> Result<()> {
    if table_exists(conn, SYNC_TABLE).map_err(|e| fail(operation, &e))? {
        Ok(())
    } else {
        Err(Error::for_operation(operation, "No sync_table available"))
    }
}

pub(crate) fn create_sync_table(conn: &Connection, now: i64) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_SYNC_TABLE)?;
    conn.execute(
        "INSERT OR IGNORE INTO sync_table (id, sync_date) VALUES (?, ?)",
        [SYNC_ANCHOR_ID, now],
    )?;
    Ok(())
}

fn read_date(conn: &Connection, id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row("SELECT sync_date FROM sync_table WHERE id = ?", [id], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .optional()
    .map(Option::flatten)
}

fn write_date(conn: &Connection, id: i64, seconds: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sync_table (id, sync_date) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET sync_date = excluded.sync_date",
        [id, seconds],
    )?;
    Ok(())
}

/// The sync anchor, `None` when `sync_table` or the anchor row is missing.
pub(crate) fn sync_anchor(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    if !table_exists(conn, SYNC_TABLE)? {
        return Ok(None);
    }
    read_date(conn, SYNC_ANCHOR_ID)
}

/// Records `seconds` as the last export time. Returns `false` when there is
/// no `sync_table` to record it in.
pub(crate) fn record_last_export(conn: &Connection, seconds: i64) -> rusqlite::Result<bool> {
    if !table_exists(conn, SYNC_TABLE)? {
        return Ok(false);
    }
    write_date(conn, LAST_EXPORT_ID, seconds)?;
    Ok(true)
}

/// Parses an ISO-8601 timestamp with fractional seconds and an explicit
/// offset.
///
/// # Errors
///
/// Returns [`Error::InvalidSyncDate`] describing the rejection.
///
/// # Examples
///
/// ```
/// use litesync::database::parse_sync_date;
///
/// assert_eq!(parse_sync_date("1970-01-01T00:01:00.500Z").unwrap().timestamp(), 60);
/// assert!(parse_sync_date("1970-01-01T00:01:00Z").is_err());
/// assert!(parse_sync_date("1970-01-01T00:01:00.5").is_err());
/// ```
pub fn parse_sync_date(iso: &str) -> Result<DateTime<FixedOffset>> {
    let invalid = |message: &str| Error::InvalidSyncDate {
        value: iso.to_string(),
        message: message.to_string(),
    };

    let time = iso
        .split_once('T')
        .map(|(_, time)| time)
        .ok_or_else(|| invalid("missing 'T' separator"))?;
    let has_fraction = time
        .split_once('.')
        .is_some_and(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()));
    if !has_fraction {
        return Err(invalid("fractional seconds are required"));
    }

    DateTime::parse_from_rfc3339(iso)
        .or_else(|_| DateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|e| invalid(&e.to_string()))
}

/// Formats epoch seconds the way [`parse_sync_date`] accepts them.
///
/// # Examples
///
/// ```
/// use litesync::database::format_sync_date;
///
/// assert_eq!(format_sync_date(60), "1970-01-01T00:01:00.000Z");
/// ```
#[must_use]
pub fn format_sync_date(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
