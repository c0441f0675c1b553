//! Schema introspection over the engine catalog.

use rusqlite::Connection;

use crate::error::{Error, Operation, Result};

use super::connection::Database;

/// Name of the sync anchor table.
pub const SYNC_TABLE: &str = "sync_table";

/// Column carrying a row's modification time, in epoch seconds.
pub const LAST_MODIFIED: &str = "last_modified";

/// Soft-delete marker column.
pub const DELETE_FLAG: &str = "sql_deleted";

const SELECT_TABLE_NAMES: &str = "
    SELECT name FROM sqlite_master
    WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != 'sync_table'
    ORDER BY rowid";

const SELECT_VIEW_NAMES: &str = "
    SELECT name FROM sqlite_master WHERE type = 'view' ORDER BY rowid";

const SELECT_TABLE_EXISTS: &str = "
    SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?";

impl Database {
    /// User table names in catalog order, internal tables and the sync
    /// table excluded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntrospectionFailed`] if the handle is closed or the
    /// catalog cannot be read.
    pub fn get_table_list(&self) -> Result<Vec<String>> {
        let operation = Operation::GetTableList;
        let conn = self.connection_for(operation)?;
        table_names(conn).map_err(|e| introspection(operation, &e))
    }

    /// Whether a table named `name` exists. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntrospectionFailed`] if the handle is closed or the
    /// catalog cannot be read.
    pub fn is_table_exists(&self, name: &str) -> Result<bool> {
        let operation = Operation::IsTableExists;
        let conn = self.connection_for(operation)?;
        table_exists(conn, name).map_err(|e| introspection(operation, &e))
    }

    /// Whether the schema is eligible for incremental sync: at least one
    /// user table, and every user table carries both `last_modified` and
    /// `sql_deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntrospectionFailed`] if the catalog cannot be read.
    pub fn has_last_modified_and_delete_flag(&self) -> Result<bool> {
        let operation = Operation::GetTableList;
        let conn = self.connection_for(operation)?;
        is_sync_eligible(conn).map_err(|e| introspection(operation, &e))
    }
}

fn introspection(operation: Operation, e: &rusqlite::Error) -> Error {
    Error::IntrospectionFailed {
        operation,
        message: e.to_string(),
    }
}

/// User table names in catalog order.
pub(crate) fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(SELECT_TABLE_NAMES)?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

/// View names in catalog order.
pub(crate) fn view_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(SELECT_VIEW_NAMES)?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(SELECT_TABLE_EXISTS, [name], |row| row.get(0))?;
    Ok(count > 0)
}

/// Column names of `table` in declaration order.
pub(crate) fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?) ORDER BY cid")?;
    let names = stmt.query_map([table], |row| row.get(0))?;
    names.collect()
}

/// Primary-key columns of `table` in key order. Tables without a declared
/// primary key are keyed on their first column.
pub(crate) fn key_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk")?;
    let keys = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    if keys.is_empty() {
        return Ok(column_names(conn, table)?.into_iter().take(1).collect());
    }
    Ok(keys)
}

/// The stored `CREATE` statement of a catalog object.
pub(crate) fn object_sql(conn: &Connection, kind: &str, name: &str) -> rusqlite::Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT sql FROM sqlite_master WHERE type = ? AND name = ?")?;
    let mut rows = stmt.query([kind, name])?;
    match rows.next()? {
        Some(row) => row.get(0),
        None => Ok(None),
    }
}

/// Index and trigger statements attached to `table`, catalog order.
///
/// Automatic indexes (those without SQL) are skipped.
pub(crate) fn attached_objects(
    conn: &Connection,
    kind: &str,
    table: &str,
) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master
         WHERE type = ? AND tbl_name = ? AND sql IS NOT NULL
         ORDER BY rowid",
    )?;
    let objects = stmt.query_map([kind, table], |row| Ok((row.get(0)?, row.get(1)?)))?;
    objects.collect()
}

/// Quotes an identifier for interpolation into SQL text.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    Ok(column_names(conn, table)?.iter().any(|c| c == column))
}

pub(crate) fn is_sync_eligible(conn: &Connection) -> rusqlite::Result<bool> {
    let tables = table_names(conn)?;
    if tables.is_empty() {
        return Ok(false);
    }
    for table in &tables {
        let columns = column_names(conn, table)?;
        let has = |name: &str| columns.iter().any(|c| c == name);
        if !(has(LAST_MODIFIED) && has(DELETE_FLAG)) {
            return Ok(false);
        }
    }
    Ok(true)
}
