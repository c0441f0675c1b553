//! Database to JSON.
//!
//! A full export carries every user table (schema and all rows) and every
//! view. A partial export carries only rows whose `last_modified` is after
//! the sync anchor: soft-deleted ones as delete directives, the rest as
//! values. Every export first records its own time as the last export date,
//! which is what [`Database::delete_exported_rows`] later purges against.

use chrono::Utc;
use rusqlite::Connection;

use crate::database::migrations::get_user_version;
use crate::database::{
    attached_objects, column_names, key_columns, object_sql, quote_identifier, record_last_export,
    select, sync_anchor, table_exists, table_names, view_names, Database, DELETE_FLAG,
    LAST_MODIFIED, SYNC_TABLE,
};
use crate::error::{Error, Operation, Result};
use crate::value::Value;

use super::cipher::DocumentCipher;
use super::ddl::{parse_index, parse_table_columns, parse_table_options, parse_trigger};
use super::document::{
    EncodedDocument, ExportDocument, ExportMode, TableDefinition, TableSchema, ViewDefinition,
};
use super::progress::{Direction, NoProgress, ProgressSink};

const OPERATION: Operation = Operation::ExportToJson;

fn fail(message: impl Into<String>) -> Error {
    Error::ExportFailed {
        operation: OPERATION,
        message: message.into(),
    }
}

fn engine(e: &rusqlite::Error) -> Error {
    fail(e.to_string())
}

/// Whether a soft-delete cell marks the row deleted.
pub(crate) fn is_flag_set(cell: &Value) -> bool {
    match cell {
        Value::Integer(i) => *i == 1,
        Value::Real(r) => (*r - 1.0).abs() < f64::EPSILON,
        Value::Text(s) => s.trim() == "1",
        Value::Null | Value::Blob(_) => false,
    }
}

impl Database {
    /// Exports the database as a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailed`] if the handle is closed, a partial
    /// export is requested without `sync_table`, or reading fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    /// use litesync::ExportMode;
    ///
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// let doc = db.export_to_json(ExportMode::Full).unwrap();
    /// println!("{}", doc.to_json_string(true).unwrap());
    /// ```
    pub fn export_to_json(&mut self, mode: ExportMode) -> Result<ExportDocument> {
        self.export_to_json_with(mode, &NoProgress)
    }

    /// Exports the database, reporting each table to `progress`.
    ///
    /// # Errors
    ///
    /// Same as [`Database::export_to_json`].
    pub fn export_to_json_with(
        &mut self,
        mode: ExportMode,
        progress: &dyn ProgressSink,
    ) -> Result<ExportDocument> {
        let conn = self.connection_for(OPERATION)?;

        let has_sync_table = if self.config.read_only {
            table_exists(conn, SYNC_TABLE).map_err(|e| engine(&e))?
        } else {
            record_last_export(conn, Utc::now().timestamp()).map_err(|e| engine(&e))?
        };
        let anchor = match mode {
            ExportMode::Full => None,
            ExportMode::Partial => {
                if !has_sync_table {
                    return Err(fail("No sync_table available"));
                }
                Some(
                    sync_anchor(conn)
                        .map_err(|e| engine(&e))?
                        .ok_or_else(|| fail("No sync date available"))?,
                )
            }
        };

        let mut tables = Vec::new();
        for name in table_names(conn).map_err(|e| engine(&e))? {
            match export_table(conn, &name, anchor)? {
                Some(table) => {
                    progress.report(
                        Direction::Export,
                        &format!(
                            "table {name}: {} row(s), {} delete(s)",
                            table.values.len(),
                            table.deletes.len()
                        ),
                    );
                    tables.push(table);
                }
                None => log::debug!("table {name}: no changes since {anchor:?}"),
            }
        }

        let views = match mode {
            ExportMode::Full => export_views(conn)?,
            ExportMode::Partial => Vec::new(),
        };

        let stored = get_user_version(conn).map_err(|e| engine(&e))?;
        let version = if stored > 0 { stored } else { self.config.version };

        log::info!(
            "exported {} table(s), {} view(s) from {} ({mode})",
            tables.len(),
            views.len(),
            self.config.path.display()
        );
        Ok(ExportDocument {
            database: self.config.database_name(),
            version,
            encrypted: self.config.encrypted,
            mode,
            overwrite: None,
            tables,
            views,
        })
    }

    /// Exports the database and encodes the whole document with `cipher`.
    ///
    /// Only allowed on handles whose configuration is marked encrypted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailed`] if the configuration is not marked
    /// encrypted, plus the errors of [`Database::export_to_json`] and of the
    /// cipher.
    pub fn export_encoded(
        &mut self,
        mode: ExportMode,
        cipher: &dyn DocumentCipher,
        progress: &dyn ProgressSink,
    ) -> Result<EncodedDocument> {
        if !self.config.encrypted {
            return Err(fail("database is not marked encrypted"));
        }
        let mut doc = self.export_to_json_with(mode, progress)?;
        doc.overwrite = Some(true);
        let plain = serde_json::to_string(&doc)?;
        Ok(EncodedDocument {
            exp_data: cipher.encode(&plain)?,
        })
    }
}

fn export_schema(conn: &Connection, table: &str) -> Result<TableSchema> {
    let sql = object_sql(conn, "table", table)
        .map_err(|e| engine(&e))?
        .ok_or_else(|| fail(format!("no definition found for table {table}")))?;
    let columns = parse_table_columns(table, &sql)?;
    let options = parse_table_options(&sql);

    let indexes = attached_objects(conn, "index", table)
        .map_err(|e| engine(&e))?
        .iter()
        .map(|(name, sql)| parse_index(name, sql))
        .collect::<Result<Vec<_>>>()?;
    let triggers = attached_objects(conn, "trigger", table)
        .map_err(|e| engine(&e))?
        .iter()
        .map(|(name, sql)| parse_trigger(name, sql))
        .collect::<Result<Vec<_>>>()?;

    Ok(TableSchema {
        columns,
        indexes,
        triggers,
        options,
    })
}

/// One table's entry; `None` in partial mode when nothing changed.
fn export_table(conn: &Connection, table: &str, anchor: Option<i64>) -> Result<Option<TableDefinition>> {
    let quoted = quote_identifier(table);
    let read = |e: Error| fail(format!("table {table}: {e}"));

    let Some(anchor) = anchor else {
        let rows = select(conn, &format!("SELECT * FROM {quoted}"), &[]).map_err(read)?;
        return Ok(Some(TableDefinition {
            name: table.to_string(),
            schema: Some(export_schema(conn, table)?),
            values: rows.rows,
            deletes: Vec::new(),
        }));
    };

    let columns = column_names(conn, table).map_err(|e| engine(&e))?;
    if !columns.iter().any(|c| c == LAST_MODIFIED) {
        return Err(fail(format!("table {table} has no {LAST_MODIFIED} column")));
    }
    let changed = select(
        conn,
        &format!("SELECT * FROM {quoted} WHERE {LAST_MODIFIED} > ?"),
        &[Value::Integer(anchor)],
    )
    .map_err(read)?;
    if changed.is_empty() {
        return Ok(None);
    }

    let total = select(conn, &format!("SELECT COUNT(*) FROM {quoted}"), &[])
        .map_err(read)?
        .rows
        .first()
        .and_then(|row| row.first())
        .and_then(Value::as_i64)
        .unwrap_or_default();
    // Every row is new: the table itself appeared since the last sync.
    let schema = if usize::try_from(total).is_ok_and(|t| t == changed.len()) {
        Some(export_schema(conn, table)?)
    } else {
        None
    };

    // Only a single-column key fits the `deletes` list. Flagged rows of
    // composite-key tables stay in `values`, where the flag deletes them.
    let key = match key_columns(conn, table).map_err(|e| engine(&e))?.as_slice() {
        [single] => changed.column_index(single),
        _ => None,
    };
    let flag = changed.column_index(DELETE_FLAG);
    let mut values = Vec::new();
    let mut deletes = Vec::new();
    for row in changed.rows {
        let flagged = flag.is_some_and(|index| row.get(index).is_some_and(is_flag_set));
        let deleted_key = key
            .filter(|_| flagged)
            .and_then(|index| row.get(index).cloned());
        match deleted_key {
            Some(key_value) => deletes.push(key_value),
            None => values.push(row),
        }
    }

    Ok(Some(TableDefinition {
        name: table.to_string(),
        schema,
        values,
        deletes,
    }))
}

fn export_views(conn: &Connection) -> Result<Vec<ViewDefinition>> {
    let mut views = Vec::new();
    for name in view_names(conn).map_err(|e| engine(&e))? {
        let sql = object_sql(conn, "view", &name)
            .map_err(|e| engine(&e))?
            .ok_or_else(|| fail(format!("no definition found for view {name}")))?;
        views.push(ViewDefinition { name, value: sql });
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{
        create_empty_database, create_sync_database, create_test_database,
    };
    use crate::json::document::ColumnDef;
    use crate::ReturnMode;

    #[test]
    fn test_full_export_shape() {
        let mut db = create_sync_database();
        db.execute(
            "INSERT INTO users (id, email, name) VALUES (1, 'a@x', 'a');
             CREATE VIEW user_names AS SELECT name FROM users;",
            true,
        )
        .unwrap();

        let doc = db.export_to_json(ExportMode::Full).unwrap();
        assert_eq!(doc.database, "test");
        assert_eq!(doc.mode, ExportMode::Full);
        assert_eq!(doc.tables.len(), 2);

        let users = doc.table("users").unwrap();
        let schema = users.schema.as_ref().unwrap();
        assert_eq!(schema.columns[0], ColumnDef::column("id", "INTEGER PRIMARY KEY NOT NULL"));
        assert_eq!(schema.indexes[0].name, "users_index_name");
        assert_eq!(users.values.len(), 1);
        assert_eq!(users.values[0][1], Value::Text("a@x".into()));

        let messages = doc.table("messages").unwrap();
        assert!(messages.values.is_empty());
        assert!(messages
            .schema
            .as_ref()
            .unwrap()
            .columns
            .iter()
            .any(|c| matches!(c, ColumnDef::ForeignKey { .. })));

        assert_eq!(doc.views.len(), 1);
        assert!(doc.views[0].value.starts_with("CREATE VIEW user_names"));
    }

    #[test]
    fn test_partial_export_requires_sync_table() {
        let mut db = create_sync_database();
        let err = db.export_to_json(ExportMode::Partial).unwrap_err();
        assert!(matches!(err, Error::ExportFailed { .. }));
        assert!(err.to_string().contains("sync_table"));
    }

    #[test]
    fn test_partial_export_changes_and_deletes() {
        let mut db = create_sync_database();
        db.create_sync_table().unwrap();
        db.set_sync_date("1970-01-01T00:16:40.000Z").unwrap(); // 1000
        db.execute(
            "INSERT INTO users (id, email, name, sql_deleted, last_modified) VALUES
                (1, 'old@x', 'old', 0, 500),
                (2, 'new@x', 'new', 0, 1500),
                (3, 'gone@x', 'gone', 1, 1600);",
            true,
        )
        .unwrap();

        let doc = db.export_to_json(ExportMode::Partial).unwrap();
        assert_eq!(doc.tables.len(), 1, "messages has no changes");
        let users = &doc.tables[0];
        assert!(users.schema.is_none(), "not every row changed");
        assert_eq!(users.values.len(), 1);
        assert_eq!(users.values[0][0], Value::Integer(2));
        assert_eq!(users.deletes, vec![Value::Integer(3)]);
        assert!(doc.views.is_empty());
    }

    #[test]
    fn test_partial_export_deletes_by_primary_key() {
        let mut db = create_empty_database();
        db.execute(
            "CREATE TABLE notes (title TEXT, id INTEGER PRIMARY KEY,
                sql_deleted BOOLEAN DEFAULT 0, last_modified INTEGER);
             CREATE TABLE pairs (a TEXT, b TEXT, sql_deleted BOOLEAN DEFAULT 0,
                last_modified INTEGER, PRIMARY KEY (a, b));
             INSERT INTO notes VALUES ('same', 1, 0, 500), ('same', 2, 0, 500);
             INSERT INTO pairs VALUES ('x', 'y', 0, 500), ('x', 'z', 0, 500);",
            true,
        )
        .unwrap();
        db.create_sync_table().unwrap();
        db.set_sync_date("1970-01-01T00:16:40.000Z").unwrap();
        db.execute(
            "UPDATE notes SET sql_deleted = 1, last_modified = 1500 WHERE id = 1;
             UPDATE pairs SET sql_deleted = 1, last_modified = 1500 WHERE b = 'y';",
            true,
        )
        .unwrap();

        let doc = db.export_to_json(ExportMode::Partial).unwrap();
        let notes = doc.table("notes").unwrap();
        assert!(notes.values.is_empty());
        assert_eq!(notes.deletes, vec![Value::Integer(1)]);

        let pairs = doc.table("pairs").unwrap();
        assert!(pairs.deletes.is_empty());
        assert_eq!(pairs.values.len(), 1);
        assert_eq!(pairs.values[0][1], Value::Text("y".into()));
    }

    #[test]
    fn test_full_export_keeps_options_partial_indexes_and_ignores_comments() {
        let mut db = create_empty_database();
        db.execute(
            "CREATE TABLE kv (
                k TEXT PRIMARY KEY, -- the caller's key
                v BLOB /* raw, (unparsed) */
             ) WITHOUT ROWID;
             CREATE INDEX kv_set ON kv (v) WHERE v IS NOT NULL;",
            true,
        )
        .unwrap();

        let doc = db.export_to_json(ExportMode::Full).unwrap();
        let schema = doc.table("kv").unwrap().schema.as_ref().unwrap();
        assert_eq!(
            schema.columns,
            vec![ColumnDef::column("k", "TEXT PRIMARY KEY"), ColumnDef::column("v", "BLOB")]
        );
        assert_eq!(schema.options.as_deref(), Some("WITHOUT ROWID"));
        assert_eq!(schema.indexes[0].where_clause.as_deref(), Some("v IS NOT NULL"));
    }

    #[test]
    fn test_partial_export_includes_schema_of_new_table() {
        let mut db = create_sync_database();
        db.create_sync_table().unwrap();
        db.set_sync_date("1970-01-01T00:16:40.000Z").unwrap();
        db.run(
            "INSERT INTO users (id, email, last_modified) VALUES (?, ?, ?)",
            &[1.into(), "a@x".into(), 2000.into()],
            true,
            ReturnMode::No,
        )
        .unwrap();
        let doc = db.export_to_json(ExportMode::Partial).unwrap();
        assert!(doc.tables[0].schema.is_some());
    }

    #[test]
    fn test_export_records_last_export_date() {
        let mut db = create_sync_database();
        db.create_sync_table().unwrap();
        db.export_to_json(ExportMode::Full).unwrap();
        let rows = db
            .select("SELECT sync_date FROM sync_table WHERE id = 2", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_export_encoded_requires_encrypted_config() {
        let mut db = create_test_database();
        let err = db
            .export_encoded(ExportMode::Full, &crate::Passthrough, &NoProgress)
            .unwrap_err();
        assert!(err.to_string().contains("not marked encrypted"));
    }

    #[test]
    fn test_progress_is_reported_per_table() {
        let mut db = create_sync_database();
        let seen = std::cell::RefCell::new(Vec::new());
        let sink = |direction: Direction, message: &str| {
            seen.borrow_mut().push((direction, message.to_string()));
        };
        db.export_to_json_with(ExportMode::Full, &sink).unwrap();
        let seen = seen.into_inner();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(d, _)| *d == Direction::Export));
        assert!(seen[0].1.starts_with("table users"));
    }

    #[test]
    fn test_is_flag_set() {
        assert!(is_flag_set(&Value::Integer(1)));
        assert!(is_flag_set(&Value::Text("1".into())));
        assert!(!is_flag_set(&Value::Integer(0)));
        assert!(!is_flag_set(&Value::Null));
    }
}
