//! JSON to database.
//!
//! The whole import runs in one transaction with foreign-key enforcement
//! switched off, so tables may arrive in any order. Enforcement is switched
//! back on afterwards whatever the outcome.

use chrono::Utc;
use rusqlite::{params_from_iter, Connection};

use crate::database::migrations::set_user_version;
use crate::database::{
    column_names, create_sync_table, execute_script, is_sync_eligible, key_columns,
    measure_changes, object_sql, quote_identifier, run_in_transaction, table_exists, table_names,
    view_names, Database, DELETE_FLAG, SYNC_TABLE,
};
use crate::error::{Error, Operation, Result};

use super::cipher::DocumentCipher;
use super::ddl::{create_index_sql, create_table_sql, create_trigger_sql, create_view_sql};
use super::document::{EncodedDocument, ExportDocument, ExportMode, TableDefinition};
use super::export::is_flag_set;
use super::progress::{Direction, NoProgress, ProgressSink};
use super::validate::validate_document;

const OPERATION: Operation = Operation::ImportFromJson;

fn fail(message: impl Into<String>) -> Error {
    Error::ImportFailed {
        message: message.into(),
    }
}

fn engine(e: &rusqlite::Error) -> Error {
    fail(e.to_string())
}

/// Keeps import failures as they are and wraps everything else.
fn into_import_error(err: Error) -> Error {
    match err {
        Error::ImportFailed { .. } | Error::InvalidJson { .. } => err,
        other => fail(other.to_string()),
    }
}

impl Database {
    /// Imports a parsed document and returns the number of changes.
    ///
    /// In full mode every existing view and user table is dropped first. In
    /// partial mode rows are upserted by their primary key and delete
    /// directives are applied. Either the whole document lands or nothing
    /// does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] if the document is malformed (the
    /// database is untouched), and [`Error::ImportFailed`] if the handle is
    /// closed, read-only, inside an explicit transaction, or any statement
    /// fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    /// use litesync::ExportDocument;
    ///
    /// let json = std::fs::read_to_string("/tmp/notes.json").unwrap();
    /// let doc = ExportDocument::from_json_str(&json).unwrap();
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// let changes = db.import_from_json(&doc).unwrap();
    /// println!("{changes} change(s)");
    /// ```
    pub fn import_from_json(&mut self, doc: &ExportDocument) -> Result<i64> {
        self.import_from_json_with(doc, &NoProgress)
    }

    /// Imports a document, reporting each table to `progress`.
    ///
    /// # Errors
    ///
    /// Same as [`Database::import_from_json`].
    pub fn import_from_json_with(
        &mut self,
        doc: &ExportDocument,
        progress: &dyn ProgressSink,
    ) -> Result<i64> {
        validate_document(&serde_json::to_value(doc)?)?;

        if self.transaction_active {
            return Err(fail("cannot import inside an explicit transaction"));
        }
        if self.config.read_only {
            return Err(fail("database is read-only"));
        }
        let conn = self
            .connection_for(OPERATION)
            .map_err(|_| fail("database not opened"))?;

        conn.execute_batch("PRAGMA foreign_keys = OFF")
            .map_err(|e| fail(format!("Failed in setForeignKeyConstraintsEnabled {e}")))?;
        let outcome = run_in_transaction(conn, OPERATION, |conn| import_document(conn, doc, progress));
        let restored = conn.execute_batch("PRAGMA foreign_keys = ON");

        match (outcome, restored) {
            (Ok(changes), Ok(())) => {
                log::info!(
                    "imported {} table(s), {} view(s) into {} ({}): {changes} change(s)",
                    doc.tables.len(),
                    doc.views.len(),
                    self.config.path.display(),
                    doc.mode
                );
                Ok(changes)
            }
            (Ok(_), Err(e)) => Err(fail(format!("Failed in setForeignKeyConstraintsEnabled {e}"))),
            (Err(err), Ok(())) => Err(into_import_error(err)),
            (Err(err), Err(e)) => Err(into_import_error(err)
                .with_note(&format!("setForeignKeyConstraintsEnabled failed: {e}"))),
        }
    }

    /// Parses, validates and imports a JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`Database::import_from_json`].
    pub fn import_json_str(&mut self, json: &str) -> Result<i64> {
        let doc = ExportDocument::from_json_str(json)?;
        self.import_from_json(&doc)
    }

    /// Decodes a document produced by [`Database::export_encoded`] and
    /// imports it.
    ///
    /// # Errors
    ///
    /// Returns the cipher's error, plus those of [`Database::import_from_json`].
    pub fn import_encoded(
        &mut self,
        encoded: &EncodedDocument,
        cipher: &dyn DocumentCipher,
    ) -> Result<i64> {
        let plain = cipher.decode(&encoded.exp_data)?;
        self.import_json_str(&plain)
    }
}

fn import_document(conn: &Connection, doc: &ExportDocument, progress: &dyn ProgressSink) -> Result<i64> {
    let mut changes = 0;

    if !doc.tables.is_empty() {
        if doc.mode == ExportMode::Full {
            drop_everything(conn)?;
        }
        for table in &doc.tables {
            create_schema(conn, table)?;
        }
        set_user_version(conn, doc.version)
            .map_err(|e| fail(format!("Failed in setVersion {e}")))?;
        if is_sync_eligible(conn).map_err(|e| engine(&e))? {
            create_sync_table(conn, Utc::now().timestamp())
                .map_err(|e| fail(format!("Failed in createSyncTable {e}")))?;
        }

        changes += measure_changes(conn, OPERATION, |conn| {
            for table in &doc.tables {
                import_rows(conn, table, doc.mode)?;
                progress.report(
                    Direction::Import,
                    &format!(
                        "table {}: {} row(s), {} delete(s)",
                        table.name,
                        table.values.len(),
                        table.deletes.len()
                    ),
                );
            }
            Ok(())
        })?;
    }

    for view in &doc.views {
        if object_sql(conn, "view", &view.name)
            .map_err(|e| engine(&e))?
            .is_some()
        {
            continue;
        }
        execute_script(conn, &create_view_sql(view), OPERATION)
            .map_err(|e| fail(format!("view {}: {e}", view.name)))?;
        changes += 1;
    }

    Ok(changes)
}

fn drop_everything(conn: &Connection) -> Result<()> {
    for view in view_names(conn).map_err(|e| engine(&e))? {
        execute_script(conn, &format!("DROP VIEW IF EXISTS {}", quote_identifier(&view)), OPERATION)?;
    }
    let mut tables = table_names(conn).map_err(|e| engine(&e))?;
    if table_exists(conn, SYNC_TABLE).map_err(|e| engine(&e))? {
        tables.push(SYNC_TABLE.to_string());
    }
    for table in tables {
        execute_script(conn, &format!("DROP TABLE IF EXISTS {}", quote_identifier(&table)), OPERATION)?;
    }
    log::debug!("dropped existing schema before full import");
    Ok(())
}

fn create_schema(conn: &Connection, table: &TableDefinition) -> Result<()> {
    let Some(schema) = &table.schema else {
        if table_exists(conn, &table.name).map_err(|e| engine(&e))? {
            return Ok(());
        }
        return Err(fail(format!(
            "table {} does not exist and has no schema",
            table.name
        )));
    };

    let mut script = vec![create_table_sql(
        &table.name,
        &schema.columns,
        schema.options.as_deref(),
    )];
    script.extend(schema.indexes.iter().map(|index| create_index_sql(&table.name, index)));
    script.extend(schema.triggers.iter().map(|trigger| create_trigger_sql(&table.name, trigger)));
    for sql in script {
        execute_script(conn, &sql, OPERATION).map_err(|e| fail(format!("table {}: {e}", table.name)))?;
    }
    Ok(())
}

fn import_rows(conn: &Connection, table: &TableDefinition, mode: ExportMode) -> Result<()> {
    let columns = column_names(conn, &table.name).map_err(|e| engine(&e))?;
    let keys = key_columns(conn, &table.name).map_err(|e| engine(&e))?;
    let key_positions = keys
        .iter()
        .filter_map(|key| columns.iter().position(|c| c == key))
        .collect::<Vec<_>>();
    if key_positions.is_empty() {
        return Err(fail(format!("table {} has no columns", table.name)));
    }
    let quoted = quote_identifier(&table.name);
    let soft_delete = match mode {
        ExportMode::Partial => columns.iter().position(|c| c == DELETE_FLAG),
        ExportMode::Full => None,
    };

    let names = columns.iter().map(|c| quote_identifier(c)).collect::<Vec<_>>();
    let key_filter = keys
        .iter()
        .map(|k| format!("{} = ?", quote_identifier(k)))
        .collect::<Vec<_>>()
        .join(" AND ");
    let insert = format!(
        "INSERT INTO {quoted} ({}) VALUES ({})",
        names.join(", "),
        vec!["?"; names.len()].join(", ")
    );
    let update = format!(
        "UPDATE {quoted} SET {} WHERE {key_filter}",
        names.iter().map(|n| format!("{n} = ?")).collect::<Vec<_>>().join(", ")
    );
    let delete = format!("DELETE FROM {quoted} WHERE {key_filter}");
    let exists = format!("SELECT COUNT(*) FROM {quoted} WHERE {key_filter}");

    let row_error = |index: usize, e: &rusqlite::Error| {
        fail(format!("Table {} values row {index}: {e}", table.name))
    };

    for (index, row) in table.values.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(fail(format!(
                "Table {} values row {index} not correct length ({} != {})",
                table.name,
                row.len(),
                columns.len()
            )));
        }
        let key = key_positions.iter().map(|&i| &row[i]).collect::<Vec<_>>();
        if soft_delete.is_some_and(|i| is_flag_set(&row[i])) {
            conn.execute(&delete, params_from_iter(key.iter().copied()))
                .map_err(|e| row_error(index, &e))?;
            continue;
        }

        let present = !key.iter().any(|v| v.is_null())
            && conn
                .query_row(&exists, params_from_iter(key.iter().copied()), |r| {
                    r.get::<_, i64>(0)
                })
                .map_err(|e| row_error(index, &e))?
                > 0;
        if present {
            conn.execute(&update, params_from_iter(row.iter().chain(key.iter().copied())))
                .map_err(|e| row_error(index, &e))?;
        } else {
            conn.execute(&insert, params_from_iter(row.iter()))
                .map_err(|e| row_error(index, &e))?;
        }
    }

    if !table.deletes.is_empty() && keys.len() != 1 {
        return Err(fail(format!(
            "Table {} deletes need a single-column primary key",
            table.name
        )));
    }
    for key_value in &table.deletes {
        conn.execute(&delete, [key_value])
            .map_err(|e| fail(format!("Table {} delete {key_value}: {e}", table.name)))?;
    }
    Ok(())
}
