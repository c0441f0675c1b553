//! Statement execution.
//!
//! Every execute-style call measures its effect as the delta of the engine's
//! `total_changes()` counter taken around the call, so triggers and
//! cascades are counted the way the engine counts them.

use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Operation, Result};
use crate::rows::{ExecutionResult, ReturnMode, RowSet, WireRow};
use crate::value::{bind_values, decode_row, Value};

use super::connection::Database;

/// One entry of an [`Database::execute_set`] batch.
///
/// # Examples
///
/// ```
/// use litesync::database::SetStatement;
///
/// let set: Vec<SetStatement> = serde_json::from_str(
///     r#"[{"statement": "INSERT INTO t(v) VALUES (?)", "values": ["a"]}]"#,
/// ).unwrap();
/// assert_eq!(set[0].values.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStatement {
    /// SQL text of a single statement.
    pub statement: String,
    /// Positional values bound into the statement.
    #[serde(default)]
    pub values: Vec<Value>,
}

impl SetStatement {
    /// Creates a batch entry.
    #[must_use]
    pub fn new(statement: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            statement: statement.into(),
            values,
        }
    }
}

impl Database {
    /// Executes a script of one or more statements without bound values.
    ///
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailed`] if any statement fails; with
    /// `transaction` set, everything the script did is rolled back first.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    ///
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// let changes = db
    ///     .execute(
    ///         "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, body TEXT);
    ///          INSERT INTO notes(body) VALUES ('first');",
    ///         true,
    ///     )
    ///     .unwrap();
    /// assert_eq!(changes, 1);
    /// ```
    pub fn execute(&mut self, sql: &str, transaction: bool) -> Result<i64> {
        let operation = Operation::Execute;
        self.with_transaction(operation, transaction, |conn| {
            measure_changes(conn, operation, |conn| execute_script(conn, sql, operation))
        })
    }

    /// Executes one statement with positional values.
    ///
    /// Rows produced by the statement (e.g. `RETURNING`) are kept according
    /// to `mode`, header row first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindFailed`] if `values` does not match the
    /// statement's parameters and [`Error::ExecutionFailed`] if the statement
    /// fails; with `transaction` set, its effects are rolled back first.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    /// use litesync::ReturnMode;
    ///
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// let result = db
    ///     .run("INSERT INTO notes(body) VALUES (?)", &["second".into()], true, ReturnMode::No)
    ///     .unwrap();
    /// println!("inserted row {}", result.last_id);
    /// ```
    pub fn run(
        &mut self,
        sql: &str,
        values: &[Value],
        transaction: bool,
        mode: ReturnMode,
    ) -> Result<ExecutionResult> {
        let operation = Operation::Run;
        self.with_transaction(operation, transaction, |conn| {
            execute_one(conn, sql, values, mode, operation)
        })
    }

    /// Executes a sequence of statements with their values.
    ///
    /// With `transaction` set the whole sequence runs in one transaction: a
    /// failure part-way leaves no effect of any earlier entry. Results are
    /// folded together: changes add up, the last insert id wins and only the
    /// first header row is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailed`] naming the failing entry, or
    /// [`Error::BindFailed`] for an arity mismatch.
    pub fn execute_set(
        &mut self,
        set: &[SetStatement],
        transaction: bool,
        mode: ReturnMode,
    ) -> Result<ExecutionResult> {
        let operation = Operation::ExecuteSet;
        if set.is_empty() {
            return Err(Error::ExecutionFailed {
                operation,
                message: "no statements given".into(),
            });
        }
        self.with_transaction(operation, transaction, |conn| {
            let mut total = ExecutionResult::default();
            for (index, entry) in set.iter().enumerate() {
                let result = execute_one(conn, &entry.statement, &entry.values, mode, operation)
                    .map_err(|e| e.with_note(&format!("(statement {})", index + 1)))?;
                total.absorb(result);
            }
            Ok(total)
        })
    }

    /// Runs a read-only query and returns its rows in wire shape.
    ///
    /// Never opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryFailed`] if the statement cannot be prepared,
    /// bound or stepped.
    pub fn query(&self, sql: &str, values: &[Value]) -> Result<Vec<WireRow>> {
        self.select(sql, values).map(RowSet::into_wire)
    }

    /// Runs a read-only query and returns columns and rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryFailed`] if the statement cannot be prepared,
    /// bound or stepped.
    pub fn select(&self, sql: &str, values: &[Value]) -> Result<RowSet> {
        let conn = self.connection_for(Operation::Query)?;
        select(conn, sql, values)
    }
}

/// Runs `body` and returns the `total_changes()` delta it caused.
pub(crate) fn measure_changes<F>(conn: &Connection, operation: Operation, body: F) -> Result<i64>
where
    F: FnOnce(&Connection) -> Result<()>,
{
    let before = total_changes(conn, operation)?;
    body(conn)?;
    Ok(total_changes(conn, operation)? - before)
}

pub(crate) fn total_changes(conn: &Connection, operation: Operation) -> Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
        .map_err(|e| Error::for_operation(operation, format!("Failed in totalChanges {e}")))
}

/// Steps every statement of `sql` to completion.
pub(crate) fn execute_script(conn: &Connection, sql: &str, operation: Operation) -> Result<()> {
    let fail = |e: rusqlite::Error| Error::for_operation(operation, e.to_string());
    let mut batch = Batch::new(conn, sql);
    while let Some(mut stmt) = batch.next().map_err(fail)? {
        let mut rows = stmt.query([]).map_err(fail)?;
        while rows.next().map_err(fail)?.is_some() {}
    }
    Ok(())
}

/// Prepares, binds and steps one statement.
pub(crate) fn execute_one(
    conn: &Connection,
    sql: &str,
    values: &[Value],
    mode: ReturnMode,
    operation: Operation,
) -> Result<ExecutionResult> {
    let fail = |e: rusqlite::Error| Error::for_operation(operation, e.to_string());
    let before = total_changes(conn, operation)?;

    let mut stmt = conn.prepare(sql).map_err(fail)?;
    bind_values(&mut stmt, values, operation)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut data = Vec::new();
    {
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(fail)? {
            if mode != ReturnMode::No {
                data.push(decode_row(row, columns.len()).map_err(fail)?);
            }
        }
    }
    drop(stmt);

    let changes = total_changes(conn, operation)? - before;
    let rowid = conn.last_insert_rowid();
    let values = if columns.is_empty() || mode == ReturnMode::No {
        Vec::new()
    } else {
        RowSet::new(columns, data).limit(mode).into_wire()
    };

    Ok(ExecutionResult {
        changes,
        last_id: if rowid == 0 { -1 } else { rowid },
        values,
    })
}

/// Read-only query returning columns and rows.
pub(crate) fn select(conn: &Connection, sql: &str, values: &[Value]) -> Result<RowSet> {
    let fail = |e: rusqlite::Error| Error::QueryFailed {
        message: e.to_string(),
    };
    let mut stmt = conn.prepare(sql).map_err(fail)?;
    bind_values(&mut stmt, values, Operation::Query).map_err(|e| match e {
        Error::BindFailed { message, .. } => Error::QueryFailed {
            message: format!("bind failed: {message}"),
        },
        other => other,
    })?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut data = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(fail)? {
        data.push(decode_row(row, columns.len()).map_err(fail)?);
    }
    Ok(RowSet::new(columns, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_empty_database, create_test_database};

    fn count(db: &Database) -> i64 {
        db.select("SELECT COUNT(*) AS cnt FROM t", &[])
            .unwrap()
            .get(0, "cnt")
            .and_then(Value::as_i64)
            .unwrap()
    }

    #[test]
    fn test_execute_script_counts_changes() {
        let mut db = create_test_database();
        let changes = db
            .execute(
                "INSERT INTO t(v) VALUES ('a'); INSERT INTO t(v) VALUES ('b');",
                true,
            )
            .unwrap();
        assert_eq!(changes, 2);
        assert_eq!(count(&db), 2);
    }

    #[test]
    fn test_execute_script_ddl_has_no_changes() {
        let mut db = create_empty_database();
        let changes = db
            .execute("CREATE TABLE x (id INTEGER PRIMARY KEY);", true)
            .unwrap();
        assert_eq!(changes, 0);
    }

    #[test]
    fn test_execute_script_failure_rolls_back() {
        let mut db = create_test_database();
        let err = db
            .execute(
                "INSERT INTO t(v) VALUES ('a'); INSERT INTO missing(v) VALUES ('b');",
                true,
            )
            .unwrap_err();
        assert!(matches!(err, Error::ExecutionFailed { .. }));
        assert!(err.to_string().starts_with("Execute: "));
        assert!(err.to_string().contains("missing"));
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_execute_script_with_select_steps_through() {
        let mut db = create_test_database();
        let changes = db
            .execute("SELECT 1; INSERT INTO t(v) VALUES ('a'); SELECT * FROM t;", false)
            .unwrap();
        assert_eq!(changes, 1);
    }

    #[test]
    fn test_run_insert_reports_last_id() {
        let mut db = create_test_database();
        let result = db
            .run(
                "INSERT INTO t(v) VALUES (?)",
                &[Value::from("a")],
                true,
                ReturnMode::No,
            )
            .unwrap();
        assert_eq!(result.changes, 1);
        assert_eq!(result.last_id, 1);
        assert!(result.values.is_empty());
    }

    #[test]
    fn test_run_without_insert_has_no_last_id() {
        let mut db = create_test_database();
        let result = db
            .run("UPDATE t SET v = 'x'", &[], true, ReturnMode::No)
            .unwrap();
        assert_eq!(result.changes, 0);
        assert_eq!(result.last_id, -1);
    }

    #[test]
    fn test_run_returning_modes() {
        let mut db = create_test_database();
        db.execute("INSERT INTO t(v) VALUES ('a'), ('b'), ('c')", true)
            .unwrap();

        let all = db
            .run(
                "UPDATE t SET v = upper(v) RETURNING id, v",
                &[],
                true,
                ReturnMode::All,
            )
            .unwrap();
        assert_eq!(all.changes, 3);
        assert!(matches!(&all.values[0], WireRow::Columns(c) if c == &["id", "v"]));
        assert_eq!(all.data_rows().count(), 3);

        let one = db
            .run(
                "UPDATE t SET v = lower(v) RETURNING v",
                &[],
                true,
                ReturnMode::One,
            )
            .unwrap();
        assert_eq!(one.changes, 3);
        assert_eq!(one.data_rows().count(), 1);

        let none = db
            .run("DELETE FROM t RETURNING id", &[], true, ReturnMode::No)
            .unwrap();
        assert_eq!(none.changes, 3);
        assert!(none.values.is_empty());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_run_bind_mismatch() {
        let mut db = create_test_database();
        let err = db
            .run("INSERT INTO t(id, v) VALUES (?, ?)", &[Value::Integer(1)], true, ReturnMode::No)
            .unwrap_err();
        assert!(err.is_bind_failure());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_run_failure_rolls_back_wrapped_transaction() {
        let mut db = create_test_database();
        let err = db
            .run(
                "INSERT INTO t(id, v) VALUES (1, 'a') RETURNING nonexistent",
                &[],
                true,
                ReturnMode::All,
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("Run: "));
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_execute_set_single_transaction() {
        let mut db = create_test_database();
        let set = vec![
            SetStatement::new("INSERT INTO t(id, v) VALUES (?, ?)", vec![1.into(), "a".into()]),
            SetStatement::new("INSERT INTO t(id, v) VALUES (?, ?)", vec![2.into(), "b".into()]),
        ];
        let result = db.execute_set(&set, true, ReturnMode::No).unwrap();
        assert_eq!(result.changes, 2);
        assert_eq!(result.last_id, 2);

        let failing = vec![
            SetStatement::new("INSERT INTO t(id, v) VALUES (?, ?)", vec![3.into(), "c".into()]),
            SetStatement::new("INSERT INTO t(id, v) VALUES (?, ?)", vec![1.into(), "dup".into()]),
        ];
        let err = db.execute_set(&failing, true, ReturnMode::No).unwrap_err();
        assert!(err.to_string().starts_with("ExecuteSet: "));
        assert!(err.to_string().contains("statement 2"));
        assert_eq!(count(&db), 2);
    }

    #[test]
    fn test_execute_set_keeps_first_header() {
        let mut db = create_test_database();
        let set = vec![
            SetStatement::new("INSERT INTO t(v) VALUES (?) RETURNING id", vec!["a".into()]),
            SetStatement::new("INSERT INTO t(v) VALUES (?) RETURNING id", vec!["b".into()]),
        ];
        let result = db.execute_set(&set, true, ReturnMode::All).unwrap();
        let headers = result
            .values
            .iter()
            .filter(|row| matches!(row, WireRow::Columns(_)))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(result.data_rows().count(), 2);
    }

    #[test]
    fn test_execute_set_empty_is_rejected() {
        let mut db = create_test_database();
        assert!(db.execute_set(&[], true, ReturnMode::No).is_err());
    }

    #[test]
    fn test_query_header_row() {
        let mut db = create_test_database();
        db.run("INSERT INTO t(v) VALUES (?)", &["a".into()], true, ReturnMode::No)
            .unwrap();
        let rows = db
            .query("SELECT id, v FROM t WHERE v = ?", &["a".into()])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], WireRow::Columns(c) if c == &["id", "v"]));
        match &rows[1] {
            WireRow::Row(row) => assert_eq!(row.get("v"), Some(&Value::Text("a".into()))),
            WireRow::Columns(_) => panic!("expected a data row"),
        }
    }

    #[test]
    fn test_query_failures_are_query_failed() {
        let db = create_test_database();
        let err = db.query("SELECT * FROM missing", &[]).unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }));
        let err = db.query("SELECT ?", &[]).unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }));
        assert!(err.to_string().starts_with("Query: bind failed"));
    }

    #[test]
    fn test_closed_handle() {
        let mut db = create_test_database();
        db.close().unwrap();
        assert_eq!(
            db.execute("SELECT 1", true).unwrap_err().to_string(),
            "Execute: database not opened"
        );
        assert!(matches!(
            db.query("SELECT 1", &[]).unwrap_err(),
            Error::QueryFailed { .. }
        ));
    }
}
