//! Transaction management.
//!
//! Two kinds of transactions exist on a handle. Explicit ones are driven by
//! the caller through [`Database::begin_transaction`] and friends and may
//! span many calls. Implicit ones are opened by a single call that was asked
//! to wrap itself, and are always committed or rolled back before that call
//! returns. The engine does not nest transactions, so an implicit one is
//! refused while an explicit one is active.

use rusqlite::Connection;

use crate::error::{Error, Operation, Result};

use super::connection::Database;

const BEGIN: &str = "BEGIN TRANSACTION";
const COMMIT: &str = "COMMIT TRANSACTION";
const ROLLBACK: &str = "ROLLBACK TRANSACTION";

impl Database {
    /// Starts an explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionFailed`] if the handle is closed, a
    /// transaction is already active, or the engine refuses to begin.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use litesync::database::{Database, DatabaseConfig};
    /// use litesync::ReturnMode;
    ///
    /// let mut db = Database::connect(DatabaseConfig::new("/tmp/notesSQLite.db")).unwrap();
    /// db.begin_transaction().unwrap();
    /// db.run("INSERT INTO notes(body) VALUES (?)", &["hi".into()], false, ReturnMode::No)
    ///     .unwrap();
    /// db.commit_transaction().unwrap();
    /// ```
    pub fn begin_transaction(&mut self) -> Result<i64> {
        let operation = Operation::BeginTransaction;
        let conn = self.connection_for(operation)?;
        if self.transaction_active {
            return Err(Error::TransactionFailed {
                operation,
                message: "a transaction is already active".into(),
            });
        }
        conn.execute_batch(BEGIN)
            .map_err(|e| Error::TransactionFailed {
                operation,
                message: format!("Failed in beginTransaction {e}"),
            })?;
        self.transaction_active = true;
        log::debug!("explicit transaction started");
        Ok(0)
    }

    /// Commits the explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionFailed`] if no transaction is active or
    /// the commit fails. A failed commit leaves the transaction active so the
    /// caller can still roll back.
    pub fn commit_transaction(&mut self) -> Result<i64> {
        self.end_transaction(Operation::CommitTransaction, COMMIT)
    }

    /// Rolls back the explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionFailed`] if no transaction is active or
    /// the rollback fails.
    pub fn rollback_transaction(&mut self) -> Result<i64> {
        self.end_transaction(Operation::RollbackTransaction, ROLLBACK)
    }

    /// Whether an explicit transaction is active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionFailed`] if the handle is closed.
    pub fn is_transaction_active(&self) -> Result<bool> {
        self.connection_for(Operation::IsTransactionActive)?;
        Ok(self.transaction_active)
    }

    fn end_transaction(&mut self, operation: Operation, sql: &str) -> Result<i64> {
        let conn = self.connection_for(operation)?;
        if !self.transaction_active {
            return Err(Error::TransactionFailed {
                operation,
                message: "no transaction is active".into(),
            });
        }
        // The engine may already have ended the transaction on its own
        // (some errors force a rollback).
        if !conn.is_autocommit() {
            conn.execute_batch(sql)
                .map_err(|e| Error::TransactionFailed {
                    operation,
                    message: format!("Failed in {operation} {e}"),
                })?;
        }
        self.transaction_active = false;
        log::debug!("explicit transaction ended ({operation})");
        Ok(0)
    }

    /// Runs `body` on the connection, inside an implicit transaction when
    /// `wrap` is set.
    ///
    /// On success the implicit transaction is committed. On failure it is
    /// rolled back before the error is returned; a failed rollback is
    /// appended to the original error.
    ///
    /// # Errors
    ///
    /// Returns the error of `body`, or the `operation`'s failure variant if
    /// the handle is closed, `wrap` is requested inside an explicit
    /// transaction, or begin/commit fail.
    pub(crate) fn with_transaction<T, F>(&self, operation: Operation, wrap: bool, body: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection_for(operation)?;
        if !wrap {
            return body(conn);
        }
        if self.transaction_active {
            return Err(Error::for_operation(
                operation,
                "nested transactions are not supported: pass transaction=false inside an explicit transaction",
            ));
        }
        run_in_transaction(conn, operation, body)
    }
}

/// Begin, run `body`, then commit or roll back.
///
/// # Errors
///
/// Returns the error of `body` (with any rollback failure appended), or the
/// `operation`'s failure variant if begin or commit fail.
pub(crate) fn run_in_transaction<T, F>(conn: &Connection, operation: Operation, body: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    conn.execute_batch(BEGIN)
        .map_err(|e| Error::for_operation(operation, format!("Failed in beginTransaction {e}")))?;
    log::debug!("{operation}: implicit transaction started");

    match body(conn) {
        Ok(value) => match conn.execute_batch(COMMIT) {
            Ok(()) => {
                log::debug!("{operation}: implicit transaction committed");
                Ok(value)
            }
            Err(e) => Err(rollback_after(
                conn,
                Error::for_operation(operation, format!("Failed in commitTransaction {e}")),
            )),
        },
        Err(err) => Err(rollback_after(conn, err)),
    }
}

/// Rolls back after `err`, appending a rollback failure to it.
pub(crate) fn rollback_after(conn: &Connection, err: Error) -> Error {
    if conn.is_autocommit() {
        return err;
    }
    match conn.execute_batch(ROLLBACK) {
        Ok(()) => {
            log::debug!("implicit transaction rolled back after: {err}");
            err
        }
        Err(e) => {
            log::warn!("rollback failed: {e}");
            err.with_note(&format!("rollbackTransaction failed: {e}"))
        }
    }
}
