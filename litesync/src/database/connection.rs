//! Database handle lifecycle.
//!
//! A [`Database`] owns at most one engine connection. It is created closed,
//! opened explicitly (which runs the upgrade cycle), and closed or deleted
//! by its owner.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{Error, Operation, Result};

use super::config::DatabaseConfig;
use super::migrations::get_user_version;

/// A handle on one database file.
///
/// # Examples
///
/// ```no_run
/// use litesync::database::{Database, DatabaseConfig};
///
/// let mut db = Database::new(DatabaseConfig::new("/tmp/notesSQLite.db"));
/// assert!(!db.is_open());
/// db.open().unwrap();
/// assert!(db.is_open());
/// db.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Database {
    pub(crate) conn: Option<Connection>,
    pub(crate) config: DatabaseConfig,
    pub(crate) transaction_active: bool,
}

impl Database {
    /// Creates a closed handle for `config`.
    #[must_use]
    pub const fn new(config: DatabaseConfig) -> Self {
        Self {
            conn: None,
            config,
            transaction_active: false,
        }
    }

    /// Creates a handle and opens it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] under the same conditions as
    /// [`Database::open`].
    pub fn connect(config: DatabaseConfig) -> Result<Self> {
        let mut db = Self::new(config);
        db.open()?;
        Ok(db)
    }

    /// Opens the handle.
    ///
    /// This will:
    /// - Create the parent directory if `auto_create` is enabled
    /// - Open the file read-only or read-write+create, full mutex
    /// - Enable foreign keys and set the busy timeout
    /// - Read `sqlite_master` as a sanity check
    /// - Run the upgrade cycle when the requested version is ahead
    ///
    /// Opening an open handle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] if the configuration is invalid, the
    /// file cannot be opened or is not a database, or an upgrade step fails
    /// (the file is then restored from its backup and the handle stays
    /// closed).
    pub fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        self.config.validate().map_err(|e| Error::OpenFailed {
            message: format!("Failed in validateConfig {e}"),
        })?;

        if self.config.auto_create && !self.config.path.exists() {
            if let Some(parent) = self.config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| Error::OpenFailed {
                        message: format!("Failed in createDirectory {}: {e}", parent.display()),
                    })?;
                }
            }
        }

        let flags = if self.config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX
        } else if self.config.auto_create {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_FULL_MUTEX
        };

        let conn = Connection::open_with_flags(&self.config.path, flags).map_err(|e| {
            Error::OpenFailed {
                message: format!("Failed in openOrCreateDatabase {e}"),
            }
        })?;

        conn.busy_timeout(self.config.busy_timeout)
            .map_err(|e| Error::OpenFailed {
                message: format!("Failed in setBusyTimeout {e}"),
            })?;
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| Error::OpenFailed {
                message: format!("Failed in setForeignKeyConstraintsEnabled {e}"),
            })?;
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| Error::OpenFailed {
            message: format!("Failed in openOrCreateDatabase {e}"),
        })?;

        log::debug!("opened {}", self.config.path.display());
        self.conn = Some(conn);
        self.transaction_active = false;

        self.upgrade_on_open()
    }

    /// Closes the handle. Closing a closed handle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CloseFailed`] if a transaction is still active or
    /// the engine refuses to close; the handle then stays open.
    pub fn close(&mut self) -> Result<()> {
        if self.transaction_active {
            return Err(Error::CloseFailed {
                message: "Failed in close: a transaction is active".into(),
            });
        }
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                log::debug!("closed {}", self.config.path.display());
                Ok(())
            }
            Err((conn, e)) => {
                self.conn = Some(conn);
                Err(Error::CloseFailed {
                    message: format!("Failed in close: {e}"),
                })
            }
        }
    }

    /// Closes the handle if open, then removes the database file.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeleteFailed`] if a transaction is active, the handle
    /// cannot be closed, or the file cannot be removed.
    pub fn delete_database(&mut self) -> Result<()> {
        self.close().map_err(|e| Error::DeleteFailed {
            message: e.to_string(),
        })?;
        remove_if_exists(&self.config.path).map_err(|e| Error::DeleteFailed {
            message: format!("Failed in deleteDB {}: {e}", self.config.path.display()),
        })?;
        log::info!("deleted {}", self.config.path.display());
        Ok(())
    }

    /// Reads the stored schema version (`PRAGMA user_version`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IntrospectionFailed`] if the handle is closed or the
    /// pragma cannot be read.
    pub fn get_version(&self) -> Result<i32> {
        let conn = self.connection_for(Operation::GetVersion)?;
        get_user_version(conn)
            .map_err(|e| Error::for_operation(Operation::GetVersion, format!("Failed in getVersion {e}")))
    }

    /// Returns `true` while the handle holds an open connection.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// The handle's configuration.
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The file URL of the database, `file://<path>`.
    #[must_use]
    pub fn get_url(&self) -> String {
        format!("file://{}", self.config.path.display())
    }

    /// The open connection, or the not-opened error of `operation`.
    pub(crate) fn connection_for(&self, operation: Operation) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| Error::not_open(operation))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.transaction_active {
            if let Some(conn) = self.conn.as_ref() {
                if let Err(e) = conn.execute_batch("ROLLBACK TRANSACTION") {
                    log::warn!("rollback on drop failed: {e}");
                }
            }
        }
    }
}

pub(super) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
