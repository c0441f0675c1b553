//! Shared test utilities for database unit tests.

use tempfile::tempdir;

use crate::database::{Database, DatabaseConfig};

/// Schema of the sync-eligible fixture.
pub const SYNC_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY NOT NULL,
        email TEXT UNIQUE NOT NULL,
        name TEXT,
        sql_deleted BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1)),
        last_modified INTEGER DEFAULT (strftime('%s', 'now'))
    );
    CREATE INDEX users_index_name ON users (name);
    CREATE TABLE messages (
        id INTEGER PRIMARY KEY NOT NULL,
        userid INTEGER,
        title TEXT NOT NULL,
        sql_deleted BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1)),
        last_modified INTEGER DEFAULT (strftime('%s', 'now')),
        FOREIGN KEY (userid) REFERENCES users(id) ON DELETE SET DEFAULT
    );
";

/// Creates an open database holding `t(id INTEGER PRIMARY KEY, v TEXT)`.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
/// This is acceptable in test code where we want to fail fast.
#[must_use]
pub fn create_test_database() -> Database {
    let db = create_empty_database();
    db.connection_for(crate::Operation::Execute)
        .unwrap()
        .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
        .unwrap();
    db
}

/// Creates an open database with no user tables.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
#[must_use]
pub fn create_empty_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("testSQLite.db");
    let db = Database::connect(DatabaseConfig::new(path)).unwrap();

    // Prevent the TempDir from being dropped immediately
    std::mem::forget(dir);

    db
}

/// Creates an open database holding the sync-eligible fixture schema.
///
/// # Panics
///
/// Panics if the database cannot be created.
#[must_use]
pub fn create_sync_database() -> Database {
    let db = create_empty_database();
    db.connection_for(crate::Operation::Execute)
        .unwrap()
        .execute_batch(SYNC_SCHEMA)
        .unwrap();
    db
}
