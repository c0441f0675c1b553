//! Common test utilities for integration tests.
//!
//! This module provides helper functions and fixtures for testing the
//! litesync library against real database files.

use std::path::PathBuf;

use litesync::database::{Database, DatabaseConfig, UpgradeMap};

/// Schema of a database eligible for incremental sync.
#[allow(dead_code)]
pub const SYNC_SCHEMA: &str = "
    CREATE TABLE contacts (
        id INTEGER PRIMARY KEY NOT NULL,
        email TEXT UNIQUE NOT NULL,
        name TEXT,
        age INTEGER,
        sql_deleted BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1)),
        last_modified INTEGER DEFAULT (strftime('%s', 'now'))
    );
    CREATE INDEX contacts_index_email ON contacts (email);
    CREATE TRIGGER contacts_trigger_last_modified
        AFTER UPDATE ON contacts
        FOR EACH ROW WHEN NEW.last_modified < OLD.last_modified
        BEGIN
            UPDATE contacts SET last_modified = (strftime('%s', 'now')) WHERE id = OLD.id;
        END;
    CREATE TABLE messages (
        id INTEGER PRIMARY KEY NOT NULL,
        contactid INTEGER,
        title TEXT NOT NULL,
        body TEXT,
        sql_deleted BOOLEAN DEFAULT 0 CHECK (sql_deleted IN (0, 1)),
        last_modified INTEGER DEFAULT (strftime('%s', 'now')),
        FOREIGN KEY (contactid) REFERENCES contacts(id) ON DELETE SET DEFAULT
    );
";

/// Creates a path for a database file inside a fresh temporary directory.
///
/// The directory is leaked so the file outlives the helper.
#[allow(dead_code)]
pub fn temp_db_path(name: &str) -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{name}SQLite.db"));
    // Keep the temp_dir alive by forgetting it - this is a test helper
    std::mem::forget(dir);
    path
}

/// Opens a fresh database with no upgrade map.
#[allow(dead_code)]
pub fn open_fresh(name: &str) -> Database {
    Database::connect(DatabaseConfig::new(temp_db_path(name))).unwrap()
}

/// Opens a fresh database holding [`SYNC_SCHEMA`] at version 1.
#[allow(dead_code)]
pub fn open_sync_fixture(name: &str) -> Database {
    let upgrades = UpgradeMap::new().with_step(1, [SYNC_SCHEMA]).unwrap();
    let config = DatabaseConfig::new(temp_db_path(name))
        .with_version(1)
        .with_upgrades(upgrades);
    Database::connect(config).unwrap()
}

/// Every schema object as `(type, name, sql)`, ordered by name.
#[allow(dead_code)]
pub fn schema_of(db: &Database) -> Vec<(String, String, String)> {
    db.select(
        "SELECT type, name, COALESCE(sql, '') FROM sqlite_master ORDER BY name",
        &[],
    )
    .unwrap()
    .rows
    .into_iter()
    .map(|row| {
        let text = |i: usize| row[i].as_str().unwrap_or_default().to_string();
        (text(0), text(1), text(2))
    })
    .collect()
}
