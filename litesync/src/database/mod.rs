//! Database layer: handle lifecycle, execution, transactions, upgrades,
//! introspection and the sync anchor.
//!
//! # Examples
//!
//! ```no_run
//! use litesync::database::{Database, DatabaseConfig, UpgradeMap};
//! use litesync::ReturnMode;
//!
//! let upgrades = UpgradeMap::new()
//!     .with_step(1, ["CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)"])
//!     .unwrap();
//! let config = DatabaseConfig::new("/tmp/notesSQLite.db")
//!     .with_version(1)
//!     .with_upgrades(upgrades);
//! let mut db = Database::connect(config).unwrap();
//!
//! let result = db
//!     .run("INSERT INTO notes(body) VALUES (?)", &["hello".into()], true, ReturnMode::No)
//!     .unwrap();
//! assert_eq!(result.changes, 1);
//!
//! for row in db.query("SELECT * FROM notes", &[]).unwrap() {
//!     println!("{row:?}");
//! }
//! ```

mod config;
mod connection;
mod executor;
pub mod migrations;
mod schema;
mod sync;
mod transaction;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{default_data_dir, resolve_data_dir, DatabaseConfig, DATABASE_SUFFIX, DATA_DIR_ENV};
pub use connection::Database;
pub use executor::SetStatement;
pub use migrations::{UpgradeMap, VersionUpgradeStep};
pub use schema::{DELETE_FLAG, LAST_MODIFIED, SYNC_TABLE};
pub use sync::{format_sync_date, parse_sync_date};

pub(crate) use executor::{execute_script, measure_changes, select};
pub(crate) use schema::{
    attached_objects, column_names, is_sync_eligible, key_columns, object_sql, quote_identifier,
    table_exists, table_names, view_names,
};
pub(crate) use sync::{create_sync_table, record_last_export, sync_anchor};
pub(crate) use transaction::run_in_transaction;
