#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # litesync
//!
//! A transactional access layer over embedded SQLite databases.
//!
//! This library opens database files (running versioned upgrades with a
//! backup and restore), executes statements inside implicit or explicit
//! transactions, introspects the schema, and converts whole databases to and
//! from a portable JSON document with incremental sync support.
//!
//! ## Core Types
//!
//! - [`Database`] and [`DatabaseConfig`]: Handle lifecycle and settings
//! - [`Value`], [`RowSet`] and [`ExecutionResult`]: Bound values and results
//! - [`ExportDocument`]: The JSON export/import document
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use litesync::{RowSet, Value, WireRow};
//!
//! let rows = RowSet::new(
//!     vec!["id".to_string(), "name".to_string()],
//!     vec![vec![Value::Integer(1), Value::from("alice")]],
//! );
//! let wire = rows.into_wire();
//! assert!(matches!(wire[0], WireRow::Columns(_)));
//! assert_eq!(wire.len(), 2);
//! ```

pub mod database;
pub mod error;
pub mod json;
pub mod logging;
pub mod rows;
pub mod value;

// Re-export key types at crate root for convenience
pub use database::{Database, DatabaseConfig, SetStatement, UpgradeMap};
pub use error::{Error, Operation, Result};
pub use json::{
    is_json_valid, DocumentCipher, Direction, EncodedDocument, ExportDocument, ExportMode,
    NoProgress, Passthrough, ProgressSink, TableDefinition,
};
pub use logging::{init_logger, install_logger, LogLevel, Logger};
pub use rows::{ExecutionResult, ReturnMode, RowMap, RowSet, WireRow, HEADER_KEY};
pub use value::Value;
