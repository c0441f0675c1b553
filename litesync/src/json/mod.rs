//! JSON export and import.
//!
//! [`ExportDocument`] is the portable form of a database: table schemas,
//! row values, delete directives and views. [`Database::export_to_json`]
//! produces one and [`Database::import_from_json`] applies one; both come in
//! `_with` variants that report per-table progress.
//!
//! [`Database::export_to_json`]: crate::Database::export_to_json
//! [`Database::import_from_json`]: crate::Database::import_from_json

mod cipher;
pub mod ddl;
mod document;
mod export;
mod import;
mod progress;
mod validate;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use cipher::{DocumentCipher, Passthrough};
pub use document::{
    ColumnDef, EncodedDocument, ExportDocument, ExportMode, IndexDef, TableDefinition,
    TableSchema, TriggerDef, ViewDefinition,
};
pub use progress::{Direction, NoProgress, ProgressSink};
pub use validate::is_json_valid;
