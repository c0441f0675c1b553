//! The portable JSON document exchanged by export and import.
//!
//! ```json
//! {
//!   "database": "notes",
//!   "version": 2,
//!   "encrypted": false,
//!   "mode": "full",
//!   "tables": [
//!     {
//!       "name": "users",
//!       "schema": {
//!         "columns": [{"column": "id", "value": "INTEGER PRIMARY KEY NOT NULL"}],
//!         "indexes": [{"name": "users_index_name", "value": "name"}],
//!         "triggers": []
//!       },
//!       "values": [[1, "alice"]]
//!     }
//!   ],
//!   "views": [{"name": "v_users", "value": "CREATE VIEW v_users AS SELECT * FROM users"}]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

use super::validate::validate_document;

/// Whether a document carries the whole database or only changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Entire schema and data; import drops and recreates.
    #[default]
    Full,
    /// Rows changed since the sync anchor; import creates what is missing.
    Partial,
}

impl ExportMode {
    /// The wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "partial" => Ok(Self::Partial),
            _ => Err(Error::Validation {
                field: "mode".into(),
                message: format!("expected full or partial, got '{s}'"),
            }),
        }
    }
}

/// A whole exported database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Database name, without the `SQLite.db` suffix.
    pub database: String,
    /// Schema version.
    pub version: i32,
    /// Whether the source database was marked encryption-capable.
    #[serde(default)]
    pub encrypted: bool,
    /// Full or partial.
    pub mode: ExportMode,
    /// Set on cipher-encoded exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    /// Tables in catalog order.
    pub tables: Vec<TableDefinition>,
    /// Views in catalog order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewDefinition>,
}

impl ExportDocument {
    /// Validates and parses a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] naming the first problem found.
    ///
    /// # Examples
    ///
    /// ```
    /// use litesync::ExportDocument;
    ///
    /// let doc = ExportDocument::from_json_str(
    ///     r#"{"database": "db", "version": 1, "encrypted": false, "mode": "full", "tables": []}"#,
    /// ).unwrap();
    /// assert_eq!(doc.database, "db");
    ///
    /// let err = ExportDocument::from_json_str(r#"{"database": "db"}"#).unwrap_err();
    /// assert!(err.is_invalid_json());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json).map_err(|e| Error::InvalidJson {
            message: format!("not valid JSON: {e}"),
        })?;
        validate_document(&raw)?;
        serde_json::from_value(raw).map_err(|e| Error::InvalidJson {
            message: e.to_string(),
        })
    }

    /// Serializes the document, pretty-printed when `pretty` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// One table: optional schema, rows and delete directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Columns, indexes and triggers; absent when only data travels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    /// Rows in table column order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Vec<Value>>,
    /// Primary-key values of rows to delete.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<Value>,
}

/// The schema part of a table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column definitions and table constraints, in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Explicit indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Triggers.
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
    /// Options after the column list, e.g. `WITHOUT ROWID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// One entry of a table's column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnDef {
    /// A column: name and type/constraint text.
    Column {
        /// Column name.
        column: String,
        /// Type and column constraints.
        value: String,
    },
    /// A table-level foreign key.
    ForeignKey {
        /// Local column list, as written inside the parentheses.
        foreignkey: String,
        /// The `REFERENCES ...` clause.
        value: String,
    },
    /// A named table constraint.
    Constraint {
        /// Constraint name.
        constraint: String,
        /// Constraint body, e.g. `PRIMARY KEY (a, b)`.
        value: String,
    },
}

impl ColumnDef {
    /// A column entry.
    #[must_use]
    pub fn column(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Column {
            column: name.into(),
            value: value.into(),
        }
    }

    /// The column name, for column entries.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. } => Some(column),
            _ => None,
        }
    }
}

/// An index on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed column list.
    pub value: String,
    /// `UNIQUE` for unique indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Condition of a partial index.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

/// A trigger on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Trigger name.
    pub name: String,
    /// Timing and event, e.g. `AFTER UPDATE`.
    pub timeevent: String,
    /// `FOR EACH ROW` / `WHEN ...` part, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// `BEGIN ... END` body.
    pub logic: String,
}

/// A view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// View name.
    pub name: String,
    /// `CREATE VIEW` statement or bare `SELECT` body.
    pub value: String,
}

/// A cipher-encoded export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDocument {
    /// The encoded document text.
    #[serde(rename = "expData")]
    pub exp_data: String,
}

/// Accepts both the nested layout and the flat one, where `schema` is the
/// column list and `indexes` / `triggers` sit next to it.
#[derive(Deserialize)]
struct RawTable {
    name: String,
    #[serde(default)]
    schema: Option<RawSchema>,
    #[serde(default)]
    indexes: Option<Vec<IndexDef>>,
    #[serde(default)]
    triggers: Option<Vec<TriggerDef>>,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
    #[serde(default)]
    deletes: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchema {
    Flat(Vec<ColumnDef>),
    Nested(TableSchema),
}

impl TryFrom<RawTable> for TableDefinition {
    type Error = String;

    fn try_from(raw: RawTable) -> std::result::Result<Self, Self::Error> {
        let mut schema = match raw.schema {
            Some(RawSchema::Nested(schema)) => Some(schema),
            Some(RawSchema::Flat(columns)) => Some(TableSchema {
                columns,
                ..TableSchema::default()
            }),
            None if raw.indexes.is_some() || raw.triggers.is_some() || raw.options.is_some() => {
                Some(TableSchema::default())
            }
            None => None,
        };
        if let Some(schema) = schema.as_mut() {
            schema.indexes.extend(raw.indexes.unwrap_or_default());
            schema.triggers.extend(raw.triggers.unwrap_or_default());
            if raw.options.is_some() {
                schema.options = raw.options;
            }
        }
        if raw.name.trim().is_empty() {
            return Err("table name cannot be empty".to_string());
        }
        Ok(Self {
            name: raw.name,
            schema,
            values: raw.values,
            deletes: raw.deletes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_table_layout() {
        let table: TableDefinition = serde_json::from_str(
            r#"{
                "name": "users",
                "schema": {
                    "columns": [
                        {"column": "id", "value": "INTEGER PRIMARY KEY"},
                        {"foreignkey": "gid", "value": "REFERENCES groups(id)"},
                        {"constraint": "pk_x", "value": "UNIQUE (id, gid)"}
                    ],
                    "indexes": [{"name": "ix", "value": "gid", "mode": "UNIQUE"}],
                    "triggers": [{"name": "tr", "timeevent": "AFTER UPDATE", "logic": "BEGIN SELECT 1; END"}]
                },
                "values": [[1, 2]]
            }"#,
        )
        .unwrap();
        let schema = table.schema.unwrap();
        assert_eq!(schema.columns.len(), 3);
        assert!(matches!(schema.columns[1], ColumnDef::ForeignKey { .. }));
        assert!(matches!(schema.columns[2], ColumnDef::Constraint { .. }));
        assert_eq!(schema.indexes[0].mode.as_deref(), Some("UNIQUE"));
        assert_eq!(schema.triggers[0].condition, None);
        assert_eq!(table.values, vec![vec![Value::Integer(1), Value::Integer(2)]]);
    }

    #[test]
    fn test_flat_table_layout() {
        let table: TableDefinition = serde_json::from_str(
            r#"{
                "name": "users",
                "schema": [{"column": "id", "value": "INTEGER PRIMARY KEY"}],
                "indexes": [{"name": "ix", "value": "id"}]
            }"#,
        )
        .unwrap();
        let schema = table.schema.unwrap();
        assert_eq!(schema.columns[0].column_name(), Some("id"));
        assert_eq!(schema.indexes.len(), 1);
    }

    #[test]
    fn test_table_options_and_partial_index() {
        let table: TableDefinition = serde_json::from_str(
            r#"{
                "name": "kv",
                "schema": {
                    "columns": [{"column": "k", "value": "TEXT PRIMARY KEY"}],
                    "indexes": [{"name": "ix", "value": "k", "where": "k <> ''"}],
                    "options": "WITHOUT ROWID"
                }
            }"#,
        )
        .unwrap();
        let schema = table.schema.as_ref().unwrap();
        assert_eq!(schema.options.as_deref(), Some("WITHOUT ROWID"));
        assert_eq!(schema.indexes[0].where_clause.as_deref(), Some("k <> ''"));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["schema"]["options"], "WITHOUT ROWID");
        assert_eq!(json["schema"]["indexes"][0]["where"], "k <> ''");
        assert!(json["schema"]["triggers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_data_only_table() {
        let table: TableDefinition =
            serde_json::from_str(r#"{"name": "users", "values": [[1]], "deletes": [7]}"#).unwrap();
        assert!(table.schema.is_none());
        assert_eq!(table.deletes, vec![Value::Integer(7)]);
    }

    #[test]
    fn test_serialized_shape_omits_empty_parts() {
        let table = TableDefinition {
            name: "t".into(),
            schema: None,
            values: vec![vec![Value::Integer(1)]],
            deletes: Vec::new(),
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"name": "t", "values": [[1]]}));
    }

    #[test]
    fn test_export_mode_parse() {
        assert_eq!("Partial".parse::<ExportMode>().unwrap(), ExportMode::Partial);
        assert!("delta".parse::<ExportMode>().is_err());
    }
}
