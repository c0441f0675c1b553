//! Result rows and the header-row wire convention.
//!
//! Internally every query produces a [`RowSet`]: a column list plus rows of
//! typed cells. Adapters expect a flat sequence of maps in which the first
//! element is a synthetic header `{"ios_columns": [..]}`. That shape only
//! exists at the edge: [`RowSet::into_wire`] builds it and
//! [`RowSet::from_wire`] strips it again.

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::value::Value;

/// Reserved key of the synthetic header row.
pub const HEADER_KEY: &str = "ios_columns";

/// How many rows a row-producing statement hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnMode {
    /// Discard returned rows.
    #[default]
    No,
    /// Keep only the first returned row.
    One,
    /// Keep every returned row.
    All,
}

impl ReturnMode {
    /// The wire name (`"no"`, `"one"`, `"all"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::One => "one",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "no" => Ok(Self::No),
            "one" => Ok(Self::One),
            "all" => Ok(Self::All),
            _ => Err(Error::Validation {
                field: "return_mode".into(),
                message: format!("expected one of no, one, all; got '{s}'"),
            }),
        }
    }
}

/// One data row as an ordered column-name to cell mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowMap(Vec<(String, Value)>);

impl RowMap {
    /// Builds a row from parallel column and cell lists.
    #[must_use]
    pub fn new(columns: &[String], cells: Vec<Value>) -> Self {
        Self(columns.iter().cloned().zip(cells).collect())
    }

    /// Looks up a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Iterates `(column, cell)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the row, returning its cells in column order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0.into_iter().map(|(_, value)| value).collect()
    }
}

impl Serialize for RowMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An element of a row sequence as adapters see it.
#[derive(Debug, Clone, PartialEq)]
pub enum WireRow {
    /// The synthetic header carrying the column names.
    Columns(Vec<String>),
    /// A data row.
    Row(RowMap),
}

impl Serialize for WireRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Columns(columns) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(HEADER_KEY, columns)?;
                map.end()
            }
            Self::Row(row) => row.serialize(serializer),
        }
    }
}

/// Column names plus rows of typed cells.
///
/// # Examples
///
/// ```
/// use litesync::{RowSet, Value, WireRow};
///
/// let set = RowSet::new(vec!["cnt".into()], vec![vec![Value::Integer(1)]]);
/// let wire = set.clone().into_wire();
/// assert!(matches!(wire[0], WireRow::Columns(_)));
/// assert_eq!(RowSet::from_wire(wire), set);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Data rows, each as wide as `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Creates a row set.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column`, if present.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell at `row` / `column`, if both exist.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// Keeps the rows allowed by `mode`.
    #[must_use]
    pub fn limit(mut self, mode: ReturnMode) -> Self {
        match mode {
            ReturnMode::No => self.rows.clear(),
            ReturnMode::One => self.rows.truncate(1),
            ReturnMode::All => {}
        }
        self
    }

    /// Converts to the adapter shape: header row first, then data rows.
    #[must_use]
    pub fn into_wire(self) -> Vec<WireRow> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        let columns = self.columns;
        out.extend(
            std::iter::once(WireRow::Columns(columns.clone())).chain(
                self.rows
                    .into_iter()
                    .map(|cells| WireRow::Row(RowMap::new(&columns, cells))),
            ),
        );
        out
    }

    /// Rebuilds a row set from the adapter shape, dropping header rows.
    ///
    /// When no header is present the columns are taken from the first row.
    #[must_use]
    pub fn from_wire(wire: Vec<WireRow>) -> Self {
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        for item in wire {
            match item {
                WireRow::Columns(names) => {
                    if columns.is_empty() {
                        columns = names;
                    }
                }
                WireRow::Row(row) => {
                    if columns.is_empty() {
                        columns = row.iter().map(|(name, _)| name.to_string()).collect();
                    }
                    rows.push(row.into_values());
                }
            }
        }
        Self { columns, rows }
    }
}

/// Outcome of an execute-style call.
///
/// `last_id` is `-1` when no row was inserted; `values` follows the
/// header-row convention and is empty when no rows were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Rows changed by the call.
    pub changes: i64,
    /// Row id of the last insert, or `-1`.
    #[serde(rename = "lastId")]
    pub last_id: i64,
    /// Returned rows in wire shape.
    pub values: Vec<WireRow>,
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            changes: 0,
            last_id: -1,
            values: Vec::new(),
        }
    }
}

impl ExecutionResult {
    /// Folds the result of a later statement into this one.
    ///
    /// Changes add up, the later insert id wins, and only the first header
    /// row is kept across the concatenated values.
    pub fn absorb(&mut self, other: Self) {
        self.changes += other.changes;
        if other.last_id > 0 {
            self.last_id = other.last_id;
        }
        let has_header = self
            .values
            .iter()
            .any(|row| matches!(row, WireRow::Columns(_)));
        for row in other.values {
            if has_header && matches!(row, WireRow::Columns(_)) {
                continue;
            }
            self.values.push(row);
        }
    }

    /// Data rows, header stripped.
    pub fn data_rows(&self) -> impl Iterator<Item = &RowMap> {
        self.values.iter().filter_map(|row| match row {
            WireRow::Row(map) => Some(map),
            WireRow::Columns(_) => None,
        })
    }
}
