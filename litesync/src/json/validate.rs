//! Shape validation of import documents.
//!
//! Runs on the untyped JSON tree so the first problem can be reported with
//! its location (`tables[1].schema.columns[0]: ...`) before anything touches
//! a database.

use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};

const DOCUMENT_KEYS: &[&str] = &[
    "database",
    "version",
    "encrypted",
    "mode",
    "overwrite",
    "tables",
    "views",
];
const TABLE_KEYS: &[&str] = &[
    "name", "schema", "indexes", "triggers", "options", "values", "deletes",
];
const SCHEMA_KEYS: &[&str] = &["columns", "indexes", "triggers", "options"];
const COLUMN_KINDS: &[&str] = &["column", "foreignkey", "constraint"];

/// Checks that `json` is a well-formed import document.
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] naming the first problem found.
///
/// # Examples
///
/// ```
/// use litesync::is_json_valid;
///
/// assert!(is_json_valid(
///     r#"{"database": "db", "version": 1, "encrypted": false, "mode": "full", "tables": []}"#
/// ).is_ok());
/// assert!(is_json_valid(r#"{"database": "db", "version": 1}"#).is_err());
/// ```
pub fn is_json_valid(json: &str) -> Result<()> {
    let raw: Json = serde_json::from_str(json).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
    validate_document(&raw)
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidJson {
        message: message.into(),
    }
}

/// Validates an already-parsed document tree.
pub(crate) fn validate_document(raw: &Json) -> Result<()> {
    let doc = as_object(raw, "document")?;
    reject_unknown_keys(doc, DOCUMENT_KEYS, "document")?;

    let database = require_str(doc, "database", "document")?;
    if database.trim().is_empty() {
        return Err(invalid("database: cannot be empty"));
    }

    let version = doc
        .get("version")
        .ok_or_else(|| invalid("document: missing 'version'"))?
        .as_i64()
        .ok_or_else(|| invalid("version: must be an integer"))?;
    if version < 1 || i32::try_from(version).is_err() {
        return Err(invalid(format!("version: must be a positive 32-bit integer, got {version}")));
    }

    match doc.get("encrypted") {
        Some(Json::Bool(_)) => {}
        Some(_) => return Err(invalid("encrypted: must be a boolean")),
        None => return Err(invalid("document: missing 'encrypted'")),
    }

    let mode = require_str(doc, "mode", "document")?;
    if !matches!(mode, "full" | "partial") {
        return Err(invalid(format!("mode: expected 'full' or 'partial', got '{mode}'")));
    }

    if let Some(overwrite) = doc.get("overwrite") {
        if !overwrite.is_boolean() {
            return Err(invalid("overwrite: must be a boolean"));
        }
    }

    let tables = doc
        .get("tables")
        .ok_or_else(|| invalid("document: missing 'tables'"))?
        .as_array()
        .ok_or_else(|| invalid("tables: must be an array"))?;
    for (index, table) in tables.iter().enumerate() {
        validate_table(table, &format!("tables[{index}]"))?;
    }

    if let Some(views) = doc.get("views") {
        let views = views.as_array().ok_or_else(|| invalid("views: must be an array"))?;
        for (index, view) in views.iter().enumerate() {
            let at = format!("views[{index}]");
            let view = as_object(view, &at)?;
            reject_unknown_keys(view, &["name", "value"], &at)?;
            require_str(view, "name", &at)?;
            require_str(view, "value", &at)?;
        }
    }

    Ok(())
}

fn validate_table(raw: &Json, at: &str) -> Result<()> {
    let table = as_object(raw, at)?;
    reject_unknown_keys(table, TABLE_KEYS, at)?;
    let name = require_str(table, "name", at)?;
    if name.trim().is_empty() {
        return Err(invalid(format!("{at}.name: cannot be empty")));
    }

    match table.get("schema") {
        None => {}
        Some(Json::Array(columns)) => validate_columns(columns, &format!("{at}.schema"))?,
        Some(Json::Object(schema)) => {
            let at = format!("{at}.schema");
            reject_unknown_keys(schema, SCHEMA_KEYS, &at)?;
            if let Some(columns) = schema.get("columns") {
                let columns = columns
                    .as_array()
                    .ok_or_else(|| invalid(format!("{at}.columns: must be an array")))?;
                validate_columns(columns, &format!("{at}.columns"))?;
            }
            if let Some(indexes) = schema.get("indexes") {
                validate_indexes(indexes, &format!("{at}.indexes"))?;
            }
            if let Some(triggers) = schema.get("triggers") {
                validate_triggers(triggers, &format!("{at}.triggers"))?;
            }
            if let Some(options) = schema.get("options") {
                require_string_value(options, &format!("{at}.options"))?;
            }
        }
        Some(_) => return Err(invalid(format!("{at}.schema: must be an array or an object"))),
    }
    if let Some(indexes) = table.get("indexes") {
        validate_indexes(indexes, &format!("{at}.indexes"))?;
    }
    if let Some(triggers) = table.get("triggers") {
        validate_triggers(triggers, &format!("{at}.triggers"))?;
    }
    if let Some(options) = table.get("options") {
        require_string_value(options, &format!("{at}.options"))?;
    }

    if let Some(values) = table.get("values") {
        let rows = values
            .as_array()
            .ok_or_else(|| invalid(format!("{at}.values: must be an array")))?;
        for (index, row) in rows.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| invalid(format!("{at}.values[{index}]: must be an array")))?;
            for (column, cell) in cells.iter().enumerate() {
                validate_cell(cell, &format!("{at}.values[{index}][{column}]"))?;
            }
        }
    }

    if let Some(deletes) = table.get("deletes") {
        let keys = deletes
            .as_array()
            .ok_or_else(|| invalid(format!("{at}.deletes: must be an array")))?;
        for (index, key) in keys.iter().enumerate() {
            validate_cell(key, &format!("{at}.deletes[{index}]"))?;
        }
    }

    Ok(())
}

fn validate_columns(columns: &[Json], at: &str) -> Result<()> {
    for (index, column) in columns.iter().enumerate() {
        let at = format!("{at}[{index}]");
        let column = as_object(column, &at)?;
        let kinds: Vec<&str> = COLUMN_KINDS
            .iter()
            .copied()
            .filter(|kind| column.contains_key(*kind))
            .collect();
        match kinds.as_slice() {
            [kind] => {
                let kind = *kind;
                reject_unknown_keys(column, &[kind, "value"], &at)?;
                require_str(column, kind, &at)?;
                require_str(column, "value", &at)?;
            }
            [] => {
                return Err(invalid(format!(
                    "{at}: expected one of 'column', 'foreignkey', 'constraint'"
                )))
            }
            _ => {
                return Err(invalid(format!(
                    "{at}: only one of 'column', 'foreignkey', 'constraint' is allowed"
                )))
            }
        }
    }
    Ok(())
}

fn validate_indexes(raw: &Json, at: &str) -> Result<()> {
    let indexes = raw
        .as_array()
        .ok_or_else(|| invalid(format!("{at}: must be an array")))?;
    for (index, item) in indexes.iter().enumerate() {
        let at = format!("{at}[{index}]");
        let item = as_object(item, &at)?;
        reject_unknown_keys(item, &["name", "value", "mode", "where"], &at)?;
        require_str(item, "name", &at)?;
        require_str(item, "value", &at)?;
        if let Some(mode) = item.get("mode") {
            if !mode.as_str().is_some_and(|m| m.eq_ignore_ascii_case("UNIQUE")) {
                return Err(invalid(format!("{at}.mode: only 'UNIQUE' is supported")));
            }
        }
        if let Some(clause) = item.get("where") {
            require_string_value(clause, &format!("{at}.where"))?;
        }
    }
    Ok(())
}

fn require_string_value(raw: &Json, at: &str) -> Result<()> {
    if raw.is_string() {
        Ok(())
    } else {
        Err(invalid(format!("{at}: must be a string")))
    }
}

fn validate_triggers(raw: &Json, at: &str) -> Result<()> {
    let triggers = raw
        .as_array()
        .ok_or_else(|| invalid(format!("{at}: must be an array")))?;
    for (index, item) in triggers.iter().enumerate() {
        let at = format!("{at}[{index}]");
        let item = as_object(item, &at)?;
        reject_unknown_keys(item, &["name", "timeevent", "condition", "logic"], &at)?;
        require_str(item, "name", &at)?;
        require_str(item, "timeevent", &at)?;
        require_str(item, "logic", &at)?;
        if let Some(condition) = item.get("condition") {
            if !condition.is_string() {
                return Err(invalid(format!("{at}.condition: must be a string")));
            }
        }
    }
    Ok(())
}

fn validate_cell(cell: &Json, at: &str) -> Result<()> {
    match cell {
        Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_) => Ok(()),
        Json::Array(bytes) => {
            if bytes
                .iter()
                .all(|b| b.as_u64().is_some_and(|b| b <= u64::from(u8::MAX)))
            {
                Ok(())
            } else {
                Err(invalid(format!("{at}: blobs must be arrays of byte values")))
            }
        }
        Json::Object(_) => Err(invalid(format!("{at}: objects are not valid cell values"))),
    }
}

fn as_object<'a>(raw: &'a Json, at: &str) -> Result<&'a Map<String, Json>> {
    raw.as_object()
        .ok_or_else(|| invalid(format!("{at}: must be an object")))
}

fn require_str<'a>(object: &'a Map<String, Json>, key: &str, at: &str) -> Result<&'a str> {
    match object.get(key) {
        Some(Json::String(s)) => Ok(s),
        Some(_) => Err(invalid(format!("{at}.{key}: must be a string"))),
        None => Err(invalid(format!("{at}: missing '{key}'"))),
    }
}

fn reject_unknown_keys(object: &Map<String, Json>, allowed: &[&str], at: &str) -> Result<()> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid(format!("{at}: unexpected key '{key}'"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Json {
        json!({
            "database": "db",
            "version": 1,
            "encrypted": false,
            "mode": "full",
            "tables": [{
                "name": "users",
                "schema": [
                    {"column": "id", "value": "INTEGER PRIMARY KEY"},
                    {"column": "photo", "value": "BLOB"}
                ],
                "values": [[1, [0, 255]], [2, null]]
            }],
            "views": [{"name": "v", "value": "SELECT * FROM users"}]
        })
    }

    fn message(doc: &Json) -> String {
        validate_document(doc).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_document() {
        validate_document(&base()).unwrap();
    }

    #[test]
    fn test_missing_top_level_keys() {
        for key in ["database", "version", "encrypted", "mode", "tables"] {
            let mut doc = base();
            doc.as_object_mut().unwrap().remove(key);
            let msg = message(&doc);
            assert!(msg.starts_with("IsJsonValid: "), "{msg}");
            assert!(msg.contains(key), "{msg}");
        }
    }

    #[test]
    fn test_wrong_types() {
        let mut doc = base();
        doc["tables"] = json!({});
        assert!(message(&doc).contains("tables: must be an array"));

        let mut doc = base();
        doc["version"] = json!(0);
        assert!(message(&doc).contains("version"));

        let mut doc = base();
        doc["mode"] = json!("delta");
        assert!(message(&doc).contains("mode"));
    }

    #[test]
    fn test_unknown_key() {
        let mut doc = base();
        doc["extra"] = json!(1);
        assert!(message(&doc).contains("unexpected key 'extra'"));
    }

    #[test]
    fn test_column_entries_need_exactly_one_kind() {
        let mut doc = base();
        doc["tables"][0]["schema"] = json!([{"value": "TEXT"}]);
        assert!(message(&doc).contains("tables[0].schema[0]"));

        let mut doc = base();
        doc["tables"][0]["schema"] = json!([{"column": "a", "constraint": "b", "value": "TEXT"}]);
        assert!(message(&doc).contains("only one of"));
    }

    #[test]
    fn test_bad_cells() {
        let mut doc = base();
        doc["tables"][0]["values"] = json!([[1, {"x": 1}]]);
        assert!(message(&doc).contains("tables[0].values[0][1]"));

        let mut doc = base();
        doc["tables"][0]["values"] = json!([[1, [256]]]);
        assert!(message(&doc).contains("blobs"));

        let mut doc = base();
        doc["tables"][0]["values"] = json!([1]);
        assert!(message(&doc).contains("values[0]: must be an array"));
    }

    #[test]
    fn test_nested_schema_and_index_mode() {
        let mut doc = base();
        doc["tables"][0]["schema"] = json!({
            "columns": [{"column": "id", "value": "INTEGER"}],
            "indexes": [{"name": "ix", "value": "id", "mode": "unique"}],
            "triggers": []
        });
        validate_document(&doc).unwrap();

        doc["tables"][0]["schema"]["indexes"][0]["mode"] = json!("FULLTEXT");
        assert!(message(&doc).contains("mode"));
    }

    #[test]
    fn test_table_options_and_index_condition() {
        let mut doc = base();
        doc["tables"][0]["schema"] = json!({
            "columns": [{"column": "k", "value": "TEXT PRIMARY KEY"}],
            "indexes": [{"name": "ix", "value": "k", "where": "k <> ''"}],
            "options": "WITHOUT ROWID"
        });
        validate_document(&doc).unwrap();

        doc["tables"][0]["schema"]["indexes"][0]["where"] = json!(1);
        assert!(message(&doc).contains("indexes[0].where: must be a string"));

        doc["tables"][0]["schema"]["indexes"][0]["where"] = json!("k <> ''");
        doc["tables"][0]["schema"]["options"] = json!(["STRICT"]);
        assert!(message(&doc).contains("schema.options: must be a string"));
    }

    #[test]
    fn test_not_json() {
        assert!(is_json_valid("{not json").unwrap_err().is_invalid_json());
    }
}
