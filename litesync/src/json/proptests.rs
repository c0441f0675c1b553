//! Property-based tests for the document and DDL handling.

use super::ddl::{create_table_sql, parse_table_columns, parse_table_options};
use super::{is_json_valid, ColumnDef, ExportDocument, ExportMode, TableDefinition};
use crate::rows::RowSet;
use crate::value::Value;
use proptest::prelude::*;

fn column_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_ ]{0,12}[a-zA-Z0-9_]"
}

fn column_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("INTEGER".to_string()),
        Just("TEXT NOT NULL".to_string()),
        Just("TEXT DEFAULT 'a, (b)'".to_string()),
        Just("REAL DEFAULT (1.5)".to_string()),
        Just("NUMERIC(10, 2)".to_string()),
        Just("BLOB".to_string()),
    ]
}

fn cell_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Integer),
        "[ -~]{0,16}".prop_map(Value::Text),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // Generated table DDL splits back into the columns it was built from
    #[test]
    fn table_ddl_parses_back(
        columns in prop::collection::vec((column_name_strategy(), column_type_strategy()), 1..8),
        options in prop::option::of(prop_oneof![
            Just("WITHOUT ROWID".to_string()),
            Just("STRICT".to_string()),
            Just("WITHOUT ROWID, STRICT".to_string()),
        ])
    ) {
        let defs: Vec<ColumnDef> = columns
            .iter()
            .map(|(name, kind)| ColumnDef::column(name.as_str(), kind.as_str()))
            .collect();
        let sql = create_table_sql("t", &defs, options.as_deref());
        let parsed = parse_table_columns("t", &sql).unwrap();
        prop_assert_eq!(parsed, defs);
        prop_assert_eq!(parse_table_options(&sql), options);
    }

    // Comments between column entries do not change the split
    #[test]
    fn commented_table_ddl_parses_back(
        columns in prop::collection::vec((column_name_strategy(), column_type_strategy()), 1..6),
        note in "[ -~]{0,12}"
    ) {
        let defs: Vec<ColumnDef> = columns
            .iter()
            .map(|(name, kind)| ColumnDef::column(name.as_str(), kind.as_str()))
            .collect();
        let plain = create_table_sql("t", &defs, None);
        let block = note.replace('*', "");
        let commented = plain
            .replace(", \"", &format!(", -- {note}\n\""))
            .replacen('(', &format!("( /* {block} */ "), 1);
        prop_assert_eq!(parse_table_columns("t", &commented).unwrap(), defs);
    }

    // Converting to the header-first adapter shape loses nothing
    #[test]
    fn wire_shape_preserves_row_set(
        width in 1usize..5,
        cells in prop::collection::vec(cell_strategy(), 0..20)
    ) {
        let columns: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
        let rows: Vec<Vec<Value>> = cells.chunks_exact(width).map(<[Value]>::to_vec).collect();
        let set = RowSet::new(columns, rows);
        prop_assert_eq!(RowSet::from_wire(set.clone().into_wire()), set);
    }

    // Every serialized document passes validation and parses back unchanged
    #[test]
    fn serialized_documents_are_valid(
        name in "[a-z][a-z0-9_]{0,10}",
        version in 1i32..100,
        rows in prop::collection::vec(prop::collection::vec(cell_strategy(), 2), 0..6),
        deletes in prop::collection::vec(any::<i64>().prop_map(Value::Integer), 0..3)
    ) {
        let doc = ExportDocument {
            database: "prop".into(),
            version,
            encrypted: false,
            mode: ExportMode::Partial,
            overwrite: None,
            tables: vec![TableDefinition {
                name,
                schema: None,
                values: rows,
                deletes,
            }],
            views: Vec::new(),
        };
        let json = doc.to_json_string(false).unwrap();
        prop_assert!(is_json_valid(&json).is_ok());
        prop_assert_eq!(ExportDocument::from_json_str(&json).unwrap(), doc);
    }
}
