//! Reconstructing schema definitions from stored DDL, and back.
//!
//! The engine keeps the original `CREATE` text of every object in
//! `sqlite_master`. Export splits that text into the document's column,
//! index and trigger entries; import turns entries back into DDL. Comments
//! are removed first; after that the scanner only tracks quoting and
//! parenthesis depth, which is all the splitting needs.

use crate::database::quote_identifier;
use crate::error::{Error, Operation, Result};

use super::document::{ColumnDef, IndexDef, TriggerDef, ViewDefinition};

/// Replaces `-- ...` and `/* ... */` comments outside quoted text with
/// whitespace. Line comments keep their terminating newline.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(close) = quote {
            if ch == close {
                quote = None;
            }
            out.push(ch);
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '[' => quote = Some(']'),
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                out.push_str(" \n");
                continue;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
                out.push(' ');
                continue;
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Calls `visit(index, ch, depth)` for every character outside quoted text.
/// Both parentheses of a pair are visited at the depth surrounding them.
/// Stops early when `visit` returns `false`.
fn walk(sql: &str, mut visit: impl FnMut(usize, char, usize) -> bool) {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    for (index, ch) in sql.char_indices() {
        if let Some(close) = quote {
            if ch == close {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                continue;
            }
            '[' => {
                quote = Some(']');
                continue;
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if !visit(index, ch, depth) {
            return;
        }
        if ch == '(' {
            depth += 1;
        }
    }
}

/// Splits on `sep` at depth 0, outside quotes.
fn split_top_level(sql: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    walk(sql, |index, ch, depth| {
        if ch == sep && depth == 0 {
            parts.push(&sql[start..index]);
            start = index + ch.len_utf8();
        }
        true
    });
    parts.push(&sql[start..]);
    parts
}

/// Byte offset of the first top-level `(`.
fn first_open_paren(sql: &str) -> Option<usize> {
    let mut found = None;
    walk(sql, |index, ch, depth| {
        if ch == '(' && depth == 0 {
            found = Some(index);
            return false;
        }
        true
    });
    found
}

/// Byte offset of the `)` closing the `(` at `open`.
fn matching_paren(sql: &str, open: usize) -> Option<usize> {
    let mut target = None;
    let mut found = None;
    walk(sql, |index, ch, depth| {
        if index == open {
            target = Some(depth);
        } else if ch == ')' && target == Some(depth) && index > open {
            found = Some(index);
            return false;
        }
        true
    });
    found
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Byte offset of `keyword` as a whole word at depth 0, case-insensitive.
fn find_keyword(sql: &str, keyword: &str) -> Option<usize> {
    let mut found = None;
    let mut previous: Option<char> = None;
    walk(sql, |index, ch, depth| {
        let at_boundary = previous.map_or(true, |p| !is_word_char(p));
        previous = Some(ch);
        if depth != 0 || !at_boundary {
            return true;
        }
        let candidate = sql.get(index..index + keyword.len());
        let next = sql[index..].chars().nth(keyword.chars().count());
        if candidate.is_some_and(|c| c.eq_ignore_ascii_case(keyword))
            && next.map_or(true, |n| !is_word_char(n))
        {
            found = Some(index);
            return false;
        }
        true
    });
    found
}

/// Collapses whitespace runs outside quoted text into single spaces.
fn normalize_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for ch in sql.trim().chars() {
        if quote.is_none() && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match quote {
            Some(close) if ch == close => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '[' => quote = Some(']'),
                _ => {}
            },
        }
        out.push(ch);
    }
    out
}

/// Splits a leading identifier (quoted or bare) off `sql`.
fn split_identifier(sql: &str) -> (String, &str) {
    let sql = sql.trim_start();
    let mut chars = sql.char_indices();
    let close = match chars.next() {
        Some((_, '"')) => '"',
        Some((_, '`')) => '`',
        Some((_, '[')) => ']',
        Some(_) => {
            let end = sql
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(sql.len());
            return (sql[..end].to_string(), &sql[end..]);
        }
        None => return (String::new(), ""),
    };

    let mut name = String::new();
    let mut iter = sql.char_indices().skip(1).peekable();
    while let Some((index, ch)) = iter.next() {
        if ch == close {
            if close != ']' && iter.peek().is_some_and(|&(_, next)| next == close) {
                name.push(ch);
                iter.next();
                continue;
            }
            return (name, &sql[index + ch.len_utf8()..]);
        }
        name.push(ch);
    }
    (name, "")
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && sql[keyword.len()..]
            .chars()
            .next()
            .map_or(true, |next| !is_word_char(next))
}

fn malformed(kind: &str, name: &str, sql: &str) -> Error {
    Error::ExportFailed {
        operation: Operation::ExportToJson,
        message: format!("cannot parse {kind} '{name}': {sql}"),
    }
}

/// Identifier list inside the first parentheses of `sql`, joined by `_`.
fn constraint_suffix(sql: &str) -> String {
    let inner = first_open_paren(sql)
        .and_then(|open| matching_paren(sql, open).map(|close| &sql[open + 1..close]))
        .unwrap_or_default();
    inner
        .split(',')
        .map(|part| split_identifier(part).0)
        .filter(|name| !name.is_empty())
        .map(|name| name.chars().filter(|c| is_word_char(*c)).collect::<String>())
        .collect::<Vec<_>>()
        .join("_")
}

fn classify(table: &str, item: &str, position: usize) -> ColumnDef {
    let quoted = item.starts_with(['"', '`', '[']);
    if !quoted {
        if starts_with_keyword(item, "CONSTRAINT") {
            let (name, rest) = split_identifier(&item["CONSTRAINT".len()..]);
            return ColumnDef::Constraint {
                constraint: name,
                value: rest.trim().to_string(),
            };
        }
        if starts_with_keyword(item, "FOREIGN") {
            if let Some(open) = first_open_paren(item) {
                if let Some(close) = matching_paren(item, open) {
                    return ColumnDef::ForeignKey {
                        foreignkey: item[open + 1..close].trim().to_string(),
                        value: item[close + 1..].trim().to_string(),
                    };
                }
            }
        }
        let prefix = if starts_with_keyword(item, "PRIMARY") {
            Some("pk")
        } else if starts_with_keyword(item, "UNIQUE") {
            Some("uq")
        } else if starts_with_keyword(item, "CHECK") {
            Some("ck")
        } else {
            None
        };
        if let Some(prefix) = prefix {
            let suffix = if prefix == "ck" {
                position.to_string()
            } else {
                constraint_suffix(item)
            };
            return ColumnDef::Constraint {
                constraint: format!("{prefix}_{table}_{suffix}"),
                value: item.to_string(),
            };
        }
    }
    let (name, rest) = split_identifier(item);
    ColumnDef::Column {
        column: name,
        value: rest.trim().to_string(),
    }
}

/// Splits a stored `CREATE TABLE` statement into column entries.
///
/// Unnamed table constraints receive a generated name: `pk_<table>_<cols>`,
/// `uq_<table>_<cols>` or `ck_<table>_<position>`.
///
/// # Errors
///
/// Returns [`Error::ExportFailed`] if the column list cannot be located.
pub fn parse_table_columns(table: &str, sql: &str) -> Result<Vec<ColumnDef>> {
    let sql = strip_comments(sql);
    let open = first_open_paren(&sql).ok_or_else(|| malformed("table", table, &sql))?;
    let close = matching_paren(&sql, open).ok_or_else(|| malformed("table", table, &sql))?;
    Ok(split_top_level(&sql[open + 1..close], ',')
        .into_iter()
        .map(normalize_whitespace)
        .filter(|item| !item.is_empty())
        .enumerate()
        .map(|(position, item)| classify(table, &item, position))
        .collect())
}

/// Table options following the column list, e.g. `WITHOUT ROWID` or
/// `STRICT`. `None` when the statement has none.
#[must_use]
pub fn parse_table_options(sql: &str) -> Option<String> {
    let sql = strip_comments(sql);
    let close = first_open_paren(&sql).and_then(|open| matching_paren(&sql, open))?;
    let options = normalize_whitespace(sql[close + 1..].trim().trim_end_matches(';'));
    (!options.is_empty()).then_some(options)
}

/// Splits a stored `CREATE [UNIQUE] INDEX` statement.
///
/// # Errors
///
/// Returns [`Error::ExportFailed`] if the statement has no column list.
pub fn parse_index(name: &str, sql: &str) -> Result<IndexDef> {
    let sql = normalize_whitespace(&strip_comments(sql));
    let unique = find_keyword(&sql, "UNIQUE").is_some_and(|u| {
        find_keyword(&sql, "INDEX").is_some_and(|i| u < i)
    });
    let on = find_keyword(&sql, "ON").ok_or_else(|| malformed("index", name, &sql))?;
    let tail = &sql[on..];
    let open = first_open_paren(tail).ok_or_else(|| malformed("index", name, &sql))?;
    let close = matching_paren(tail, open).ok_or_else(|| malformed("index", name, &sql))?;
    let rest = &tail[close + 1..];
    let where_clause = find_keyword(rest, "WHERE")
        .map(|w| rest[w + "WHERE".len()..].trim().trim_end_matches(';').trim())
        .filter(|clause| !clause.is_empty())
        .map(str::to_string);
    Ok(IndexDef {
        name: name.to_string(),
        value: tail[open + 1..close].trim().to_string(),
        mode: unique.then(|| "UNIQUE".to_string()),
        where_clause,
    })
}

/// Splits a stored `CREATE TRIGGER` statement.
///
/// # Errors
///
/// Returns [`Error::ExportFailed`] if the `ON` or `BEGIN` keyword is missing.
pub fn parse_trigger(name: &str, sql: &str) -> Result<TriggerDef> {
    let sql = normalize_whitespace(&strip_comments(sql));
    let after_keyword = find_keyword(&sql, "TRIGGER")
        .map(|t| &sql[t + "TRIGGER".len()..])
        .ok_or_else(|| malformed("trigger", name, &sql))?
        .trim_start();
    let after_keyword = if starts_with_keyword(after_keyword, "IF") {
        find_keyword(after_keyword, "EXISTS")
            .map_or(after_keyword, |e| &after_keyword[e + "EXISTS".len()..])
    } else {
        after_keyword
    };
    let (_, rest) = split_identifier(after_keyword);

    let on = find_keyword(rest, "ON").ok_or_else(|| malformed("trigger", name, &sql))?;
    let timeevent = rest[..on].trim().to_string();
    let (_, tail) = split_identifier(&rest[on + "ON".len()..]);
    let begin = find_keyword(tail, "BEGIN").ok_or_else(|| malformed("trigger", name, &sql))?;
    let condition = tail[..begin].trim();

    Ok(TriggerDef {
        name: name.to_string(),
        timeevent,
        condition: (!condition.is_empty()).then(|| condition.to_string()),
        logic: tail[begin..].trim().to_string(),
    })
}

/// `CREATE TABLE IF NOT EXISTS` for `columns`, followed by `options`.
#[must_use]
pub fn create_table_sql(table: &str, columns: &[ColumnDef], options: Option<&str>) -> String {
    let items: Vec<String> = columns
        .iter()
        .map(|def| match def {
            ColumnDef::Column { column, value } => {
                format!("{} {value}", quote_identifier(column))
                    .trim_end()
                    .to_string()
            }
            ColumnDef::ForeignKey { foreignkey, value } => {
                format!("FOREIGN KEY ({foreignkey}) {value}")
            }
            ColumnDef::Constraint { constraint, value } => {
                format!("CONSTRAINT {} {value}", quote_identifier(constraint))
            }
        })
        .collect();
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table),
        items.join(", ")
    );
    if let Some(options) = options.map(str::trim).filter(|o| !o.is_empty()) {
        sql.push(' ');
        sql.push_str(options);
    }
    sql
}

/// `CREATE [UNIQUE] INDEX IF NOT EXISTS` for `index` on `table`.
#[must_use]
pub fn create_index_sql(table: &str, index: &IndexDef) -> String {
    let unique = index
        .mode
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case("UNIQUE"));
    let mut sql = format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        quote_identifier(&index.name),
        quote_identifier(table),
        index.value
    );
    if let Some(clause) = index.where_clause.as_deref().map(str::trim) {
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
    }
    sql
}

/// `CREATE TRIGGER IF NOT EXISTS` for `trigger` on `table`.
#[must_use]
pub fn create_trigger_sql(table: &str, trigger: &TriggerDef) -> String {
    let mut sql = format!(
        "CREATE TRIGGER IF NOT EXISTS {} {} ON {}",
        quote_identifier(&trigger.name),
        trigger.timeevent.trim(),
        quote_identifier(table)
    );
    if let Some(condition) = trigger.condition.as_deref().map(str::trim) {
        if !condition.is_empty() {
            sql.push(' ');
            sql.push_str(condition);
        }
    }
    sql.push(' ');
    sql.push_str(trigger.logic.trim());
    sql
}

/// The statement creating `view`: its own `CREATE VIEW` text, or one built
/// around a bare `SELECT` body.
#[must_use]
pub fn create_view_sql(view: &ViewDefinition) -> String {
    let value = view.value.trim().trim_end_matches(';');
    if starts_with_keyword(value, "CREATE") {
        value.to_string()
    } else {
        format!(
            "CREATE VIEW IF NOT EXISTS {} AS {value}",
            quote_identifier(&view.name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_columns() {
        let sql = r#"CREATE TABLE messages (
            id INTEGER PRIMARY KEY NOT NULL,
            "user id" INTEGER,
            title TEXT DEFAULT 'a, b',
            amount NUMERIC(10, 2),
            FOREIGN KEY ("user id") REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (id, title),
            CHECK (amount > 0),
            CONSTRAINT uniq_title UNIQUE (title)
        )"#;
        let columns = parse_table_columns("messages", sql).unwrap();
        assert_eq!(
            columns,
            vec![
                ColumnDef::column("id", "INTEGER PRIMARY KEY NOT NULL"),
                ColumnDef::column("user id", "INTEGER"),
                ColumnDef::column("title", "TEXT DEFAULT 'a, b'"),
                ColumnDef::column("amount", "NUMERIC(10, 2)"),
                ColumnDef::ForeignKey {
                    foreignkey: "\"user id\"".into(),
                    value: "REFERENCES users(id) ON DELETE CASCADE".into(),
                },
                ColumnDef::Constraint {
                    constraint: "pk_messages_id_title".into(),
                    value: "PRIMARY KEY (id, title)".into(),
                },
                ColumnDef::Constraint {
                    constraint: "ck_messages_6".into(),
                    value: "CHECK (amount > 0)".into(),
                },
                ColumnDef::Constraint {
                    constraint: "uniq_title".into(),
                    value: "UNIQUE (title)".into(),
                },
            ]
        );
    }

    #[test]
    fn test_generated_table_parses_back_identically() {
        let columns = vec![
            ColumnDef::column("id", "INTEGER PRIMARY KEY NOT NULL"),
            ColumnDef::column("name", "TEXT"),
            ColumnDef::ForeignKey {
                foreignkey: "name".into(),
                value: "REFERENCES other(name)".into(),
            },
            ColumnDef::Constraint {
                constraint: "uq_t_name".into(),
                value: "UNIQUE (name)".into(),
            },
        ];
        let sql = create_table_sql("t", &columns, None);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"t\" ("));
        assert_eq!(parse_table_columns("t", &sql).unwrap(), columns);
    }

    #[test]
    fn test_parse_index() {
        let index = parse_index(
            "users_index_name",
            "CREATE INDEX users_index_name ON users (name, email)",
        )
        .unwrap();
        assert_eq!(index.value, "name, email");
        assert_eq!(index.mode, None);

        let index = parse_index("ux", "CREATE UNIQUE INDEX ux ON \"users\"(email)").unwrap();
        assert_eq!(index.mode.as_deref(), Some("UNIQUE"));
        assert_eq!(
            create_index_sql("users", &index),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"ux\" ON \"users\" (email)"
        );
    }

    #[test]
    fn test_comments_are_ignored() {
        let sql = "CREATE TABLE notes (
            id INTEGER PRIMARY KEY, -- the author's id, (see below)
            body TEXT /* it's free text, maybe ( */ NOT NULL,
            tag TEXT DEFAULT '--not a comment'
        ) -- trailing";
        assert_eq!(
            parse_table_columns("notes", sql).unwrap(),
            vec![
                ColumnDef::column("id", "INTEGER PRIMARY KEY"),
                ColumnDef::column("body", "TEXT NOT NULL"),
                ColumnDef::column("tag", "TEXT DEFAULT '--not a comment'"),
            ]
        );
        assert_eq!(parse_table_options(sql), None);

        let index = parse_index("ix", "CREATE INDEX ix /* it's */ ON notes (body) -- done").unwrap();
        assert_eq!(index.value, "body");
        assert_eq!(index.where_clause, None);

        let trigger = parse_trigger(
            "tr",
            "CREATE TRIGGER tr -- when's this?\n AFTER INSERT ON notes BEGIN SELECT 1; END",
        )
        .unwrap();
        assert_eq!(trigger.timeevent, "AFTER INSERT");
    }

    #[test]
    fn test_table_options_are_kept() {
        let sql = "CREATE TABLE kv (k TEXT PRIMARY KEY, v BLOB)\n  WITHOUT ROWID, STRICT;";
        let options = parse_table_options(sql);
        assert_eq!(options.as_deref(), Some("WITHOUT ROWID, STRICT"));

        let columns = parse_table_columns("kv", sql).unwrap();
        let regenerated = create_table_sql("kv", &columns, options.as_deref());
        assert!(regenerated.ends_with(") WITHOUT ROWID, STRICT"));
        assert_eq!(parse_table_options(&regenerated), options);
        assert_eq!(parse_table_options("CREATE TABLE t (a)"), None);
    }

    #[test]
    fn test_partial_index_keeps_where_clause() {
        let index = parse_index(
            "ix_active",
            "CREATE INDEX ix_active ON users (name) WHERE deleted = 0 AND name <> '(x)';",
        )
        .unwrap();
        assert_eq!(index.value, "name");
        assert_eq!(index.where_clause.as_deref(), Some("deleted = 0 AND name <> '(x)'"));
        let regenerated = create_index_sql("users", &index);
        assert_eq!(
            regenerated,
            "CREATE INDEX IF NOT EXISTS \"ix_active\" ON \"users\" (name) WHERE deleted = 0 AND name <> '(x)'"
        );
        assert_eq!(parse_index("ix_active", &regenerated).unwrap(), index);
    }

    #[test]
    fn test_parse_trigger() {
        let sql = "CREATE TRIGGER users_trigger_last_modified
            AFTER UPDATE ON users
            FOR EACH ROW WHEN NEW.last_modified < OLD.last_modified
            BEGIN
                UPDATE users SET last_modified = (strftime('%s', 'now')) WHERE id = OLD.id;
            END";
        let trigger = parse_trigger("users_trigger_last_modified", sql).unwrap();
        assert_eq!(trigger.timeevent, "AFTER UPDATE");
        assert_eq!(
            trigger.condition.as_deref(),
            Some("FOR EACH ROW WHEN NEW.last_modified < OLD.last_modified")
        );
        assert!(trigger.logic.starts_with("BEGIN UPDATE users"));
        assert!(trigger.logic.ends_with("END"));

        let regenerated = create_trigger_sql("users", &trigger);
        assert_eq!(
            parse_trigger("users_trigger_last_modified", &regenerated).unwrap(),
            trigger
        );
    }

    #[test]
    fn test_trigger_without_condition() {
        let trigger = parse_trigger(
            "tr",
            "CREATE TRIGGER IF NOT EXISTS tr BEFORE DELETE ON t BEGIN SELECT 1; END",
        )
        .unwrap();
        assert_eq!(trigger.timeevent, "BEFORE DELETE");
        assert_eq!(trigger.condition, None);
    }

    #[test]
    fn test_create_view_sql() {
        let full = ViewDefinition {
            name: "v".into(),
            value: "CREATE VIEW v AS SELECT 1;".into(),
        };
        assert_eq!(create_view_sql(&full), "CREATE VIEW v AS SELECT 1");

        let body = ViewDefinition {
            name: "v".into(),
            value: "SELECT 1".into(),
        };
        assert_eq!(create_view_sql(&body), "CREATE VIEW IF NOT EXISTS \"v\" AS SELECT 1");
    }

    #[test]
    fn test_scanner_helpers() {
        assert_eq!(split_top_level("a, f(b, c), 'd,e'", ','), vec!["a", " f(b, c)", " 'd,e'"]);
        assert_eq!(normalize_whitespace("  a \n\t b  'x  y' "), "a b 'x  y'");
        assert_eq!(find_keyword("CONTROL ON t", "ON"), Some(8));
        assert_eq!(find_keyword("f(ON) x", "ON"), None);
        assert_eq!(split_identifier("\"a \"\"b\"\" c\" TEXT"), ("a \"b\" c".to_string(), " TEXT"));
        assert_eq!(strip_comments("a -- x\nb /* y */c '--z'"), "a  \nb  c '--z'");
    }
}
