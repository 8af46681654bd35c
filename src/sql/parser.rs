//! Statement recognition and the multi-pass parse over one DDL document.

use super::cursor::{split_top_level, Cursor};
use super::segment::split_statements;
use super::table::parse_create_table;
use crate::ast::{Constraint, EnumType, ForeignKey, Index, ParseResult, Table};

/// Parse a DDL document into tables and enums.
///
/// Best effort by contract: unrecognized statements are skipped silently,
/// malformed recognized statements are skipped with a diagnostic, and the
/// result is valid even when empty. Passes run in a fixed order so that enum
/// names are known before columns are typed and all tables exist before
/// deferred constraints, indexes, and comments attach.
pub fn parse_sql(input: &str) -> ParseResult {
    let statements = split_statements(input);
    let mut result = ParseResult::default();

    for stmt in &statements {
        if is_create_type(stmt) {
            match parse_create_type(stmt) {
                Some(e) => result.enums.push(e),
                None => result.warn(format!("skipped malformed enum declaration: {stmt}")),
            }
        }
    }

    for stmt in &statements {
        if is_create_table(stmt) {
            match parse_create_table(stmt, &result.enums) {
                Ok((table, warnings)) => {
                    for w in warnings {
                        result.warn(w);
                    }
                    add_table(&mut result, table);
                }
                Err(e) => result.warn(e.to_string()),
            }
        }
    }

    for stmt in &statements {
        link_foreign_key(stmt, &mut result);
    }

    for stmt in &statements {
        attach_index(stmt, &mut result);
    }

    for stmt in &statements {
        attach_comment(stmt, &mut result);
    }

    result
}

fn add_table(result: &mut ParseResult, table: Table) {
    if result.find_table(&table.name).is_some() {
        result.warn(format!("duplicate table {} skipped", table.name));
    } else {
        result.tables.push(table);
    }
}

fn is_create_table(stmt: &str) -> bool {
    let mut c = Cursor::new(stmt);
    c.eat_keyword("CREATE") && c.eat_keyword("TABLE")
}

fn is_create_type(stmt: &str) -> bool {
    let mut c = Cursor::new(stmt);
    c.eat_keyword("CREATE") && c.eat_keyword("TYPE")
}

/// `CREATE TYPE name AS ENUM ('a', 'b', ...)`.
///
/// Quoted and bare value literals are both accepted; surrounding quotes are
/// stripped. Anything that is not an enum type declaration yields None.
fn parse_create_type(stmt: &str) -> Option<EnumType> {
    let mut c = Cursor::new(stmt);
    c.eat_keyword("CREATE");
    c.eat_keyword("TYPE");
    let name = c.read_qualified_ident()?;
    if !c.eat_keyword("AS") || !c.eat_keyword("ENUM") {
        return None;
    }
    let inner = c.read_parenthesized()?;

    let mut values = Vec::new();
    for part in split_top_level(inner, ',') {
        let mut pc = Cursor::new(part);
        let value = pc.read_string().or_else(|| pc.read_ident())?;
        values.push(value);
    }
    Some(EnumType { name, values })
}

/// `ALTER TABLE [ONLY] t ADD [CONSTRAINT name] FOREIGN KEY (...) REFERENCES ...`
///
/// The constraint attaches to the altered table, the side owning the foreign
/// key columns. An alteration naming a table that is not in the result set is
/// dropped without a diagnostic: passes over the same statement list already
/// guarantee every CREATE TABLE ran first, so a miss means the table was
/// never declared.
fn link_foreign_key(stmt: &str, result: &mut ParseResult) {
    let mut c = Cursor::new(stmt);
    if !c.eat_keyword("ALTER") || !c.eat_keyword("TABLE") {
        return;
    }
    c.eat_keyword("ONLY");
    let Some(table_name) = c.read_qualified_ident() else {
        return;
    };
    if !c.eat_keyword("ADD") {
        return;
    }
    if c.eat_keyword("CONSTRAINT") {
        c.read_ident();
    }
    if !c.eat_keyword("FOREIGN") {
        // Some other alteration; outside the subset
        return;
    }
    c.eat_keyword("KEY");

    let fk = (|| {
        let columns = c.read_ident_list()?;
        if !c.eat_keyword("REFERENCES") {
            return None;
        }
        let referenced_table = c.read_qualified_ident()?;
        let referenced_columns = match c.read_ident_list() {
            Some(cols) if cols.len() == columns.len() => cols,
            None if columns.len() == 1 => vec!["id".to_string()],
            _ => return None,
        };
        Some(ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
        })
    })();

    match fk {
        Some(fk) => {
            if let Some(table) = result.find_table_mut(&table_name) {
                table.constraints.push(Constraint::ForeignKey(fk));
            }
        }
        None => result.warn(format!("skipped malformed foreign key alteration: {stmt}")),
    }
}

/// `CREATE [UNIQUE] INDEX [name] ON t [USING method] (col [ASC|DESC], ...)`.
fn attach_index(stmt: &str, result: &mut ParseResult) {
    let mut c = Cursor::new(stmt);
    if !c.eat_keyword("CREATE") {
        return;
    }
    let unique = c.eat_keyword("UNIQUE");
    if !c.eat_keyword("INDEX") {
        return;
    }
    c.eat_keyword("CONCURRENTLY");
    if c.eat_keyword("IF") {
        c.eat_keyword("NOT");
        c.eat_keyword("EXISTS");
    }

    let mut name = None;
    if !c.peek_keyword("ON") {
        name = c.read_qualified_ident();
    }
    if !c.eat_keyword("ON") {
        result.warn(format!("skipped malformed index declaration: {stmt}"));
        return;
    }
    c.eat_keyword("ONLY");
    let Some(table_name) = c.read_qualified_ident() else {
        result.warn(format!("skipped malformed index declaration: {stmt}"));
        return;
    };

    let mut method = None;
    if c.eat_keyword("USING") {
        method = c.read_ident();
    }

    let Some(inner) = c.read_parenthesized() else {
        result.warn(format!("skipped malformed index declaration: {stmt}"));
        return;
    };

    // Direction suffixes are stripped; only the column name is kept
    let mut columns = Vec::new();
    for part in split_top_level(inner, ',') {
        if let Some(col) = Cursor::new(part).read_ident() {
            columns.push(col);
        }
    }
    if columns.is_empty() {
        result.warn(format!("skipped malformed index declaration: {stmt}"));
        return;
    }

    // An index naming an unknown table or column dangles and is dropped
    if let Some(table) = result.find_table_mut(&table_name) {
        if columns.iter().all(|c| table.find_column(c).is_some()) {
            table.indexes.push(Index {
                name,
                columns,
                unique,
                method,
            });
        }
    }
}

/// `COMMENT ON TABLE t IS '...'` / `COMMENT ON COLUMN t.c IS '...'`.
fn attach_comment(stmt: &str, result: &mut ParseResult) {
    let mut c = Cursor::new(stmt);
    if !c.eat_keyword("COMMENT") || !c.eat_keyword("ON") {
        return;
    }

    if c.eat_keyword("TABLE") {
        let target = c.read_qualified_ident().and_then(|name| {
            if !c.eat_keyword("IS") {
                return None;
            }
            c.read_string().map(|text| (name, text))
        });
        match target {
            Some((name, text)) => {
                if let Some(table) = result.find_table_mut(&name) {
                    table.comment = Some(text);
                }
            }
            None => result.warn(format!("skipped malformed comment: {stmt}")),
        }
    } else if c.eat_keyword("COLUMN") {
        let target = (|| {
            let first = c.read_ident()?;
            if !c.eat_char('.') {
                return None;
            }
            let second = c.read_ident()?;
            // Either table.column or schema.table.column
            let (table, column) = if c.eat_char('.') {
                (second, c.read_ident()?)
            } else {
                (first, second)
            };
            if !c.eat_keyword("IS") {
                return None;
            }
            let text = c.read_string()?;
            Some((table, column, text))
        })();
        match target {
            Some((table_name, column_name, text)) => {
                if let Some(col) = result
                    .find_table_mut(&table_name)
                    .and_then(|t| t.find_column_mut(&column_name))
                {
                    col.comment = Some(text);
                }
            }
            None => result.warn(format!("skipped malformed comment: {stmt}")),
        }
    }
    // COMMENT ON anything else is outside the subset
}
