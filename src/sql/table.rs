//! CREATE TABLE parsing: body splitting, column and constraint extraction.

use super::cursor::{split_top_level, Cursor};
use crate::ast::{Column, Constraint, EnumType, ForeignKey, Table};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CREATE TABLE without a table name")]
    MissingName,
    #[error("CREATE TABLE {0}: missing column list")]
    MissingBody(String),
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("unrecognized column definition: {0}")]
    BadColumn(String),
    #[error("unrecognized table constraint: {0}")]
    BadConstraint(String),
}

enum BodyEntry {
    /// A column, plus any inline REFERENCES clause promoted to a constraint.
    Column(Column, Option<ForeignKey>),
    Constraint(Constraint),
}

/// Parse one CREATE TABLE statement.
///
/// Malformed columns or constraints inside the body are skipped and reported
/// as warning messages; the table itself still comes back with everything
/// that did parse.
pub fn parse_create_table(
    stmt: &str,
    known_enums: &[EnumType],
) -> Result<(Table, Vec<String>), TableError> {
    let mut cursor = Cursor::new(stmt);
    cursor.eat_keyword("CREATE");
    cursor.eat_keyword("TABLE");
    if cursor.eat_keyword("IF") {
        cursor.eat_keyword("NOT");
        cursor.eat_keyword("EXISTS");
    }

    let name = cursor
        .read_qualified_ident()
        .ok_or(TableError::MissingName)?;
    let body = cursor
        .read_parenthesized()
        .ok_or_else(|| TableError::MissingBody(name.clone()))?;

    let mut table = Table::new(name);
    let mut warnings = Vec::new();

    for segment in split_top_level(body, ',') {
        match parse_body_entry(segment, known_enums) {
            Ok(BodyEntry::Column(col, inline_fk)) => {
                if table.find_column(&col.name).is_some() {
                    warnings.push(format!(
                        "table {}: duplicate column {} skipped",
                        table.name, col.name
                    ));
                } else {
                    table.columns.push(col);
                    if let Some(fk) = inline_fk {
                        table.constraints.push(Constraint::ForeignKey(fk));
                    }
                }
            }
            Ok(BodyEntry::Constraint(constraint)) => table.constraints.push(constraint),
            Err(e) => warnings.push(format!("table {}: {}", table.name, e)),
        }
    }

    apply_key_constraints(&mut table);

    Ok((table, warnings))
}

/// Fold PRIMARY KEY / UNIQUE table constraints back onto their columns.
///
/// A single-column primary key becomes a column flag; composite members only
/// lose nullability (the composite constraint itself survives for emission).
fn apply_key_constraints(table: &mut Table) {
    let mut single_pks = Vec::new();
    let mut pk_members = Vec::new();
    let mut single_uniques = Vec::new();

    for constraint in &table.constraints {
        match constraint {
            Constraint::PrimaryKey(cols) => {
                pk_members.extend(cols.iter().cloned());
                if let [only] = cols.as_slice() {
                    single_pks.push(only.clone());
                }
            }
            Constraint::Unique(cols) => {
                if let [only] = cols.as_slice() {
                    single_uniques.push(only.clone());
                }
            }
            _ => {}
        }
    }

    for name in pk_members {
        if let Some(col) = table.find_column_mut(&name) {
            col.nullable = false;
        }
    }
    for name in single_pks {
        if let Some(col) = table.find_column_mut(&name) {
            col.is_primary_key = true;
            col.is_unique = true;
        }
    }
    for name in single_uniques {
        if let Some(col) = table.find_column_mut(&name) {
            col.is_unique = true;
        }
    }
}

/// Classify a body segment as a column or a table-level constraint.
///
/// A segment is a constraint only when it leads with a constraint keyword
/// (optionally behind `CONSTRAINT <name>`); a column whose definition merely
/// contains `PRIMARY KEY` or `CHECK` further in still parses as a column.
fn parse_body_entry(segment: &str, known_enums: &[EnumType]) -> Result<BodyEntry, EntryError> {
    let mut cursor = Cursor::new(segment);

    if cursor.eat_keyword("CONSTRAINT") {
        cursor.read_ident();
        return parse_table_constraint(&mut cursor, segment).map(BodyEntry::Constraint);
    }
    if cursor.peek_keyword("PRIMARY")
        || cursor.peek_keyword("FOREIGN")
        || cursor.peek_keyword("UNIQUE")
        || cursor.peek_keyword("CHECK")
    {
        return parse_table_constraint(&mut cursor, segment).map(BodyEntry::Constraint);
    }

    parse_column(&mut cursor, segment, known_enums)
        .map(|(col, fk)| BodyEntry::Column(col, fk))
}

fn parse_table_constraint(
    cursor: &mut Cursor,
    segment: &str,
) -> Result<Constraint, EntryError> {
    let bad = || EntryError::BadConstraint(segment.to_string());

    if cursor.eat_keyword("PRIMARY") {
        cursor.eat_keyword("KEY");
        let cols = cursor.read_ident_list().ok_or_else(bad)?;
        return Ok(Constraint::PrimaryKey(cols));
    }
    if cursor.eat_keyword("FOREIGN") {
        cursor.eat_keyword("KEY");
        let columns = cursor.read_ident_list().ok_or_else(bad)?;
        if !cursor.eat_keyword("REFERENCES") {
            return Err(bad());
        }
        let referenced_table = cursor.read_qualified_ident().ok_or_else(bad)?;
        let referenced_columns = match cursor.read_ident_list() {
            Some(cols) => cols,
            None if columns.len() == 1 => vec!["id".to_string()],
            None => return Err(bad()),
        };
        if referenced_columns.len() != columns.len() {
            return Err(bad());
        }
        return Ok(Constraint::ForeignKey(ForeignKey {
            columns,
            referenced_table,
            referenced_columns,
        }));
    }
    if cursor.eat_keyword("UNIQUE") {
        cursor.eat_keyword("KEY");
        let cols = cursor.read_ident_list().ok_or_else(bad)?;
        return Ok(Constraint::Unique(cols));
    }
    if cursor.eat_keyword("CHECK") {
        let expr = cursor.read_parenthesized().ok_or_else(bad)?;
        return Ok(Constraint::Check(expr.trim().to_string()));
    }

    Err(bad())
}

fn parse_column(
    cursor: &mut Cursor,
    segment: &str,
    known_enums: &[EnumType],
) -> Result<(Column, Option<ForeignKey>), EntryError> {
    let name = cursor
        .read_ident()
        .ok_or_else(|| EntryError::BadColumn(segment.to_string()))?;
    let (mut sql_type, length) = read_type(cursor)
        .ok_or_else(|| EntryError::BadColumn(segment.to_string()))?;

    let is_enum = known_enums
        .iter()
        .any(|e| e.name.eq_ignore_ascii_case(&sql_type));

    let mut col = Column {
        name,
        sql_type: String::new(),
        length,
        nullable: true,
        default: None,
        is_primary_key: false,
        is_unique: false,
        is_enum,
        comment: None,
    };
    let mut inline_fk = None;

    while !cursor.at_end() {
        if cursor.eat_keyword("NOT") {
            if cursor.eat_keyword("NULL") {
                col.nullable = false;
            }
        } else if cursor.eat_keyword("NULL") {
            // explicit nullable, the default
        } else if cursor.eat_keyword("PRIMARY") {
            cursor.eat_keyword("KEY");
            col.is_primary_key = true;
            col.nullable = false;
            col.is_unique = true;
        } else if cursor.eat_keyword("UNIQUE") {
            col.is_unique = true;
        } else if cursor.eat_keyword("DEFAULT") {
            col.default = read_default_expr(cursor);
        } else if cursor.eat_keyword("GENERATED") {
            if read_identity_clause(cursor) {
                normalize_identity_type(&mut sql_type);
            }
        } else if cursor.eat_keyword("REFERENCES") {
            inline_fk = read_inline_reference(cursor, &col.name);
        } else if cursor.eat_keyword("CHECK") {
            cursor.read_parenthesized();
        } else if cursor.eat_keyword("CONSTRAINT") {
            cursor.read_ident();
        } else if cursor.read_ident().is_none() {
            // stray punctuation; read_parenthesized also covers `(...)` runs
            if cursor.read_parenthesized().is_none() && !cursor.eat_char(',') {
                break;
            }
        }
    }

    if col.is_primary_key {
        col.nullable = false;
    }
    col.sql_type = sql_type;

    Ok((col, inline_fk))
}

/// Read the type token: base word(s), absorbing multi-word spellings, plus an
/// optional `(n[,m])` length qualifier.
fn read_type(cursor: &mut Cursor) -> Option<(String, Option<String>)> {
    let mut parts = vec![cursor.read_ident()?];
    let mut length = cursor.read_parenthesized().map(|s| s.trim().to_string());

    loop {
        if cursor.peek_keyword("PRECISION") || cursor.peek_keyword("VARYING") {
            parts.push(cursor.read_ident().unwrap_or_default());
        } else if cursor.peek_keyword("WITH") || cursor.peek_keyword("WITHOUT") {
            let saved_parts = parts.len();
            parts.push(cursor.read_ident().unwrap_or_default());
            if cursor.peek_keyword("TIME") {
                parts.push(cursor.read_ident().unwrap_or_default());
                if cursor.peek_keyword("ZONE") {
                    parts.push(cursor.read_ident().unwrap_or_default());
                } else {
                    parts.truncate(saved_parts);
                    break;
                }
            } else {
                parts.truncate(saved_parts);
                break;
            }
        } else {
            break;
        }
        if length.is_none() {
            length = cursor.read_parenthesized().map(|s| s.trim().to_string());
        }
    }

    Some((parts.join(" "), length))
}

/// Capture a default expression: one token, greedy through quotes and
/// balanced parentheses, keeping a trailing `::type` cast attached.
fn read_default_expr(cursor: &mut Cursor) -> Option<String> {
    let rest = cursor.rest();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut end = rest.len();

    for (i, c) in rest.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                if depth == 0 {
                    end = i;
                    break;
                }
                depth -= 1;
            }
            ',' if !in_quote && depth == 0 => {
                end = i;
                break;
            }
            c if c.is_whitespace() && !in_quote && depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let expr = rest[..end].trim();
    if expr.is_empty() {
        return None;
    }
    cursor.advance_by(end);
    Some(expr.to_string())
}

/// `GENERATED {ALWAYS | BY DEFAULT} AS IDENTITY [(...)]` — true on match.
fn read_identity_clause(cursor: &mut Cursor) -> bool {
    if cursor.eat_keyword("ALWAYS") || (cursor.eat_keyword("BY") && cursor.eat_keyword("DEFAULT")) {
        if cursor.eat_keyword("AS") && cursor.eat_keyword("IDENTITY") {
            cursor.read_parenthesized();
            return true;
        }
    }
    false
}

/// Identity on an integer type becomes the serial marker so downstream
/// handling of auto-incrementing columns is uniform.
fn normalize_identity_type(sql_type: &mut String) {
    let lower = sql_type.to_lowercase();
    match lower.as_str() {
        "int" | "int4" | "integer" => *sql_type = "serial".to_string(),
        "bigint" | "int8" => *sql_type = "bigserial".to_string(),
        "smallint" | "int2" => *sql_type = "smallserial".to_string(),
        _ => {}
    }
}

fn read_inline_reference(cursor: &mut Cursor, column: &str) -> Option<ForeignKey> {
    let referenced_table = cursor.read_qualified_ident()?;
    let referenced_columns = cursor
        .read_ident_list()
        .unwrap_or_else(|| vec!["id".to_string()]);
    Some(ForeignKey {
        columns: vec![column.to_string()],
        referenced_table,
        referenced_columns,
    })
}
