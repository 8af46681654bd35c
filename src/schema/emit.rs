//! Two-pass model construction and schema text rendering.

use std::collections::HashSet;

use unicode_width::UnicodeWidthStr;

use super::inflect::{camel_case, pascal_case, singularize};
use super::model::{Field, Model, PrismaEnum, PrismaSchema};
use super::naming::RelationNamer;
use crate::ast::{Column, Constraint, ParseResult};
use crate::sql::{is_auto_increment, prisma_scalar};

const PREAMBLE: &str = "generator client {\n  provider = \"prisma-client-js\"\n}\n\n\
                        datasource db {\n  provider = \"postgresql\"\n  url      = env(\"DATABASE_URL\")\n}\n";

/// Render a parse result as schema text.
pub fn generate(result: &ParseResult) -> String {
    render(&build_schema(result))
}

/// Build the target schema: scalar-only models first, then a second pass
/// folding relation fields onto them.
pub fn build_schema(result: &ParseResult) -> PrismaSchema {
    let enums = result
        .enums
        .iter()
        .map(|e| PrismaEnum {
            name: pascal_case(&e.name),
            sql_name: e.name.clone(),
            values: e.values.clone(),
        })
        .collect();

    let models = fold_relations(build_scalar_models(result), result);
    PrismaSchema { enums, models }
}

fn build_scalar_models(result: &ParseResult) -> Vec<Model> {
    result
        .tables
        .iter()
        .map(|table| {
            let fields = table
                .columns
                .iter()
                .map(|col| scalar_field(col, result))
                .collect();

            let composite_id = table.constraints.iter().find_map(|c| match c {
                Constraint::PrimaryKey(cols) if cols.len() > 1 => {
                    Some(cols.iter().map(|c| camel_case(c)).collect())
                }
                _ => None,
            });

            let mut uniques: Vec<Vec<String>> = table
                .constraints
                .iter()
                .filter_map(|c| match c {
                    Constraint::Unique(cols) if cols.len() > 1 => {
                        Some(cols.iter().map(|c| camel_case(c)).collect())
                    }
                    _ => None,
                })
                .collect();
            let mut indexes = Vec::new();
            for index in &table.indexes {
                let cols: Vec<String> = index.columns.iter().map(|c| camel_case(c)).collect();
                if index.unique {
                    uniques.push(cols);
                } else {
                    indexes.push(cols);
                }
            }

            Model {
                name: pascal_case(&singularize(&table.name)),
                table_name: table.name.clone(),
                fields,
                relation_fields: Vec::new(),
                composite_id,
                uniques,
                indexes,
                comment: table.comment.clone(),
            }
        })
        .collect()
}

fn scalar_field(col: &Column, result: &ParseResult) -> Field {
    let name = camel_case(&col.name);
    let field_type = if col.is_enum {
        result
            .enums
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(&col.sql_type))
            .map(|e| pascal_case(&e.name))
            .unwrap_or_else(|| pascal_case(&col.sql_type))
    } else {
        prisma_scalar(&col.sql_type).to_string()
    };

    let mut attributes = Vec::new();
    if col.is_primary_key {
        attributes.push("@id".to_string());
    }
    if col.is_unique && !col.is_primary_key {
        attributes.push("@unique".to_string());
    }
    if !col.is_enum && is_auto_increment(&col.sql_type) {
        attributes.push("@default(autoincrement())".to_string());
    } else if let Some(raw) = &col.default {
        let enum_values = if col.is_enum {
            result
                .enums
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(&col.sql_type))
                .map(|e| e.values.as_slice())
        } else {
            None
        };
        let kind = classify_default(raw, enum_values);
        attributes.push(format!("@default({})", kind.render()));
    }
    if name != col.name {
        attributes.push(format!("@map(\"{}\")", col.name));
    }

    Field {
        name,
        field_type,
        optional: col.nullable,
        is_array: false,
        attributes,
        comment: col.comment.clone(),
    }
}

/// Fold a forward and a backward relation field onto the models for every
/// foreign key, tables and constraints in declaration order. Keys referencing
/// a table or column absent from the result set are dropped here; surfacing
/// those is a validation concern, not a conversion one.
fn fold_relations(mut models: Vec<Model>, result: &ParseResult) -> Vec<Model> {
    let mut namer = RelationNamer::new();

    for table in &result.tables {
        for constraint in &table.constraints {
            let Constraint::ForeignKey(fk) = constraint else {
                continue;
            };
            let Some(referenced) = result.find_table(&fk.referenced_table) else {
                continue;
            };
            // A key naming a column that never parsed dangles like an
            // unknown table and is dropped the same way
            if !fk.columns.iter().all(|c| table.find_column(c).is_some())
                || !fk
                    .referenced_columns
                    .iter()
                    .all(|c| referenced.find_column(c).is_some())
            {
                continue;
            }
            let Some(owning_idx) = models.iter().position(|m| m.table_name == table.name) else {
                continue;
            };
            let Some(ref_idx) = models
                .iter()
                .position(|m| m.table_name == fk.referenced_table)
            else {
                continue;
            };

            let owning_fields = field_names(&models[owning_idx]);
            let referenced_fields = field_names(&models[ref_idx]);
            let (next, rel) = namer.resolve(table, fk, &owning_fields, &referenced_fields);
            namer = next;

            let fields_list = join_camel(&fk.columns);
            let references_list = join_camel(&fk.referenced_columns);

            let forward = Field {
                name: rel.forward_field,
                field_type: models[ref_idx].name.clone(),
                optional: rel.optional,
                is_array: false,
                attributes: vec![format!(
                    "@relation(\"{}\", fields: [{}], references: [{}])",
                    rel.relation_name, fields_list, references_list
                )],
                comment: None,
            };
            let backward = Field {
                name: rel.backward_field,
                field_type: models[owning_idx].name.clone(),
                optional: false,
                is_array: true,
                attributes: vec![format!("@relation(\"{}\")", rel.relation_name)],
                comment: None,
            };

            models[owning_idx].relation_fields.push(forward);
            models[ref_idx].relation_fields.push(backward);
        }
    }

    models
}

fn field_names(model: &Model) -> HashSet<String> {
    model
        .fields
        .iter()
        .chain(&model.relation_fields)
        .map(|f| f.name.clone())
        .collect()
}

fn join_camel(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| camel_case(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Closed set of recognized default-expression shapes.
#[derive(Debug, Clone, PartialEq)]
enum DefaultKind {
    Now,
    AutoIncrement,
    Uuid,
    Bool(String),
    Number(String),
    EnumValue(String),
    /// Quoted literal; also the fallback for anything unrecognized.
    Text(String),
}

impl DefaultKind {
    fn render(&self) -> String {
        match self {
            DefaultKind::Now => "now()".to_string(),
            DefaultKind::AutoIncrement => "autoincrement()".to_string(),
            DefaultKind::Uuid => "uuid()".to_string(),
            DefaultKind::Bool(v) | DefaultKind::Number(v) | DefaultKind::EnumValue(v) => {
                v.clone()
            }
            DefaultKind::Text(v) => format!("\"{}\"", escape_quotes(v)),
        }
    }
}

fn classify_default(raw: &str, enum_values: Option<&[String]>) -> DefaultKind {
    let expr = strip_cast(raw.trim());
    let lower = expr.to_lowercase();

    if lower == "now()" || lower == "current_timestamp" || lower.starts_with("current_timestamp(")
    {
        return DefaultKind::Now;
    }
    if lower.starts_with("nextval(") {
        return DefaultKind::AutoIncrement;
    }
    if lower == "gen_random_uuid()" || lower == "uuid_generate_v4()" {
        return DefaultKind::Uuid;
    }
    if lower == "true" || lower == "false" {
        return DefaultKind::Bool(lower);
    }
    if expr.parse::<f64>().is_ok() {
        return DefaultKind::Number(expr.to_string());
    }
    if expr.len() >= 2 && expr.starts_with('\'') && expr.ends_with('\'') {
        let inner = expr[1..expr.len() - 1].replace("''", "'");
        if let Some(values) = enum_values {
            if values.iter().any(|v| *v == inner) {
                return DefaultKind::EnumValue(inner);
            }
        }
        return DefaultKind::Text(inner);
    }

    DefaultKind::Text(raw.trim().to_string())
}

/// Drop a trailing `::type` cast that sits outside quotes and parentheses.
fn strip_cast(expr: &str) -> &str {
    let bytes = expr.as_bytes();
    let mut in_quote = false;
    let mut depth = 0usize;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => depth = depth.saturating_sub(1),
            b':' if !in_quote && depth == 0 => {
                if bytes.get(i + 1) == Some(&b':') {
                    return expr[..i].trim_end();
                }
            }
            _ => {}
        }
    }
    expr
}

fn escape_quotes(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn render(schema: &PrismaSchema) -> String {
    let mut out = String::from(PREAMBLE);

    for e in &schema.enums {
        out.push('\n');
        render_enum(&mut out, e);
    }
    for m in &schema.models {
        out.push('\n');
        render_model(&mut out, m);
    }

    out
}

fn render_enum(out: &mut String, e: &PrismaEnum) {
    out.push_str(&format!("enum {} {{\n", e.name));
    for value in &e.values {
        out.push_str(&format!("  {value}\n"));
    }
    if e.name != e.sql_name {
        out.push_str(&format!("\n  @@map(\"{}\")\n", e.sql_name));
    }
    out.push_str("}\n");
}

fn render_model(out: &mut String, model: &Model) {
    if let Some(comment) = &model.comment {
        for line in comment.lines() {
            out.push_str(&format!("/// {line}\n"));
        }
    }
    out.push_str(&format!("model {} {{\n", model.name));

    let name_width = model
        .fields
        .iter()
        .chain(&model.relation_fields)
        .map(|f| UnicodeWidthStr::width(f.name.as_str()))
        .max()
        .unwrap_or(0);
    let type_width = model
        .fields
        .iter()
        .chain(&model.relation_fields)
        .map(|f| UnicodeWidthStr::width(f.type_display().as_str()))
        .max()
        .unwrap_or(0);

    for field in &model.fields {
        render_field(out, field, name_width, type_width);
    }
    if !model.relation_fields.is_empty() {
        out.push('\n');
        for field in &model.relation_fields {
            render_field(out, field, name_width, type_width);
        }
    }

    let mut block_attrs = Vec::new();
    if let Some(id) = &model.composite_id {
        block_attrs.push(format!("@@id([{}])", id.join(", ")));
    }
    for unique in &model.uniques {
        block_attrs.push(format!("@@unique([{}])", unique.join(", ")));
    }
    for index in &model.indexes {
        block_attrs.push(format!("@@index([{}])", index.join(", ")));
    }
    if model.name != model.table_name {
        block_attrs.push(format!("@@map(\"{}\")", model.table_name));
    }
    if !block_attrs.is_empty() {
        out.push('\n');
        for attr in block_attrs {
            out.push_str(&format!("  {attr}\n"));
        }
    }

    out.push_str("}\n");
}

fn render_field(out: &mut String, field: &Field, name_width: usize, type_width: usize) {
    if let Some(comment) = &field.comment {
        for line in comment.lines() {
            out.push_str(&format!("  /// {line}\n"));
        }
    }
    let mut line = format!(
        "  {} {}",
        pad(&field.name, name_width),
        pad(&field.type_display(), type_width)
    );
    for attr in &field.attributes {
        line.push(' ');
        line.push_str(attr);
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn pad(text: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(w)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse_sql;

    #[test]
    fn test_scalar_model() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY, email VARCHAR(255) NOT NULL UNIQUE, display_name TEXT );",
        );
        let schema = build_schema(&result);
        let user = &schema.models[0];

        assert_eq!(user.name, "User");
        assert_eq!(user.table_name, "users");

        let id = &user.fields[0];
        assert_eq!(id.field_type, "Int");
        assert_eq!(
            id.attributes,
            vec!["@id".to_string(), "@default(autoincrement())".to_string()]
        );

        let email = &user.fields[1];
        assert_eq!(email.field_type, "String");
        assert!(!email.optional);
        assert_eq!(email.attributes, vec!["@unique".to_string()]);

        let display = &user.fields[2];
        assert_eq!(display.name, "displayName");
        assert!(display.optional);
        assert_eq!(display.attributes, vec!["@map(\"display_name\")".to_string()]);
    }

    #[test]
    fn test_relation_fields() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY );
             CREATE TABLE posts ( id SERIAL PRIMARY KEY, author_id INT NOT NULL REFERENCES users(id) );",
        );
        let schema = build_schema(&result);
        let user = &schema.models[0];
        let post = &schema.models[1];

        let forward = &post.relation_fields[0];
        assert_eq!(forward.name, "author");
        assert_eq!(forward.field_type, "User");
        assert!(!forward.optional);
        assert_eq!(
            forward.attributes,
            vec!["@relation(\"PostsToUsers_Author\", fields: [authorId], references: [id])".to_string()]
        );

        let backward = &user.relation_fields[0];
        assert_eq!(backward.name, "postsAsAuthor");
        assert_eq!(backward.field_type, "Post");
        assert!(backward.is_array);
        assert_eq!(
            backward.attributes,
            vec!["@relation(\"PostsToUsers_Author\")".to_string()]
        );
    }

    #[test]
    fn test_nullable_fk_makes_relation_optional() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY );
             CREATE TABLE posts ( id SERIAL PRIMARY KEY, editor_id INT REFERENCES users(id) );",
        );
        let schema = build_schema(&result);
        assert!(schema.models[1].relation_fields[0].optional);
    }

    #[test]
    fn test_fk_on_missing_owning_column_dropped() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY );
             CREATE TABLE posts ( id SERIAL PRIMARY KEY );
             ALTER TABLE posts ADD FOREIGN KEY (author_id) REFERENCES users (id);",
        );
        let text = generate(&result);
        assert!(!text.contains("@relation"));
        assert!(!text.contains("fields: [authorId]"));
    }

    #[test]
    fn test_fk_on_missing_referenced_column_dropped() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY );
             CREATE TABLE posts ( id SERIAL PRIMARY KEY, author_id INT REFERENCES users (nope) );",
        );
        assert!(!generate(&result).contains("@relation"));
    }

    #[test]
    fn test_composite_primary_key() {
        let result = parse_sql(
            "CREATE TABLE memberships ( user_id INT, team_id INT, PRIMARY KEY (user_id, team_id) );",
        );
        let schema = build_schema(&result);
        assert_eq!(
            schema.models[0].composite_id,
            Some(vec!["userId".to_string(), "teamId".to_string()])
        );
        let text = generate(&result);
        assert!(text.contains("@@id([userId, teamId])"));
    }

    #[test]
    fn test_enum_block_and_field() {
        let result = parse_sql(
            "CREATE TYPE order_status AS ENUM ('pending', 'shipped');
             CREATE TABLE orders ( id SERIAL PRIMARY KEY, status order_status NOT NULL DEFAULT 'pending' );",
        );
        let text = generate(&result);
        assert!(text.contains("enum OrderStatus {\n  pending\n  shipped\n"));
        assert!(text.contains("@@map(\"order_status\")"));
        assert!(text.contains("status OrderStatus @default(pending)"));
    }

    #[test]
    fn test_default_translation() {
        assert_eq!(classify_default("now()", None), DefaultKind::Now);
        assert_eq!(classify_default("CURRENT_TIMESTAMP", None), DefaultKind::Now);
        assert_eq!(
            classify_default("nextval('users_id_seq'::regclass)", None),
            DefaultKind::AutoIncrement
        );
        assert_eq!(classify_default("gen_random_uuid()", None), DefaultKind::Uuid);
        assert_eq!(
            classify_default("false", None),
            DefaultKind::Bool("false".to_string())
        );
        assert_eq!(
            classify_default("42.5", None),
            DefaultKind::Number("42.5".to_string())
        );
        assert_eq!(
            classify_default("'{}'::jsonb", None),
            DefaultKind::Text("{}".to_string())
        );
        assert_eq!(
            classify_default("'hello'", None),
            DefaultKind::Text("hello".to_string())
        );
        // Unrecognized expressions are preserved as quoted literals
        assert_eq!(
            classify_default("my_func(1)", None),
            DefaultKind::Text("my_func(1)".to_string())
        );
    }

    #[test]
    fn test_comments_rendered_as_docs() {
        let result = parse_sql(
            "CREATE TABLE users ( id SERIAL PRIMARY KEY, email TEXT );
             COMMENT ON TABLE users IS 'Registered accounts';
             COMMENT ON COLUMN users.email IS 'Login address';",
        );
        let text = generate(&result);
        assert!(text.contains("/// Registered accounts\nmodel User {"));
        assert!(text.contains("  /// Login address\n"));
    }

    #[test]
    fn test_field_columns_aligned() {
        let result = parse_sql(
            "CREATE TABLE t ( id SERIAL PRIMARY KEY, a_much_longer_name TEXT );",
        );
        let text = generate(&result);
        // Both type tokens start at the same offset
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| l.contains("Int") || l.contains("String"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].find("Int"), lines[1].find("String"));
    }

    #[test]
    fn test_indexes_and_uniques() {
        let result = parse_sql(
            "CREATE TABLE t ( id SERIAL PRIMARY KEY, a INT, b INT, UNIQUE (a, b) );
             CREATE INDEX t_a_idx ON t (a);
             CREATE UNIQUE INDEX t_b_key ON t (b);",
        );
        let text = generate(&result);
        assert!(text.contains("@@unique([a, b])"));
        assert!(text.contains("@@unique([b])"));
        assert!(text.contains("@@index([a])"));
        assert!(text.contains("@@map(\"t\")"));
    }

    #[test]
    fn test_preamble_present() {
        let text = generate(&parse_sql(""));
        assert!(text.starts_with("generator client {"));
        assert!(text.contains("datasource db {"));
    }
}
