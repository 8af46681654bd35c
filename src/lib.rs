pub mod ast;
pub mod schema;
pub mod sql;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Convert SQL DDL text to Prisma schema text.
///
/// Best effort: statements outside the supported subset are skipped and a
/// document with nothing recognizable still produces a valid (preamble-only)
/// schema. One synchronous call per document.
pub fn convert(source: &str) -> String {
    schema::generate(&sql::parse_sql(source))
}

/// Convert SQL DDL to Prisma schema text (wasm entry point).
#[wasm_bindgen(js_name = "sqlToPrisma")]
pub fn sql_to_prisma(source: &str) -> String {
    convert(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_schema;
    use crate::sql::parse_sql;

    #[test]
    fn test_full_pipeline() {
        let sql = r#"
            CREATE TYPE status AS ENUM ('draft', 'published');

            CREATE TABLE users (
                id SERIAL PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL DEFAULT now()
            );

            CREATE TABLE posts (
                id SERIAL PRIMARY KEY,
                author_id INT NOT NULL,
                editor_id INT,
                reviewer_id INT,
                state status NOT NULL DEFAULT 'draft',
                FOREIGN KEY (author_id) REFERENCES users (id)
            );

            ALTER TABLE posts ADD CONSTRAINT posts_editor_fk
                FOREIGN KEY (editor_id) REFERENCES users (id);
            ALTER TABLE posts ADD FOREIGN KEY (reviewer_id) REFERENCES users (id);

            COMMENT ON TABLE posts IS 'Published articles';
        "#;

        let out = convert(sql);

        assert!(out.contains("model User {"));
        assert!(out.contains("model Post {"));
        assert!(out.contains("enum Status {"));

        // Three distinct relations, disambiguated by context, no counters
        assert!(out.contains("@relation(\"PostsToUsers_Author\", fields: [authorId], references: [id])"));
        assert!(out.contains("@relation(\"PostsToUsers_Editor\", fields: [editorId], references: [id])"));
        assert!(out.contains("@relation(\"PostsToUsers_Reviewer\", fields: [reviewerId], references: [id])"));
        assert!(out.contains("postsAsAuthor"));
        assert!(out.contains("postsAsEditor"));
        assert!(out.contains("postsAsReviewer"));
        assert!(!out.contains("postsAsAuthor2"));

        // Required author, optional editor
        let schema = build_schema(&parse_sql(sql));
        let post = schema.models.iter().find(|m| m.name == "Post").unwrap();
        let author = post.relation_fields.iter().find(|f| f.name == "author").unwrap();
        let editor = post.relation_fields.iter().find(|f| f.name == "editor").unwrap();
        assert!(!author.optional);
        assert!(editor.optional);

        assert!(out.contains("/// Published articles\nmodel Post {"));
        assert!(out.contains("@@map(\"posts\")"));
    }

    #[test]
    fn test_field_names_unique_within_models() {
        let sql = r#"
            CREATE TABLE users ( id SERIAL PRIMARY KEY );
            CREATE TABLE follows (
                id SERIAL PRIMARY KEY,
                follower_id INT NOT NULL REFERENCES users (id),
                followee_id INT NOT NULL REFERENCES users (id)
            );
        "#;
        let schema = build_schema(&parse_sql(sql));
        for model in &schema.models {
            let mut seen = std::collections::HashSet::new();
            for field in model.fields.iter().chain(&model.relation_fields) {
                assert!(seen.insert(&field.name), "duplicate field {}", field.name);
            }
        }
    }

    #[test]
    fn test_statement_order_invariance_for_independent_tables() {
        let a = "CREATE TABLE alpha ( id SERIAL PRIMARY KEY, x INT );";
        let b = "CREATE TABLE beta ( id SERIAL PRIMARY KEY, y TEXT );";

        let mut ab = build_schema(&parse_sql(&format!("{a}\n{b}"))).models;
        let mut ba = build_schema(&parse_sql(&format!("{b}\n{a}"))).models;
        ab.sort_by(|l, r| l.name.cmp(&r.name));
        ba.sort_by(|l, r| l.name.cmp(&r.name));

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_dangling_foreign_key_dropped() {
        let sql = r#"
            ALTER TABLE posts ADD FOREIGN KEY (author_id) REFERENCES users (id);
            CREATE TABLE users ( id SERIAL PRIMARY KEY );
        "#;
        let out = convert(sql);
        assert!(out.contains("model User {"));
        assert!(!out.contains("@relation"));
    }

    #[test]
    fn test_identity_and_serial_emit_same_attribute() {
        let serial = convert("CREATE TABLE a ( id SERIAL PRIMARY KEY );");
        let identity =
            convert("CREATE TABLE a ( id INT GENERATED ALWAYS AS IDENTITY PRIMARY KEY );");
        assert!(serial.contains("@id @default(autoincrement())"));
        assert!(identity.contains("@id @default(autoincrement())"));
    }

    #[test]
    fn test_empty_document_yields_preamble_only() {
        let out = convert("-- nothing\n");
        assert!(out.contains("datasource db"));
        assert!(!out.contains("model "));
    }
}
