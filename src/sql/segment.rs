//! Statement segmentation: comment stripping and semicolon splitting.

use std::iter::Peekable;
use std::str::Chars;

/// Split raw SQL text into trimmed, non-empty statements.
///
/// Removes `--` line comments and `/* */` block comments first, then splits
/// on semicolons that sit outside quoted strings. Never fails; text with no
/// statements yields an empty list.
pub fn split_statements(input: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                skip_line_comment(&mut chars);
                push_space(&mut current);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars);
                push_space(&mut current);
            }
            '\'' => {
                current.push(c);
                copy_quoted(&mut chars, &mut current, '\'');
            }
            '"' => {
                current.push(c);
                copy_quoted(&mut chars, &mut current, '"');
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            c if c.is_whitespace() => push_space(&mut current),
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);

    statements
}

/// Normalize runs of whitespace (and stripped comments) to a single space.
fn push_space(current: &mut String) {
    if !current.ends_with(' ') && !current.is_empty() {
        current.push(' ');
    }
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn skip_line_comment(chars: &mut Peekable<Chars>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars>) {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            break;
        }
    }
}

/// Copy a quoted run verbatim, honoring doubled-quote escapes.
fn copy_quoted(chars: &mut Peekable<Chars>, out: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        out.push(c);
        if c == quote {
            if chars.peek() == Some(&quote) {
                out.push(quote);
                chars.next();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "CREATE TABLE a (id INT)");
        assert_eq!(stmts[1], "CREATE TABLE b (id INT)");
    }

    #[test]
    fn test_strip_comments() {
        let sql = "-- header\nCREATE /* inline */ TABLE a (id INT);";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].starts_with("CREATE"));
        assert!(!stmts[0].contains("inline"));
    }

    #[test]
    fn test_semicolon_in_string() {
        let sql = "COMMENT ON TABLE a IS 'one; two';";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("'one; two'"));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let sql = "COMMENT ON TABLE a IS 'it''s; fine'; SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("it''s; fine"));
    }

    #[test]
    fn test_whitespace_normalized() {
        let sql = "CREATE   TABLE\n\ta (\n  id INT\n);";
        let stmts = split_statements(sql);
        assert_eq!(stmts[0], "CREATE TABLE a ( id INT )");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("  -- only a comment\n").is_empty());
        assert!(split_statements(";;;").is_empty());
    }
}
