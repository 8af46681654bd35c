//! Character cursor over a single normalized statement.

/// Scanning cursor with keyword, identifier, and balanced-paren helpers.
///
/// Statements arrive whitespace-normalized from the segmenter, so the cursor
/// only ever deals with single spaces between tokens.
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    pub fn skip_ws(&mut self) {
        while self
            .bytes()
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.text.len()
    }

    pub fn rest(&mut self) -> &'a str {
        self.skip_ws();
        &self.text[self.pos..]
    }

    /// Advance past `n` bytes just inspected via `rest`.
    pub fn advance_by(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.text.len());
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Consume `kw` as a whole word, case-insensitively.
    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let rest = &self.text[self.pos..];
        if let Some(head) = rest.get(..kw.len()) {
            if head.eq_ignore_ascii_case(kw) {
                let boundary = rest[kw.len()..]
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_alphanumeric() && c != '_');
                if boundary {
                    self.pos += kw.len();
                    return true;
                }
            }
        }
        false
    }

    pub fn peek_keyword(&mut self, kw: &str) -> bool {
        let saved = self.pos;
        let matched = self.eat_keyword(kw);
        self.pos = saved;
        matched
    }

    pub fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek_char() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Read a quoted (`"..."` or `` `...` ``) or bare identifier.
    pub fn read_ident(&mut self) -> Option<String> {
        self.skip_ws();
        match self.peek_char() {
            Some(q @ ('"' | '`')) => {
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek_char() {
                    if c == q {
                        let ident = self.text[start..self.pos].to_string();
                        self.pos += 1;
                        return Some(ident);
                    }
                    self.pos += c.len_utf8();
                }
                None
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                while self
                    .peek_char()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
                {
                    self.pos += 1;
                }
                Some(self.text[start..self.pos].to_string())
            }
            _ => None,
        }
    }

    /// Read an identifier, dropping a leading `schema.` qualifier.
    pub fn read_qualified_ident(&mut self) -> Option<String> {
        let first = self.read_ident()?;
        if self.eat_char('.') {
            self.read_ident()
        } else {
            Some(first)
        }
    }

    /// Read a `'...'` string literal, collapsing doubled-quote escapes.
    pub fn read_string(&mut self) -> Option<String> {
        self.skip_ws();
        if self.peek_char() != Some('\'') {
            return None;
        }
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == '\'' {
                if self.peek_char() == Some('\'') {
                    out.push('\'');
                    self.pos += 1;
                } else {
                    return Some(out);
                }
            } else {
                out.push(c);
            }
        }
        None
    }

    /// Read a balanced `( ... )` group and return the inner text.
    pub fn read_parenthesized(&mut self) -> Option<&'a str> {
        self.skip_ws();
        if self.peek_char() != Some('(') {
            return None;
        }
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1usize;
        let mut in_quote = false;
        while let Some(c) = self.peek_char() {
            match c {
                '\'' => in_quote = !in_quote,
                '(' if !in_quote => depth += 1,
                ')' if !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.text[start..self.pos];
                        self.pos += 1;
                        return Some(inner);
                    }
                }
                _ => {}
            }
            self.pos += c.len_utf8();
        }
        None
    }

    /// Read a parenthesized identifier list: `(a, b, c)`.
    pub fn read_ident_list(&mut self) -> Option<Vec<String>> {
        let inner = self.read_parenthesized()?;
        let mut cols = Vec::new();
        for part in split_top_level(inner, ',') {
            let mut cursor = Cursor::new(part);
            cols.push(cursor.read_ident()?);
        }
        Some(cols)
    }
}

/// Split `text` on `sep` at parenthesis depth zero, outside quotes.
///
/// Depth tracking is what keeps `DECIMAL(10,2)` or a parenthesized default
/// expression from splitting a column definition apart.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 && !in_quote => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}
