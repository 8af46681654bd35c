//! Identifier case conversion and the pluralization rule set.

/// snake_case → camelCase.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, c) in name.chars().enumerate() {
        if c == '_' || c == ' ' {
            upper_next = true;
        } else if i == 0 {
            out.extend(c.to_lowercase());
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// snake_case → PascalCase.
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '_' || c == ' ' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Pluralize a table word. Idempotent on names already ending in `s`
/// (table names are conventionally plural to begin with).
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('s') {
        word.to_string()
    } else if lower.ends_with("sh")
        || lower.ends_with("ch")
        || lower.ends_with('x')
        || lower.ends_with('z')
    {
        format!("{word}es")
    } else if ends_with_consonant_y(&lower) {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    }
}

/// Singularize a table word, with guards so words like `class`, `bus`, or
/// `status` come through intact.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if (lower.ends_with("shes") || lower.ends_with("ches"))
        || (lower.ends_with("xes") || lower.ends_with("zes"))
        || lower.ends_with("sses")
    {
        return word[..word.len() - 2].to_string();
    }
    if lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn ends_with_consonant_y(lower: &str) -> bool {
    if !lower.ends_with('y') {
        return false;
    }
    let before = lower.chars().rev().nth(1);
    before.is_some_and(|c| c.is_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}
