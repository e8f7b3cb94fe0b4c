//! Scalar Coercion
//!
//! Shared value typing for the manifest parser and the header reader.
//!
//! Coercion order for a bare value string:
//! 1. quoted string (`"..."` or `'...'`)
//! 2. boolean literal (`true/false/yes/no/on/off`, case-insensitive)
//! 3. null literal (`null`, `~`)
//! 4. hex integer (`0x` prefix)
//! 5. decimal integer
//! 6. float
//! 7. unquoted string

use std::fmt;

/// A typed leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Integer view; strings holding a decimal or hex literal count too
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Str(s) => parse_int(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Coerce a raw value string into a typed scalar
///
/// Surrounding whitespace is ignored. Comments must already be stripped.
pub fn coerce(raw: &str) -> Scalar {
    let text = raw.trim();

    if let Some(inner) = unquote(text) {
        return Scalar::Str(inner.to_string());
    }

    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return Scalar::Bool(true),
        "false" | "no" | "off" => return Scalar::Bool(false),
        "" | "null" | "~" => return Scalar::Null,
        _ => {}
    }

    if let Some(value) = parse_int(text) {
        return Scalar::Int(value);
    }

    if text.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(value) = text.parse::<f64>() {
            return Scalar::Float(value);
        }
    }

    Scalar::Str(text.to_string())
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer
///
/// Hex literals that do not fit in an `i64` are rejected rather than wrapped.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let value = u64::from_str_radix(hex, 16).ok()?;
        return i64::try_from(value).ok();
    }
    text.parse::<i64>().ok()
}

/// Strip matching single or double quotes
pub fn unquote(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

/// Remove a trailing ` #...` comment that is not inside quotes
pub fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;

    for (idx, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if (ch == '"' || ch == '\'') && prev_is_space => quote = Some(ch),
            None if ch == '#' && prev_is_space => return text[..idx].trim_end(),
            None => {}
        }
        prev_is_space = ch.is_whitespace();
    }

    text.trim_end()
}

/// Split an inline list `[a, b, c]` on top-level commas
///
/// Returns `None` when `text` is not bracketed. Nested lists are not
/// recognised; commas inside quotes do not split.
pub fn split_inline_list(text: &str) -> Option<Vec<&str>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in inner.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ',' => {
                items.push(inner[start..idx].trim());
                start = idx + 1;
            }
            None => {}
        }
    }
    items.push(inner[start..].trim());

    Some(items)
}
