//! Scalar text rules shared by the encoder and decoder.
//!
//! Everything that decides how a single primitive or key looks on the page
//! lives here, so the two directions cannot drift apart:
//!
//! - when a string must be quoted, and how it is escaped and unescaped
//! - the numeric grammar and number formatting
//! - quote-aware splitting of rows, inline arrays and column data
//!
//! ## Quoting
//!
//! A string is written bare unless reading it back bare would change it.
//! Quoted strings use `\\`, `\"`, `\n`, `\r` and `\t` escapes.
//!
//! ```rust
//! use ctf_format::escape::{escape_string, unescape};
//!
//! assert_eq!(escape_string("Alice"), "Alice");
//! assert_eq!(escape_string("key:value"), "\"key:value\"");
//! assert_eq!(escape_string("42"), "\"42\"");
//! assert_eq!(unescape("\"say \\\"hi\\\"\"").as_deref(), Some("say \"hi\""));
//! ```

use crate::Value;

/// Characters that force a string value into quotes wherever it appears.
const STRUCTURAL: &[char] = &[
    ':', '|', '\t', '\n', '\r', '"', '^', '@', '[', ']', '{', '}', ',', '\\', '=',
];

/// Characters that force a key into quotes.
const KEY_STRUCTURAL: &[char] = &[
    ':', '@', '"', '\\', ',', '|', '^', '[', ']', '{', '}', '\t', '\n', '\r',
];

/// Returns `true` if `s` cannot be written bare as a value.
///
/// # Examples
///
/// ```rust
/// use ctf_format::escape::needs_quotes;
///
/// assert!(!needs_quotes("hello world"));
/// assert!(needs_quotes("hello  world"));
/// assert!(needs_quotes("a|b"));
/// assert!(needs_quotes("7up"));
/// assert!(needs_quotes("-"));
/// assert!(needs_quotes(""));
/// ```
#[must_use]
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || matches!(s, "_" | "+" | "-")
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || s.contains("  ")
        || starts_like_number(s)
        || s.contains(STRUCTURAL)
}

/// Like [`needs_quotes`], for elements of a whitespace-separated inline array.
#[must_use]
pub fn needs_quotes_inline(s: &str) -> bool {
    needs_quotes(s) || s.contains(char::is_whitespace)
}

/// Returns `true` if `s` cannot be written bare as a key.
#[must_use]
pub fn key_needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || s.contains(KEY_STRUCTURAL)
}

fn starts_like_number(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+' | '-' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Wraps `s` in double quotes, escaping backslashes, quotes and line breaks.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Quotes `s` only if it needs quoting as a value.
#[must_use]
pub fn escape_string(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Quotes `s` only if it needs quoting inside an inline array.
#[must_use]
pub fn escape_inline(s: &str) -> String {
    if needs_quotes_inline(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Renders a key, quoting it only when it contains structural characters.
#[must_use]
pub fn format_key(key: &str) -> String {
    if key_needs_quotes(key) {
        quote(key)
    } else {
        key.to_string()
    }
}

/// Decodes a complete quoted token (`"…"`). Returns `None` when `s` is not a
/// single well-formed quoted string.
///
/// Unknown escapes are kept verbatim.
#[must_use]
pub fn unescape(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return chars.as_str().is_empty().then_some(out),
            '\\' => match chars.next()? {
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            other => out.push(other),
        }
    }
    None
}

/// Returns the text with surrounding quotes removed and escapes decoded, or
/// the text unchanged if it is not quoted.
#[must_use]
pub fn unescape_if_quoted(s: &str) -> String {
    unescape(s).unwrap_or_else(|| s.to_string())
}

/// Parses `s` if it matches `[+-]?digits(.digits)?([eE][+-]?digits)?`.
///
/// # Examples
///
/// ```rust
/// use ctf_format::escape::parse_number;
///
/// assert_eq!(parse_number("-12.5e3"), Some(-12500.0));
/// assert_eq!(parse_number("NaN"), None);
/// assert_eq!(parse_number("1."), None);
/// assert_eq!(parse_number(""), None);
/// ```
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i > start
    };
    if !digits(&mut i) {
        return None;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if !digits(&mut i) {
            return None;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !digits(&mut i) {
            return None;
        }
    }
    if i != bytes.len() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Formats a number with the shortest text that parses back to the same
/// `f64`. Non-finite values have no CTF form and render as null (`_`).
///
/// # Examples
///
/// ```rust
/// use ctf_format::escape::format_number;
///
/// assert_eq!(format_number(42.0), "42");
/// assert_eq!(format_number(0.1), "0.1");
/// assert_eq!(format_number(1e300), "1e300");
/// assert_eq!(format_number(f64::NAN), "_");
/// ```
#[must_use]
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "_".to_string();
    }
    let abs = n.abs();
    if abs >= 1e21 || (abs != 0.0 && abs < 1e-6) {
        format!("{:e}", n)
    } else {
        format!("{}", n)
    }
}

/// Formats a primitive the way it appears after `key:`.
#[must_use]
pub fn format_primitive(value: &Value) -> String {
    match value {
        Value::Null => "_".to_string(),
        Value::Bool(true) => "+".to_string(),
        Value::Bool(false) => "-".to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => escape_string(s),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Splits `s` on `delim`, ignoring delimiters inside `"…"` and after a `\`.
/// Cells are returned untrimmed; escapes are left for [`unescape`].
///
/// # Examples
///
/// ```rust
/// use ctf_format::escape::split_quoted;
///
/// assert_eq!(split_quoted(r#"1|"a|b"|c"#, '|'), vec!["1", "\"a|b\"", "c"]);
/// ```
#[must_use]
pub fn split_quoted(s: &str, delim: char) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == delim && !in_quotes {
            cells.push(&s[start..i]);
            start = i + ch.len_utf8();
        }
    }
    cells.push(&s[start..]);
    cells
}

/// Splits `s` on runs of whitespace outside quotes, dropping empty tokens.
#[must_use]
pub fn split_whitespace_quoted(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch.is_whitespace() && !in_quotes {
            if let Some(from) = start.take() {
                tokens.push(&s[from..i]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ => {}
        }
    }
    if let Some(from) = start {
        tokens.push(&s[from..]);
    }
    tokens
}

/// Finds the last occurrence of `target` outside quotes.
#[must_use]
pub fn rfind_unquoted(s: &str, target: char) -> Option<usize> {
    let mut found = None;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == target && !in_quotes {
            found = Some(i);
        }
    }
    found
}

/// Returns the length in bytes of the quoted token at the start of `s`,
/// including both quotes, or `None` if it is unterminated.
#[must_use]
pub fn quoted_len(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some(i + 1);
        }
    }
    None
}
