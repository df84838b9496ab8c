//! Record codec: one task <-> one flat `{ "key": value, ... }` block.
//!
//! The format is JSON-shaped but deliberately narrow: six scalar fields, no
//! nesting. Decoding is lenient about whitespace, field order and unknown keys.

use std::collections::HashMap;
use std::str::Chars;

use thiserror::Error;

use crate::task::{Priority, Status, Task};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Empty record block")]
    Empty,
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}

pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Reverses [`escape`]. Also understands the remaining JSON escapes
/// (`\/`, `\b`, `\f`, `\uXXXX`) so files written by a standard encoder load.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => match hex4(&mut chars) {
                Some(high @ 0xD800..=0xDBFF) => {
                    let mut lookahead = chars.clone();
                    let low = match (lookahead.next(), lookahead.next()) {
                        (Some('\\'), Some('u')) => {
                            hex4(&mut lookahead).filter(|low| (0xDC00..=0xDFFF).contains(low))
                        }
                        _ => None,
                    };
                    match low {
                        Some(low) => {
                            chars = lookahead;
                            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        }
                        None => out.push(char::REPLACEMENT_CHARACTER),
                    }
                }
                Some(code) => {
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
                }
                None => out.push('u'),
            },
            // `\"`, `\\`, `\/` and anything unknown: keep the escaped character.
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn hex4(chars: &mut Chars<'_>) -> Option<u32> {
    let mut probe = chars.clone();
    let digits: String = probe.by_ref().take(4).collect();
    if digits.chars().count() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    *chars = probe;
    u32::from_str_radix(&digits, 16).ok()
}

fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

/// Strips one layer of surrounding double quotes and unescapes the inside.
/// Bare tokens (numbers) come back unchanged.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        unescape(&raw[1..raw.len() - 1])
    } else {
        raw.to_string()
    }
}

pub fn encode_record(task: &Task) -> String {
    let fields = [
        ("id", task.id.to_string()),
        ("description", quote(&task.description)),
        ("status", quote(task.status.as_str())),
        ("priority", quote(task.priority.as_str())),
        ("createdAt", quote(&task.created_at)),
        ("updatedAt", quote(&task.updated_at)),
    ];
    let body = fields
        .iter()
        .map(|(key, value)| format!("  \"{}\": {}", key, value))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{}\n}}", body)
}

/// Splits on commas that sit outside quoted strings and outside `{...}` spans.
///
/// A `"` preceded by an unescaped backslash does not open or close a string.
/// Unbalanced braces only shift the depth counter; they never panic.
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut depth: i32 = 0;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => depth -= 1,
            ',' if !in_quotes && depth == 0 => {
                pieces.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let last = current.trim();
    if !last.is_empty() {
        pieces.push(last.to_string());
    }
    pieces
}

pub fn decode_record(block: &str) -> Result<Task, CodecError> {
    let mut body = block.trim();
    if let Some(rest) = body.strip_prefix('{') {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix('}') {
        body = rest;
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut fields: HashMap<String, String> = HashMap::new();
    for pair in split_top_level(body) {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        fields.insert(unquote(key.trim()), unquote(value.trim()));
    }

    let required = |key: &'static str| {
        fields
            .get(key)
            .cloned()
            .ok_or(CodecError::MissingField(key))
    };

    let raw_id = required("id")?;
    let id = raw_id
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CodecError::InvalidId(raw_id.clone()))?;
    let description = required("description")?;
    let raw_status = required("status")?;
    let status = raw_status
        .parse::<Status>()
        .map_err(|_| CodecError::InvalidStatus(raw_status.clone()))?;
    let priority = Priority::from_label_or_default(fields.get("priority").map(String::as_str));
    let created_at = required("createdAt")?;
    let updated_at = required("updatedAt")?;

    Ok(Task {
        id,
        description,
        status,
        priority,
        created_at,
        updated_at,
    })
}
