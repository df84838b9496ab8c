//! Whole-file layer: a `[ ... ]` array of record blocks.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::codec::{decode_record, encode_record, CodecError};
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub tasks: Vec<Task>,
    pub warnings: Vec<String>,
}

fn block_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"\}\s*,\s*\{").expect("block boundary regex"))
}

/// Byte ranges covered by double-quoted strings, quotes included.
fn quoted_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => match open.take() {
                Some(start) => spans.push(start..idx + 1),
                None => open = Some(idx),
            },
            _ => {}
        }
    }
    if let Some(start) = open {
        spans.push(start..text.len());
    }
    spans
}

/// Cuts the array body between adjacent objects. A `},{` that starts inside
/// one of the `quoted` spans is not a boundary.
fn split_blocks<'a>(body: &'a str, quoted: &[Range<usize>]) -> Vec<&'a str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    for boundary in block_boundary().find_iter(body) {
        if quoted.iter().any(|span| span.contains(&boundary.start())) {
            continue;
        }
        fragments.push(&body[start..boundary.start() + 1]);
        start = boundary.end() - 1;
    }
    fragments.push(&body[start..]);
    fragments
}

fn normalize_fragment(fragment: &str) -> String {
    let trimmed = fragment.trim();
    let mut block = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('{') {
        block.push('{');
    }
    block.push_str(trimmed);
    if !trimmed.ends_with('}') {
        block.push('}');
    }
    block
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes a stored document. Never fails: blocks that cannot be decoded are
/// reported in `warnings` and skipped.
pub fn decode_document(text: &str) -> Decoded {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix('[') {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix(']') {
        body = rest;
    }

    let mut decoded = Decoded::default();
    if body.trim().is_empty() {
        return decoded;
    }

    for fragment in split_blocks(body, &quoted_spans(body)) {
        if fragment.trim().is_empty() {
            continue;
        }
        let block = normalize_fragment(fragment);
        match decode_record(&block) {
            Ok(task) => decoded.tasks.push(task),
            Err(err) => {
                // An unbalanced quote hides every later boundary; retry on the
                // bare pattern so only the broken block is lost.
                let pieces = split_blocks(fragment, &[]);
                if pieces.len() < 2 {
                    decoded.warnings.push(parse_warning(&err, &block));
                    continue;
                }
                for piece in pieces {
                    decode_into(piece, &mut decoded);
                }
            }
        }
    }
    decoded
}

fn decode_into(fragment: &str, decoded: &mut Decoded) {
    if fragment.trim().is_empty() {
        return;
    }
    let block = normalize_fragment(fragment);
    match decode_record(&block) {
        Ok(task) => decoded.tasks.push(task),
        Err(err) => decoded.warnings.push(parse_warning(&err, &block)),
    }
}

fn parse_warning(err: &CodecError, block: &str) -> String {
    format!("Could not parse task ({}): {}", err, compact(block))
}

pub fn encode_document(tasks: &[Task]) -> String {
    let mut out = String::from("[\n");
    for (idx, task) in tasks.iter().enumerate() {
        let block = encode_record(task)
            .lines()
            .map(|line| format!("  {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&block);
        if idx + 1 < tasks.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_spans_skip_escaped_quotes() {
        let text = r#"{"a": "x \" }, {", "b": 1}"#;
        let spans = quoted_spans(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(&text[spans[1].clone()], r#""x \" }, {""#);
    }

    #[test]
    fn split_blocks_ignores_boundary_inside_string() {
        let body = r#"{"d": "a},{b"},{"d": "c"}"#;
        let fragments = split_blocks(body, &quoted_spans(body));
        assert_eq!(fragments, vec![r#"{"d": "a},{b"}"#, r#"{"d": "c"}"#]);
        assert_eq!(split_blocks(body, &[]).len(), 3);
    }

    #[test]
    fn split_blocks_keeps_braces_on_both_sides() {
        let fragments = split_blocks("{a}  ,\n  {b},{c}", &[]);
        assert_eq!(fragments, vec!["{a}", "{b}", "{c}"]);
    }

    #[test]
    fn normalize_fragment_restores_missing_braces() {
        assert_eq!(normalize_fragment("  \"a\": 1 "), "{\"a\": 1}");
        assert_eq!(normalize_fragment("{\"a\": 1"), "{\"a\": 1}");
        assert_eq!(normalize_fragment("{}"), "{}");
    }

    #[test]
    fn encode_empty_list() {
        assert_eq!(encode_document(&[]), "[\n]");
    }
}
