//! VDF serialization.

use std::fmt::Write as _;

use super::{Map, Value};

/// Serialize a document to VDF text.
///
/// Nested blocks indent by two spaces per depth and scalar pairs separate key
/// and value with two spaces, matching what the external tool reads back. The
/// output ends with a trailing newline and round-trips through
/// [`parse`](super::parse).
pub fn write(document: &Map) -> String {
    let mut out = String::new();
    write_entries(&mut out, document, 0);
    out
}

fn write_entries(out: &mut String, map: &Map, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in map {
        match value {
            Value::Map(nested) => {
                let _ = writeln!(out, "{indent}\"{}\"", escape(key));
                let _ = writeln!(out, "{indent}{{");
                write_entries(out, nested, depth + 1);
                let _ = writeln!(out, "{indent}}}");
            }
            scalar => {
                let rendered = scalar.scalar_string().unwrap_or_default();
                let _ = writeln!(out, "{indent}\"{}\"  \"{}\"", escape(key), escape(&rendered));
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
