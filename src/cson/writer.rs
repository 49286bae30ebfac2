//! CSON serialization
//!
//! Objects at the top level and as pair values are written as indented blocks; objects inside
//! arrays are braced, since a bare run of pairs inside an array would merge into one object.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const INDENT: &str = "  ";

static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid key pattern"));

/// Writes a value as a CSON document.
pub fn to_cson_string(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) if !map.is_empty() => write_pairs(&mut out, map, 0),
        other => {
            write_inline(&mut out, other, 0);
            out.push('\n');
        }
    }
    out
}

fn write_pairs(out: &mut String, map: &Map<String, Value>, depth: usize) {
    for (key, value) in map {
        push_indent(out, depth);
        write_key(out, key);
        out.push(':');
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                out.push('\n');
                write_pairs(out, nested, depth + 1);
            }
            other => {
                out.push(' ');
                write_inline(out, other, depth);
                out.push('\n');
            }
        }
    }
}

fn write_inline(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                push_indent(out, depth + 1);
                write_inline(out, item, depth + 1);
                out.push('\n');
            }
            push_indent(out, depth);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            write_pairs(out, map, depth + 1);
            push_indent(out, depth);
            out.push('}');
        }
    }
}

fn write_key(out: &mut String, key: &str) {
    if BARE_KEY.is_match(key) {
        out.push_str(key);
    } else {
        write_string(out, key);
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cson::parse;
    use serde_json::json;

    #[test]
    fn writes_nested_document() {
        let value = json!({
            "name": "CSS",
            "scopeName": "source.css",
            "patterns": [{"include": "#comment"}, ["a"], {}],
            "repository": {"comment": {"match": "/\\*.*?\\*/", "name": "comment.block.css"}}
        });
        let expected = "\
name: 'CSS'
scopeName: 'source.css'
patterns: [
  {
    include: '#comment'
  }
  [
    'a'
  ]
  {}
]
repository:
  comment:
    match: '/\\\\*.*?\\\\*/'
    name: 'comment.block.css'
";
        assert_eq!(to_cson_string(&value), expected);
        assert_eq!(parse(expected).unwrap(), value);
    }

    #[test]
    fn quotes_keys_that_are_not_identifiers() {
        let value = json!({"0": {"name": "x"}, "file-types": []});
        let cson = to_cson_string(&value);
        assert!(cson.starts_with("'0':\n  name: 'x'\n"));
        assert!(cson.contains("'file-types': []"));
        assert_eq!(parse(&cson).unwrap(), value);
    }

    #[test]
    fn escapes_control_characters() {
        let value = json!({"s": "it's\n\ttabbed\u{1}"});
        let cson = to_cson_string(&value);
        assert_eq!(cson, "s: 'it\\'s\\n\\ttabbed\\u0001'\n");
        assert_eq!(parse(&cson).unwrap(), value);
    }

    #[test]
    fn writes_scalar_documents() {
        assert_eq!(to_cson_string(&json!(42)), "42\n");
        assert_eq!(to_cson_string(&json!({})), "{}\n");
    }
}
