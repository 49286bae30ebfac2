//! CSON reading and writing
//!
//! CSON is the CoffeeScript object notation used to author TextMate grammars: JSON values,
//! but with indentation-nested objects, unquoted keys, optional commas, `#` comments and
//! single-quoted strings.
//!
//! Reading runs in three steps (see [lexing] for the token layers):
//!
//!     1. logos tokenization into core tokens
//!     2. layout resolution into Indent / Dedent / Newline aware tokens
//!     3. chumsky parsing into a [serde_json::Value]
//!
//! Key order is preserved all the way through, so converting the same document always yields
//! byte-identical JSON.

pub mod lexing;
pub mod parser;
mod strings;
pub mod tokens;
pub mod writer;

use serde_json::Value;

pub use tokens::{RawToken, Token};
pub use writer::to_cson_string;

/// A malformed CSON document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct CsonError {
    /// 1-based line of the offending input
    pub line: usize,
    /// 1-based column (in characters) of the offending input
    pub column: usize,
    pub message: String,
}

impl CsonError {
    pub(crate) fn at(source: &str, offset: usize, message: String) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line_start = before
            .rfind(|c: char| c == '\n' || c == '\r')
            .map(|index| index + 1)
            .unwrap_or(0);
        let line = 1 + before.matches('\n').count() + before.matches('\r').count()
            - before.matches("\r\n").count();
        let column = 1 + before[line_start..].chars().count();
        CsonError {
            line,
            column,
            message,
        }
    }
}

/// Parses a CSON document.
pub fn parse(source: &str) -> Result<Value, CsonError> {
    let tokens = lexing::lex(source)?;
    parser::parse_tokens(source, tokens)
}

/// Serializes a value as two-space indented JSON text with a trailing newline.
pub fn to_json_string(value: &Value) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
