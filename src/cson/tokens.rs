//! Token definitions for CSON
//!
//! Two layers of tokens are used:
//!
//!     Core tokens ([RawToken]) are produced by the logos lexer. They carry whitespace and
//!     physical newlines, and already hold decoded string contents.
//!
//!     Layout tokens ([Token]) are produced by the layout resolution pass. Whitespace is gone,
//!     every non-blank line ends in a single Newline, and changes in leading indentation are
//!     expressed as Indent / Dedent pairs, which the parser treats much like braces.

use std::fmt;

use logos::{Lexer, Logos, Skip};

use super::strings;

/// Core CSON tokens
#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)]
pub enum RawToken {
    // `#` line comments and `###` block comments
    #[regex(r"#[^\r\n]*", skip_comment)]
    Comment,

    #[regex(r"'([^'\\]|\\[\s\S])*'", |lex| strings::quoted(lex.slice()))]
    #[regex(r#""([^"\\]|\\[\s\S])*""#, |lex| strings::quoted(lex.slice()))]
    #[token("'''", |lex| triple_quoted(lex, "'''"))]
    #[token("\"\"\"", |lex| triple_quoted(lex, "\"\"\""))]
    Str(String),

    #[regex(
        r"-?(0[xX][0-9a-fA-F]+|0[bB][01]+|0[oO][0-7]+|([0-9]+(\.[0-9]+)?|\.[0-9]+)([eE][+-]?[0-9]+)?)",
        |lex| lex.slice().to_owned()
    )]
    Number(String),

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r\n|\r|\n")]
    Newline,
}

/// Skips a line comment. A comment opening with exactly three hashes is a block comment and
/// runs until the next `###`.
fn skip_comment(lex: &mut Lexer<RawToken>) -> Skip {
    let slice = lex.slice();
    let is_block = slice.starts_with("###") && !slice[3..].starts_with('#');
    if is_block && !slice[3..].contains("###") {
        let remainder = lex.remainder();
        match remainder.find("###") {
            Some(close) => lex.bump(close + 3),
            None => lex.bump(remainder.len()),
        }
    }
    Skip
}

fn triple_quoted(lex: &mut Lexer<RawToken>, delimiter: &str) -> Option<String> {
    let remainder = lex.remainder();
    let close = remainder.find(delimiter)?;
    let body = &remainder[..close];
    let decoded = strings::block(body);
    lex.bump(close + delimiter.len());
    decoded
}

/// Layout-resolved tokens consumed by the parser
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Token {
    /// A string, number or identifier directly followed by `:`
    Key(String),
    Str(String),
    Number(String),
    Ident(String),
    Colon,
    Comma,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Newline,
    Indent,
    Dedent,
}

impl Token {
    /// Tokens that only separate elements inside braces and brackets
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            Token::Newline | Token::Indent | Token::Dedent | Token::Comma
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Key(k) => write!(f, "{k}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(i) => write!(f, "{i}"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Newline => write!(f, "newline"),
            Token::Indent => write!(f, "indent"),
            Token::Dedent => write!(f, "dedent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<RawToken> {
        RawToken::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    #[test]
    fn test_pair_tokens() {
        assert_eq!(
            lex("name: 'CSS'"),
            vec![
                RawToken::Ident("name".to_string()),
                RawToken::Colon,
                RawToken::Whitespace,
                RawToken::Str("CSS".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_comment_is_skipped() {
        assert_eq!(
            lex("a # trailing\n"),
            vec![
                RawToken::Ident("a".to_string()),
                RawToken::Whitespace,
                RawToken::Newline,
            ]
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let tokens = lex("###\nignored: 1\n###\nb");
        assert_eq!(
            tokens,
            vec![RawToken::Newline, RawToken::Ident("b".to_string())]
        );
    }

    #[test]
    fn test_four_hashes_is_a_line_comment() {
        let tokens = lex("####\nb");
        assert_eq!(
            tokens,
            vec![RawToken::Newline, RawToken::Ident("b".to_string())]
        );
    }

    #[test]
    fn test_triple_quoted_string() {
        let tokens = lex("'''\n  one\n    two\n  '''");
        assert_eq!(tokens, vec![RawToken::Str("one\n  two".to_string())]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("-12 0x1F 1.5e3 .5"),
            vec![
                RawToken::Number("-12".to_string()),
                RawToken::Whitespace,
                RawToken::Number("0x1F".to_string()),
                RawToken::Whitespace,
                RawToken::Number("1.5e3".to_string()),
                RawToken::Whitespace,
                RawToken::Number(".5".to_string()),
            ]
        );
    }

    #[test]
    fn test_all_line_endings_are_newlines() {
        assert_eq!(
            lex("\n\r\n\r"),
            vec![RawToken::Newline, RawToken::Newline, RawToken::Newline]
        );
    }

    #[test]
    fn test_layout_tokens() {
        assert!(Token::Comma.is_layout());
        assert!(Token::Dedent.is_layout());
        assert!(!Token::Colon.is_layout());
    }
}
