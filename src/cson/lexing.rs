//! Lexing pipeline for CSON
//!
//! The pipeline consists of:
//! 1. Core tokenization using the logos lexer ([tokenize])
//! 2. Layout resolution ([resolve_layout]): whitespace is dropped, blank lines disappear and
//!    leading indentation becomes Indent / Dedent tokens.
//!
//! Indentation Handling
//!
//!     Nested objects in CSON are expressed purely through indentation. Turning indentation
//!     changes into Indent and Dedent tokens lets the parser treat an indented block exactly
//!     like a braced one. Indentation is measured in characters, so a tab and a space weigh
//!     the same; files are expected to be consistent.
//!
//!     Unlike Python, indentation stays significant inside brackets: grammar files routinely
//!     nest indented objects inside braced array elements. The parser skips stray layout
//!     tokens between elements of braces and brackets instead.

use std::ops::Range;

use logos::Logos;

use super::tokens::{RawToken, Token};
use super::CsonError;

/// Tokenizes CSON source into core tokens with their byte ranges.
pub fn tokenize(source: &str) -> Result<Vec<(RawToken, Range<usize>)>, CsonError> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with('\'') || slice.starts_with('"') {
                    "unterminated or invalid string literal".to_string()
                } else {
                    format!("unexpected character `{slice}`")
                };
                return Err(CsonError::at(source, span.start, message));
            }
        }
    }

    Ok(tokens)
}

/// Turns core tokens into layout tokens.
///
/// Every non-blank line is terminated by exactly one Newline. A line indented deeper than
/// the enclosing level opens a level (Indent); a shallower line closes levels (one Dedent per
/// level). All levels still open are closed at the end of input.
pub fn resolve_layout(
    source: &str,
    tokens: Vec<(RawToken, Range<usize>)>,
) -> Result<Vec<(Token, Range<usize>)>, CsonError> {
    let mut resolved = Vec::with_capacity(tokens.len());
    let mut levels = vec![0usize];
    let mut indent = 0usize;
    let mut line_has_content = false;

    for (raw, span) in tokens {
        let token = match raw {
            RawToken::Whitespace => {
                if !line_has_content {
                    indent = span.len();
                }
                continue;
            }
            RawToken::Newline => {
                if line_has_content {
                    resolved.push((Token::Newline, span));
                }
                line_has_content = false;
                indent = 0;
                continue;
            }
            // logos never emits comments, they are skipped in the lexer callback
            RawToken::Comment => continue,
            RawToken::Str(s) => Token::Str(s),
            RawToken::Number(n) => Token::Number(n),
            RawToken::Ident(i) => Token::Ident(i),
            RawToken::Colon => Token::Colon,
            RawToken::Comma => Token::Comma,
            RawToken::LBrace => Token::LBrace,
            RawToken::RBrace => Token::RBrace,
            RawToken::LBracket => Token::LBracket,
            RawToken::RBracket => Token::RBracket,
        };

        if !line_has_content {
            line_has_content = true;
            let at = span.start..span.start;
            let mut current = *levels.last().unwrap_or(&0);
            while indent < current {
                levels.pop();
                resolved.push((Token::Dedent, at.clone()));
                current = *levels.last().unwrap_or(&0);
            }
            if indent > current {
                levels.push(indent);
                resolved.push((Token::Indent, at));
            }
        }

        resolved.push((token, span));
    }

    let end = source.len();
    if line_has_content {
        resolved.push((Token::Newline, end..end));
    }
    while levels.len() > 1 {
        levels.pop();
        resolved.push((Token::Dedent, end..end));
    }

    Ok(resolved)
}

/// Runs the complete lexing pipeline.
pub fn lex(source: &str) -> Result<Vec<(Token, Range<usize>)>, CsonError> {
    let tokens = tokenize(source)?;
    resolve_layout(source, tokens)
}
