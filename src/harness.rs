//! CSS grammar harness
//!
//! Glue between the grammar files on disk and the engine:
//!
//!     - [CssGrammarLoader] answers the registry for exactly one scope name by reading the
//!       CSON grammar and converting it on the fly. Any other scope is logged and reported as
//!       missing, which the engine tolerates.
//!     - [tokenize_lines] drives the grammar line by line. The rule stack returned for a line
//!       is the one fed into the next line, so scopes that span lines (comments, blocks) carry
//!       over.
//!     - Tokens are reshaped from offsets into the text they cover ([ScopedToken]).

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::convert::read_cson;
use crate::error::{Error, Result};
use crate::settings::HarnessConfig;
use crate::textmate::{Grammar, GrammarLoader, RawGrammar, Registry, RuleStack, Token};

/// Loads the CSS grammar from its CSON source for one scope name.
#[derive(Debug, Clone)]
pub struct CssGrammarLoader {
    pub scope_name: String,
    pub path: PathBuf,
}

impl CssGrammarLoader {
    pub fn new(scope_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        CssGrammarLoader {
            scope_name: scope_name.into(),
            path: path.into(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(&config.grammar.scope_name, &config.paths.grammar_source)
    }
}

impl GrammarLoader for CssGrammarLoader {
    fn load_grammar(&self, scope_name: &str) -> Result<Option<RawGrammar>> {
        if scope_name != self.scope_name {
            warn!("Unknown scope name: {scope_name}");
            return Ok(None);
        }

        debug!(path = %self.path.display(), "loading grammar");
        let value = read_cson(&self.path)?;
        // go through JSON text, the form the grammar is published in
        let json = serde_json::to_string(&value)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

/// Builds a registry around the configured loader and loads the CSS grammar from it.
#[tracing::instrument(skip_all, fields(scope = %config.grammar.scope_name))]
pub fn load_css_grammar(config: &HarnessConfig) -> Result<Arc<Grammar>> {
    let scope_name = config.grammar.scope_name.clone();
    let mut registry = Registry::new(CssGrammarLoader::from_config(config));
    registry
        .load_grammar(&scope_name)?
        .ok_or(Error::GrammarNotFound(scope_name))
}

/// A token with its offsets replaced by the text they delimit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedToken {
    pub text: String,
    pub scopes: Vec<String>,
}

impl ScopedToken {
    /// Reshapes an engine token of `line`.
    pub fn from_token(line: &str, token: Token) -> Self {
        ScopedToken {
            text: line.get(token.start..token.end).unwrap_or_default().to_string(),
            scopes: token.scopes,
        }
    }
}

/// One tokenized source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine<'t> {
    pub text: &'t str,
    pub tokens: Vec<ScopedToken>,
    /// State after this line, fed into the next one
    pub rule_stack: RuleStack,
}

/// Splits text into lines at `\r\n`, `\r` or `\n`.
///
/// A terminator at the very end closes the last line instead of opening an empty one, and
/// empty input has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&text[start..index]);
                index += 1;
                start = index;
            }
            b'\r' => {
                lines.push(&text[start..index]);
                index += if bytes.get(index + 1) == Some(&b'\n') { 2 } else { 1 };
                start = index;
            }
            _ => index += 1,
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Tokenizes `text` line by line, threading the rule stack from each line into the next.
pub fn tokenize_lines<'g, 't>(
    grammar: &'g Grammar,
    text: &'t str,
) -> impl Iterator<Item = TokenizedLine<'t>> + 'g
where
    't: 'g,
{
    let mut stack = RuleStack::INITIAL;
    split_lines(text).into_iter().map(move |line| {
        let result = grammar.tokenize_line(line, &stack);
        stack = result.rule_stack.clone();
        TokenizedLine {
            text: line,
            tokens: result
                .tokens
                .into_iter()
                .map(|token| ScopedToken::from_token(line, token))
                .collect(),
            rule_stack: result.rule_stack,
        }
    })
}

/// Tokenizes `text`, returning the reshaped tokens of every line in order.
pub fn tokenize_text(grammar: &Grammar, text: &str) -> Vec<Vec<ScopedToken>> {
    tokenize_lines(grammar, text).map(|line| line.tokens).collect()
}
