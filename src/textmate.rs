//! TextMate grammar engine
//!
//! Grammars are loaded by scope name through a [Registry], compiled once into a rule arena and
//! then used to tokenize text one line at a time:
//!
//!     let mut registry = Registry::new(loader);
//!     let grammar = registry.load_grammar("source.css")?.expect("known scope");
//!     let mut stack = RuleStack::INITIAL;
//!     for line in lines {
//!         let result = grammar.tokenize_line(line, &stack);
//!         stack = result.rule_stack;
//!     }
//!
//! Patterns are Oniguruma regular expressions, matched with the `onig` crate.
//!
//! Injections and theme matching are out of scope.

pub mod grammar;
pub mod raw;
pub mod registry;
mod rule;
pub mod scanner;
pub mod stack;

pub use grammar::{Grammar, Token, TokenizeLineResult};
pub use raw::{RawCaptures, RawGrammar, RawRepository, RawRule};
pub use registry::{GrammarLoader, Registry};
pub use scanner::{OnigScanner, ScanMatch};
pub use stack::RuleStack;
