//! # language-css
//!
//! Build and test harness for a CSS TextMate grammar.
//!
//! The grammar is authored in CSON (`grammars/css.cson`). This crate
//!
//!     1. converts it to JSON ([convert]), reading CSON with the [cson] module
//!     2. loads it through a scope-name registry ([harness::CssGrammarLoader])
//!     3. tokenizes text line by line with the [textmate] engine, carrying the rule stack
//!        from each line into the next ([harness::tokenize_lines])
//!
//! Token output can be rendered as JSON, YAML or a plain listing ([output]). Paths and the
//! scope name come from [settings].

pub mod convert;
pub mod cson;
pub mod error;
pub mod harness;
pub mod output;
pub mod settings;
pub mod textmate;

pub use error::{Error, Result};
