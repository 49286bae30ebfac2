//! Grammar registry
//!
//! The registry asks a [GrammarLoader] for raw grammars by scope name and keeps the compiled
//! results. Grammars included by other grammars are requested through the same loader.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::grammar::Grammar;
use super::raw::RawGrammar;
use crate::error::Result;

/// Supplies raw grammars by scope name.
///
/// Returning `Ok(None)` means the scope is not known to this loader; tokenization continues
/// without it. Errors abort loading.
pub trait GrammarLoader {
    fn load_grammar(&self, scope_name: &str) -> Result<Option<RawGrammar>>;
}

impl<F> GrammarLoader for F
where
    F: Fn(&str) -> Result<Option<RawGrammar>>,
{
    fn load_grammar(&self, scope_name: &str) -> Result<Option<RawGrammar>> {
        self(scope_name)
    }
}

pub struct Registry {
    loader: Box<dyn GrammarLoader>,
    raw: HashMap<String, Arc<RawGrammar>>,
    compiled: HashMap<String, Arc<Grammar>>,
}

impl Registry {
    pub fn new(loader: impl GrammarLoader + 'static) -> Self {
        Registry {
            loader: Box::new(loader),
            raw: HashMap::new(),
            compiled: HashMap::new(),
        }
    }

    /// Loads and compiles the grammar for `scope_name`.
    ///
    /// Returns `Ok(None)` when the loader does not know the scope.
    pub fn load_grammar(&mut self, scope_name: &str) -> Result<Option<Arc<Grammar>>> {
        if let Some(grammar) = self.compiled.get(scope_name) {
            return Ok(Some(grammar.clone()));
        }
        let Some(raw) = self.raw_grammar(scope_name)? else {
            return Ok(None);
        };

        let grammar = Arc::new(Grammar::compile(raw, &mut |scope: &str| {
            self.raw_grammar(scope)
        })?);
        debug!(scope = scope_name, "compiled grammar");
        self.compiled
            .insert(scope_name.to_string(), grammar.clone());
        Ok(Some(grammar))
    }

    fn raw_grammar(&mut self, scope_name: &str) -> Result<Option<Arc<RawGrammar>>> {
        if let Some(raw) = self.raw.get(scope_name) {
            return Ok(Some(raw.clone()));
        }
        let loaded = self.loader.load_grammar(scope_name)?.map(Arc::new);
        if let Some(raw) = &loaded {
            self.raw.insert(scope_name.to_string(), raw.clone());
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textmate::RuleStack;
    use std::cell::Cell;
    use std::rc::Rc;

    fn word_grammar(scope_name: &str) -> RawGrammar {
        serde_json::from_value(serde_json::json!({
            "scopeName": scope_name,
            "patterns": [{"match": "\\w+", "name": "word.test"}]
        }))
        .unwrap()
    }

    #[test]
    fn unknown_scope_yields_none() {
        let mut registry = Registry::new(|_: &str| -> Result<Option<RawGrammar>> { Ok(None) });
        assert!(registry.load_grammar("source.nope").unwrap().is_none());
    }

    #[test]
    fn grammars_are_compiled_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut registry = Registry::new(move |scope: &str| -> Result<Option<RawGrammar>> {
            counter.set(counter.get() + 1);
            Ok((scope == "source.test").then(|| word_grammar(scope)))
        });

        let first = registry.load_grammar("source.test").unwrap().unwrap();
        let second = registry.load_grammar("source.test").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);

        let result = first.tokenize_line("hi", &RuleStack::INITIAL);
        assert_eq!(result.tokens[0].scopes, vec!["source.test", "word.test"]);
    }

    #[test]
    fn included_grammars_come_from_the_loader() {
        let mut registry = Registry::new(|scope: &str| -> Result<Option<RawGrammar>> {
            Ok(match scope {
                "source.outer" => Some(
                    serde_json::from_value(serde_json::json!({
                        "scopeName": "source.outer",
                        "patterns": [{"include": "source.inner"}]
                    }))
                    .unwrap(),
                ),
                "source.inner" => Some(word_grammar("source.inner")),
                _ => None,
            })
        });
        let grammar = registry.load_grammar("source.outer").unwrap().unwrap();
        let result = grammar.tokenize_line("x", &RuleStack::INITIAL);
        assert_eq!(result.tokens[0].scopes, vec!["source.outer", "word.test"]);
    }
}
