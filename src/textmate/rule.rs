//! Rule compilation
//!
//! Raw rules are compiled into an arena indexed by [RuleId]. Includes are resolved while
//! compiling: `$self`, `$base`, `#name` (nearest repository first), `scope` and
//! `scope#name`. Repository entries and grammar roots are memoized by a string key, and a
//! rule's id is reserved before its children are compiled so recursive grammars terminate.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::raw::{RawCaptures, RawGrammar, RawRepository, RawRule};
use super::scanner::RegexSource;
use crate::error::Result;

pub(crate) type RuleId = usize;

#[derive(Debug)]
pub(crate) struct CaptureRule {
    pub name: Option<String>,
    pub content_name: Option<String>,
    /// Patterns to run over the captured text
    pub patterns: Option<RuleId>,
}

#[derive(Debug)]
pub(crate) struct MatchRule {
    pub name: Option<String>,
    pub regex: RegexSource,
    pub captures: Vec<Option<CaptureRule>>,
}

#[derive(Debug)]
pub(crate) struct PatternsRule {
    pub patterns: Vec<RuleId>,
}

#[derive(Debug)]
pub(crate) struct BeginEndRule {
    pub name: Option<String>,
    pub content_name: Option<String>,
    pub begin: RegexSource,
    pub begin_captures: Vec<Option<CaptureRule>>,
    pub end: RegexSource,
    pub end_captures: Vec<Option<CaptureRule>>,
    pub apply_end_pattern_last: bool,
    pub patterns: Vec<RuleId>,
}

#[derive(Debug)]
pub(crate) struct BeginWhileRule {
    pub name: Option<String>,
    pub content_name: Option<String>,
    pub begin: RegexSource,
    pub begin_captures: Vec<Option<CaptureRule>>,
    pub while_: RegexSource,
    pub while_captures: Vec<Option<CaptureRule>>,
    pub patterns: Vec<RuleId>,
}

#[derive(Debug)]
pub(crate) enum Rule {
    Match(MatchRule),
    Patterns(PatternsRule),
    BeginEnd(BeginEndRule),
    BeginWhile(BeginWhileRule),
}

impl Rule {
    pub fn name(&self) -> Option<&str> {
        match self {
            Rule::Match(rule) => rule.name.as_deref(),
            Rule::Patterns(_) => None,
            Rule::BeginEnd(rule) => rule.name.as_deref(),
            Rule::BeginWhile(rule) => rule.name.as_deref(),
        }
    }

    /// The pattern that starts this rule when scanning a parent's patterns.
    pub fn opening(&self) -> Option<&RegexSource> {
        match self {
            Rule::Match(rule) => Some(&rule.regex),
            Rule::Patterns(_) => None,
            Rule::BeginEnd(rule) => Some(&rule.begin),
            Rule::BeginWhile(rule) => Some(&rule.begin),
        }
    }

    pub fn patterns(&self) -> &[RuleId] {
        match self {
            Rule::Match(_) => &[],
            Rule::Patterns(rule) => &rule.patterns,
            Rule::BeginEnd(rule) => &rule.patterns,
            Rule::BeginWhile(rule) => &rule.patterns,
        }
    }
}

/// Fetches another grammar by scope name for cross-grammar includes.
pub(crate) type Fetch<'a> = dyn FnMut(&str) -> Result<Option<Arc<RawGrammar>>> + 'a;

/// Where a rule was written: its grammar plus the repositories of enclosing rules.
#[derive(Clone)]
struct Context {
    grammar: Arc<RawGrammar>,
    locals: Vec<(usize, Arc<RawRepository>)>,
}

impl Context {
    fn root(grammar: Arc<RawGrammar>) -> Self {
        Context {
            grammar,
            locals: Vec::new(),
        }
    }
}

pub(crate) struct Compiler<'a, 'f> {
    rules: Vec<Option<Rule>>,
    memo: HashMap<String, RuleId>,
    grammars: HashMap<String, Arc<RawGrammar>>,
    base: Arc<RawGrammar>,
    fetch: &'a mut Fetch<'f>,
    repositories: usize,
}

impl<'a, 'f> Compiler<'a, 'f> {
    pub fn new(base: Arc<RawGrammar>, fetch: &'a mut Fetch<'f>) -> Self {
        let mut grammars = HashMap::new();
        grammars.insert(base.scope_name.clone(), base.clone());
        Compiler {
            rules: Vec::new(),
            memo: HashMap::new(),
            grammars,
            base,
            fetch,
            repositories: 0,
        }
    }

    /// Compiles the base grammar, returning its root rule and the rule arena.
    pub fn compile(mut self) -> Result<(RuleId, Vec<Rule>)> {
        let base = self.base.clone();
        let root = self.grammar_root(&base)?;
        let rules = self
            .rules
            .into_iter()
            .map(|rule| rule.unwrap_or(Rule::Patterns(PatternsRule { patterns: Vec::new() })))
            .collect();
        Ok((root, rules))
    }

    fn reserve(&mut self) -> RuleId {
        self.rules.push(None);
        self.rules.len() - 1
    }

    fn grammar_root(&mut self, grammar: &Arc<RawGrammar>) -> Result<RuleId> {
        let key = format!("{}#$self", grammar.scope_name);
        if let Some(&id) = self.memo.get(&key) {
            return Ok(id);
        }
        let id = self.reserve();
        self.memo.insert(key, id);
        let patterns = self.patterns(&grammar.patterns, &Context::root(grammar.clone()))?;
        self.rules[id] = Some(Rule::Patterns(PatternsRule { patterns }));
        Ok(id)
    }

    fn patterns(&mut self, raw: &[RawRule], context: &Context) -> Result<Vec<RuleId>> {
        let mut ids = Vec::with_capacity(raw.len());
        for rule in raw.iter().filter(|rule| !rule.disabled) {
            if let Some(include) = &rule.include {
                if rule.repository.is_none() {
                    ids.extend(self.include(include, context)?);
                    continue;
                }
            }
            ids.push(self.rule(rule, context)?);
        }
        Ok(ids)
    }

    fn rule(&mut self, raw: &RawRule, context: &Context) -> Result<RuleId> {
        let id = self.reserve();
        let rule = self.build(raw, context)?;
        self.rules[id] = Some(rule);
        Ok(id)
    }

    fn memoized(&mut self, key: String, raw: &RawRule, context: &Context) -> Result<RuleId> {
        if let Some(&id) = self.memo.get(&key) {
            return Ok(id);
        }
        let id = self.reserve();
        self.memo.insert(key, id);
        let rule = self.build(raw, context)?;
        self.rules[id] = Some(rule);
        Ok(id)
    }

    fn build(&mut self, raw: &RawRule, context: &Context) -> Result<Rule> {
        let context = match &raw.repository {
            Some(repository) => {
                self.repositories += 1;
                let mut nested = context.clone();
                nested
                    .locals
                    .push((self.repositories, Arc::new(repository.clone())));
                nested
            }
            None => context.clone(),
        };

        if let Some(include) = &raw.include {
            let patterns = self.include(include, &context)?.into_iter().collect();
            return Ok(Rule::Patterns(PatternsRule { patterns }));
        }

        if let Some(pattern) = &raw.match_ {
            return Ok(Rule::Match(MatchRule {
                name: raw.name.clone(),
                regex: RegexSource::new(pattern)?,
                captures: self.captures(raw.captures.as_ref(), &context)?,
            }));
        }

        let Some(begin) = &raw.begin else {
            let patterns = self.patterns(&raw.patterns, &context)?;
            return Ok(Rule::Patterns(PatternsRule { patterns }));
        };

        let begin_captures = raw.begin_captures.as_ref().or(raw.captures.as_ref());
        let patterns = self.patterns(&raw.patterns, &context)?;

        if let Some(while_) = &raw.while_ {
            let while_captures = raw.while_captures.as_ref().or(raw.captures.as_ref());
            return Ok(Rule::BeginWhile(BeginWhileRule {
                name: raw.name.clone(),
                content_name: raw.content_name.clone(),
                begin: RegexSource::new(begin)?,
                begin_captures: self.captures(begin_captures, &context)?,
                while_: RegexSource::with_back_references(while_)?,
                while_captures: self.captures(while_captures, &context)?,
                patterns,
            }));
        }

        let end_captures = raw.end_captures.as_ref().or(raw.captures.as_ref());
        // a begin without an end runs to the end of the document
        let end = raw.end.as_deref().unwrap_or("\u{FFFF}");
        Ok(Rule::BeginEnd(BeginEndRule {
            name: raw.name.clone(),
            content_name: raw.content_name.clone(),
            begin: RegexSource::new(begin)?,
            begin_captures: self.captures(begin_captures, &context)?,
            end: RegexSource::with_back_references(end)?,
            end_captures: self.captures(end_captures, &context)?,
            apply_end_pattern_last: raw.apply_end_pattern_last,
            patterns,
        }))
    }

    fn captures(
        &mut self,
        raw: Option<&RawCaptures>,
        context: &Context,
    ) -> Result<Vec<Option<CaptureRule>>> {
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        let mut numbered: Vec<(usize, &RawRule)> = raw
            .iter()
            .filter_map(|(key, rule)| key.parse::<usize>().ok().map(|index| (index, rule)))
            .collect();
        numbered.sort_by_key(|(index, _)| *index);

        let len = numbered.last().map_or(0, |(index, _)| index + 1);
        let mut captures: Vec<Option<CaptureRule>> = (0..len).map(|_| None).collect();
        for (index, rule) in numbered {
            let patterns = if rule.patterns.is_empty() {
                None
            } else {
                let patterns = self.patterns(&rule.patterns, context)?;
                let id = self.reserve();
                self.rules[id] = Some(Rule::Patterns(PatternsRule { patterns }));
                Some(id)
            };
            captures[index] = Some(CaptureRule {
                name: rule.name.clone(),
                content_name: rule.content_name.clone(),
                patterns,
            });
        }
        Ok(captures)
    }

    fn include(&mut self, reference: &str, context: &Context) -> Result<Option<RuleId>> {
        match reference {
            "$self" => {
                let grammar = context.grammar.clone();
                self.grammar_root(&grammar).map(Some)
            }
            "$base" => {
                let base = self.base.clone();
                self.grammar_root(&base).map(Some)
            }
            local if local.starts_with('#') => self.local(&local[1..], context),
            external => {
                let (scope_name, name) = match external.split_once('#') {
                    Some((scope_name, name)) => (scope_name, Some(name)),
                    None => (external, None),
                };
                let Some(grammar) = self.grammar(scope_name)? else {
                    warn!(include = external, "no grammar for included scope");
                    return Ok(None);
                };
                match name {
                    None => self.grammar_root(&grammar).map(Some),
                    Some(name) => self.repository_entry(&grammar, name),
                }
            }
        }
    }

    fn local(&mut self, name: &str, context: &Context) -> Result<Option<RuleId>> {
        for (depth, (id, repository)) in context.locals.iter().enumerate().rev() {
            if let Some(raw) = repository.get(name) {
                let key = format!("{}#local{id}/{name}", context.grammar.scope_name);
                let defined_in = Context {
                    grammar: context.grammar.clone(),
                    locals: context.locals[..=depth].to_vec(),
                };
                return self.memoized(key, raw, &defined_in).map(Some);
            }
        }
        let grammar = context.grammar.clone();
        self.repository_entry(&grammar, name)
    }

    fn repository_entry(&mut self, grammar: &Arc<RawGrammar>, name: &str) -> Result<Option<RuleId>> {
        match grammar.repository.get(name) {
            Some(raw) => {
                let key = format!("{}#{name}", grammar.scope_name);
                self.memoized(key, raw, &Context::root(grammar.clone()))
                    .map(Some)
            }
            None => {
                warn!(
                    grammar = %grammar.scope_name,
                    rule = name,
                    "include refers to a missing repository entry"
                );
                Ok(None)
            }
        }
    }

    fn grammar(&mut self, scope_name: &str) -> Result<Option<Arc<RawGrammar>>> {
        if let Some(grammar) = self.grammars.get(scope_name) {
            return Ok(Some(grammar.clone()));
        }
        let fetched = (self.fetch)(scope_name)?;
        if let Some(grammar) = &fetched {
            self.grammars.insert(scope_name.to_string(), grammar.clone());
        }
        Ok(fetched)
    }
}
