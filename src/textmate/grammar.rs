//! Compiled grammars and line tokenization
//!
//! Tokenizing a line scans forward from the current position with every pattern the open rule
//! allows (its children, plus its end pattern). The leftmost match wins and either emits scoped
//! text, opens a nested rule, or closes the current one. State that must survive the line
//! (open begin/end and begin/while rules) is returned as a [RuleStack].
//!
//! Each line is scanned with a `\n` appended, so patterns anchored on `$` or matching the line
//! break behave as they do in editors. Tokens never extend past the line itself.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use onig::Regex;
use tracing::warn;

use super::raw::RawGrammar;
use super::rule::{CaptureRule, Compiler, Fetch, Rule, RuleId};
use super::scanner::{
    compile, has_anchors, resolve_back_references, resolve_captures_in_name, with_anchors,
    OnigScanner, RegexSource,
};
use super::stack::{Frame, RuleStack};
use crate::error::Result;

/// A scoped span of a line, as byte offsets into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Outermost scope first; the grammar's own scope name always leads
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeLineResult {
    pub tokens: Vec<Token>,
    /// State to pass when tokenizing the next line
    pub rule_stack: RuleStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    End,
    Rule(RuleId),
}

/// Opening patterns of a rule's children, in priority order.
struct PatternScanner {
    regexes: Vec<Arc<Regex>>,
    rules: Vec<RuleId>,
}

type ScannerKey = (RuleId, bool, bool);
type ResolvedKey = (String, bool, bool);

pub struct Grammar {
    scope_name: String,
    root: RuleId,
    root_scopes: Vec<String>,
    rules: Vec<Rule>,
    flattened: Vec<OnceCell<Vec<RuleId>>>,
    scanners: Mutex<HashMap<ScannerKey, Arc<PatternScanner>>>,
    resolved: Mutex<HashMap<ResolvedKey, Option<Arc<Regex>>>>,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("scope_name", &self.scope_name)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Grammar {
    /// Compiles a grammar, fetching other grammars it includes through `fetch`.
    pub(crate) fn compile(raw: Arc<RawGrammar>, fetch: &mut Fetch<'_>) -> Result<Self> {
        let scope_name = raw.scope_name.clone();
        let (root, rules) = Compiler::new(raw, fetch).compile()?;
        Ok(Grammar {
            root_scopes: scope_name.split_whitespace().map(str::to_string).collect(),
            scope_name,
            root,
            flattened: (0..rules.len()).map(|_| OnceCell::new()).collect(),
            rules,
            scanners: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        })
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Tokenizes one line (without its terminator) starting from `previous`.
    ///
    /// Pass [RuleStack::INITIAL] for the first line of a document and the returned stack for
    /// every line after it.
    pub fn tokenize_line(&self, line: &str, previous: &RuleStack) -> TokenizeLineResult {
        let mut is_first_line = previous.is_initial();
        let mut stack = match previous.frames() {
            Some(frames) if !frames.is_empty() => frames.to_vec(),
            _ => vec![self.root_frame()],
        };

        let text = format!("{line}\n");
        let mut tokens = LineTokens::default();
        let (pos, anchor) =
            self.check_while_conditions(&text, &mut is_first_line, &mut stack, &mut tokens);
        self.scan(&text, is_first_line, pos, anchor, &mut stack, &mut tokens);

        let scopes = stack
            .last()
            .map(|frame| frame.content_scopes.clone())
            .unwrap_or_default();
        TokenizeLineResult {
            tokens: tokens.finish(line.len(), &scopes),
            rule_stack: RuleStack::from_frames(stack),
        }
    }

    fn root_frame(&self) -> Frame {
        Frame {
            rule: self.root,
            resolved_source: None,
            name_scopes: self.root_scopes.clone(),
            content_scopes: self.root_scopes.clone(),
            enter_pos: None,
            anchor_pos: None,
        }
    }

    /// Begin/while rules stay open only while their while pattern matches each new line.
    fn check_while_conditions(
        &self,
        text: &str,
        is_first_line: &mut bool,
        stack: &mut Vec<Frame>,
        tokens: &mut LineTokens,
    ) -> (usize, Option<usize>) {
        let mut pos = 0;
        let mut anchor = None;

        let mut depth = 0;
        while depth < stack.len() {
            let frame = &stack[depth];
            let Rule::BeginWhile(rule) = &self.rules[frame.rule] else {
                depth += 1;
                continue;
            };

            let regex = self.closing_regex(
                &rule.while_,
                frame.resolved_source.as_deref(),
                *is_first_line,
                anchor == Some(pos),
            );
            let found = regex
                .and_then(|regex| OnigScanner::from_compiled(vec![regex]).find_next_match(text, pos));
            let Some(found) = found else {
                stack.truncate(depth);
                break;
            };

            let scopes = frame.content_scopes.clone();
            tokens.produce(&scopes, found.start());
            self.handle_captures(
                text,
                *is_first_line,
                &stack[..=depth],
                &scopes,
                tokens,
                &rule.while_captures,
                &found.captures,
            );
            tokens.produce(&scopes, found.end());

            anchor = Some(found.end());
            if found.end() > pos {
                pos = found.end();
                *is_first_line = false;
            }
            depth += 1;
        }

        (pos, anchor)
    }

    fn scan(
        &self,
        text: &str,
        mut is_first_line: bool,
        mut pos: usize,
        mut anchor: Option<usize>,
        stack: &mut Vec<Frame>,
        tokens: &mut LineTokens,
    ) {
        let len = text.len();
        while pos < len {
            let Some(top) = stack.last() else { break };
            let (scanner, candidates) = self.candidates(top, is_first_line, anchor == Some(pos));
            let Some(found) = scanner.find_next_match(text, pos) else {
                tokens.produce(&top.content_scopes, len);
                break;
            };

            let (start, end) = (found.start(), found.end());
            let advanced = end > pos;

            match candidates[found.index] {
                Candidate::End => {
                    let frame = &stack[stack.len() - 1];
                    tokens.produce(&frame.content_scopes, start);
                    if let Rule::BeginEnd(rule) = &self.rules[frame.rule] {
                        self.handle_captures(
                            text,
                            is_first_line,
                            stack,
                            &frame.name_scopes,
                            tokens,
                            &rule.end_captures,
                            &found.captures,
                        );
                    }
                    tokens.produce(&frame.name_scopes, end);

                    let Some(popped) = stack.pop() else { break };
                    anchor = popped.anchor_pos;
                    if !advanced && popped.enter_pos == Some(pos) {
                        // pushed and popped on the same spot; stop instead of looping
                        stack.push(popped);
                        produce_rest(stack, tokens, len);
                        break;
                    }
                }
                Candidate::Rule(id) => {
                    let rule = &self.rules[id];
                    let parent_scopes = top_scopes(stack);
                    tokens.produce(&parent_scopes, start);
                    let name_scopes = push_scopes(&parent_scopes, rule.name(), text, &found.captures);

                    match rule {
                        Rule::Match(rule) => {
                            self.handle_captures(
                                text,
                                is_first_line,
                                stack,
                                &name_scopes,
                                tokens,
                                &rule.captures,
                                &found.captures,
                            );
                            tokens.produce(&name_scopes, end);
                            if !advanced {
                                if stack.len() > 1 {
                                    stack.pop();
                                }
                                produce_rest(stack, tokens, len);
                                break;
                            }
                        }
                        Rule::BeginEnd(rule) => {
                            self.handle_captures(
                                text,
                                is_first_line,
                                stack,
                                &name_scopes,
                                tokens,
                                &rule.begin_captures,
                                &found.captures,
                            );
                            tokens.produce(&name_scopes, end);
                            let content_scopes = push_scopes(
                                &name_scopes,
                                rule.content_name.as_deref(),
                                text,
                                &found.captures,
                            );
                            let resolved_source = rule.end.has_back_references().then(|| {
                                resolve_back_references(rule.end.source(), text, &found.captures)
                            });
                            if self.push_frame(
                                stack,
                                id,
                                (name_scopes, content_scopes),
                                resolved_source,
                                (pos, anchor, advanced),
                            ) {
                                produce_rest(stack, tokens, len);
                                break;
                            }
                            anchor = Some(end);
                        }
                        Rule::BeginWhile(rule) => {
                            self.handle_captures(
                                text,
                                is_first_line,
                                stack,
                                &name_scopes,
                                tokens,
                                &rule.begin_captures,
                                &found.captures,
                            );
                            tokens.produce(&name_scopes, end);
                            let content_scopes = push_scopes(
                                &name_scopes,
                                rule.content_name.as_deref(),
                                text,
                                &found.captures,
                            );
                            let resolved_source = rule.while_.has_back_references().then(|| {
                                resolve_back_references(rule.while_.source(), text, &found.captures)
                            });
                            if self.push_frame(
                                stack,
                                id,
                                (name_scopes, content_scopes),
                                resolved_source,
                                (pos, anchor, advanced),
                            ) {
                                produce_rest(stack, tokens, len);
                                break;
                            }
                            anchor = Some(end);
                        }
                        // pattern groups are flattened away before scanning
                        Rule::Patterns(_) => break,
                    }
                }
            }

            if advanced {
                pos = end;
                is_first_line = false;
            }
        }
    }

    /// Pushes a begin rule. Returns true when the push would repeat a rule already entered at
    /// this position without consuming input, in which case nothing is pushed.
    fn push_frame(
        &self,
        stack: &mut Vec<Frame>,
        rule: RuleId,
        (name_scopes, content_scopes): (Vec<String>, Vec<String>),
        resolved_source: Option<String>,
        (pos, anchor, advanced): (usize, Option<usize>, bool),
    ) -> bool {
        let repeats = !advanced
            && stack
                .iter()
                .rev()
                .take_while(|frame| frame.enter_pos == Some(pos))
                .any(|frame| frame.rule == rule);
        if repeats {
            return true;
        }
        stack.push(Frame {
            rule,
            resolved_source,
            name_scopes,
            content_scopes,
            enter_pos: Some(pos),
            anchor_pos: anchor,
        });
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_captures(
        &self,
        text: &str,
        is_first_line: bool,
        stack: &[Frame],
        base_scopes: &[String],
        tokens: &mut LineTokens,
        rules: &[Option<CaptureRule>],
        captures: &[Option<Range<usize>>],
    ) {
        let Some(whole) = captures.first().cloned().flatten() else {
            return;
        };

        // scopes of enclosing captures, with the position where each closes
        let mut open: Vec<(Vec<String>, usize)> = Vec::new();
        for (rule, range) in rules.iter().zip(captures) {
            let (Some(rule), Some(range)) = (rule, range) else {
                continue;
            };
            if range.is_empty() {
                continue;
            }
            if range.start > whole.end {
                break;
            }

            while let Some((scopes, end)) = open.last() {
                if *end > range.start {
                    break;
                }
                tokens.produce(scopes, *end);
                open.pop();
            }

            let parent = open
                .last()
                .map_or(base_scopes, |(scopes, _)| scopes.as_slice());
            tokens.produce(parent, range.start);

            if let Some(patterns) = rule.patterns {
                let Some(captured) = text.get(..range.end) else {
                    continue;
                };
                let name_scopes = push_scopes(parent, rule.name.as_deref(), text, captures);
                let content_scopes =
                    push_scopes(&name_scopes, rule.content_name.as_deref(), text, captures);
                let mut nested = stack.to_vec();
                nested.push(Frame {
                    rule: patterns,
                    resolved_source: None,
                    name_scopes,
                    content_scopes,
                    enter_pos: Some(range.start),
                    anchor_pos: None,
                });
                self.scan(
                    captured,
                    is_first_line && range.start == 0,
                    range.start,
                    None,
                    &mut nested,
                    tokens,
                );
                continue;
            }

            if let Some(name) = rule.name.as_deref() {
                let scopes = push_scopes(parent, Some(name), text, captures);
                open.push((scopes, range.end));
            }
        }

        while let Some((scopes, end)) = open.pop() {
            tokens.produce(&scopes, end);
        }
    }

    /// The patterns that may match inside the given frame, in priority order.
    fn candidates(
        &self,
        frame: &Frame,
        allow_a: bool,
        allow_g: bool,
    ) -> (OnigScanner, Vec<Candidate>) {
        let patterns = self.pattern_scanner(frame.rule, allow_a, allow_g);
        let mut regexes = Vec::with_capacity(patterns.regexes.len() + 1);
        let mut candidates = Vec::with_capacity(patterns.rules.len() + 1);

        let end = match &self.rules[frame.rule] {
            Rule::BeginEnd(rule) => self
                .closing_regex(&rule.end, frame.resolved_source.as_deref(), allow_a, allow_g)
                .map(|regex| (regex, rule.apply_end_pattern_last)),
            _ => None,
        };

        if let Some((regex, false)) = &end {
            regexes.push(regex.clone());
            candidates.push(Candidate::End);
        }
        regexes.extend(patterns.regexes.iter().cloned());
        candidates.extend(patterns.rules.iter().map(|&id| Candidate::Rule(id)));
        if let Some((regex, true)) = end {
            regexes.push(regex);
            candidates.push(Candidate::End);
        }

        (OnigScanner::from_compiled(regexes), candidates)
    }

    fn pattern_scanner(&self, rule: RuleId, allow_a: bool, allow_g: bool) -> Arc<PatternScanner> {
        let key = (rule, allow_a, allow_g);
        let mut scanners = self.scanners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(scanner) = scanners.get(&key) {
            return scanner.clone();
        }

        let mut regexes = Vec::new();
        let mut rules = Vec::new();
        for &id in self.flattened(rule) {
            if let Some(regex) = self.rules[id]
                .opening()
                .and_then(|source| source.resolve(allow_a, allow_g))
            {
                regexes.push(regex);
                rules.push(id);
            }
        }
        let scanner = Arc::new(PatternScanner { regexes, rules });
        scanners.insert(key, scanner.clone());
        scanner
    }

    /// Child rules of `rule` with pattern groups expanded in place.
    fn flattened(&self, rule: RuleId) -> &[RuleId] {
        self.flattened[rule].get_or_init(|| {
            let mut seen = HashSet::from([rule]);
            let mut out = Vec::new();
            self.flatten_into(self.rules[rule].patterns(), &mut seen, &mut out);
            out
        })
    }

    fn flatten_into(&self, patterns: &[RuleId], seen: &mut HashSet<RuleId>, out: &mut Vec<RuleId>) {
        for &id in patterns {
            match &self.rules[id] {
                Rule::Patterns(group) => {
                    if seen.insert(id) {
                        self.flatten_into(&group.patterns, seen, out);
                    }
                }
                _ => out.push(id),
            }
        }
    }

    fn closing_regex(
        &self,
        source: &RegexSource,
        resolved: Option<&str>,
        allow_a: bool,
        allow_g: bool,
    ) -> Option<Arc<Regex>> {
        match resolved {
            Some(resolved) => self.resolved_regex(resolved, allow_a, allow_g),
            None => source.resolve(allow_a, allow_g),
        }
    }

    fn resolved_regex(&self, source: &str, allow_a: bool, allow_g: bool) -> Option<Arc<Regex>> {
        let key = (source.to_string(), allow_a, allow_g);
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = resolved.get(&key) {
            return regex.clone();
        }

        let pattern = if has_anchors(source) {
            with_anchors(source, allow_a, allow_g)
        } else {
            source.to_string()
        };
        let regex = match compile(&pattern) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(err) => {
                warn!(%err, "end pattern cannot be compiled, rule will not close");
                None
            }
        };
        resolved.insert(key, regex.clone());
        regex
    }
}

fn top_scopes(stack: &[Frame]) -> Vec<String> {
    stack
        .last()
        .map(|frame| frame.content_scopes.clone())
        .unwrap_or_default()
}

fn produce_rest(stack: &[Frame], tokens: &mut LineTokens, len: usize) {
    tokens.produce(&top_scopes(stack), len);
}

fn push_scopes(
    base: &[String],
    name: Option<&str>,
    text: &str,
    captures: &[Option<Range<usize>>],
) -> Vec<String> {
    let mut scopes = base.to_vec();
    if let Some(name) = name {
        let name = resolve_captures_in_name(name, text, captures);
        scopes.extend(name.split_whitespace().map(str::to_string));
    }
    scopes
}

/// Accumulates the tokens of one line; each token starts where the previous one ended.
#[derive(Debug, Default)]
struct LineTokens {
    tokens: Vec<Token>,
    last_end: usize,
}

impl LineTokens {
    fn produce(&mut self, scopes: &[String], end: usize) {
        if end <= self.last_end {
            return;
        }
        self.tokens.push(Token {
            start: self.last_end,
            end,
            scopes: scopes.to_vec(),
        });
        self.last_end = end;
    }

    /// Clips the tokens to the line; an empty line still yields one empty token.
    fn finish(mut self, line_len: usize, scopes: &[String]) -> Vec<Token> {
        self.tokens.retain(|token| token.start < line_len);
        for token in &mut self.tokens {
            token.end = token.end.min(line_len);
        }
        if self.tokens.is_empty() {
            self.tokens.push(Token {
                start: 0,
                end: line_len,
                scopes: scopes.to_vec(),
            });
        }
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grammar(value: serde_json::Value) -> Grammar {
        let raw: RawGrammar = serde_json::from_value(value).unwrap();
        let mut fetch = |_: &str| -> Result<Option<Arc<RawGrammar>>> { Ok(None) };
        Grammar::compile(Arc::new(raw), &mut fetch).unwrap()
    }

    fn spans<'a>(line: &'a str, tokens: &[Token]) -> Vec<(&'a str, String)> {
        tokens
            .iter()
            .map(|token| (&line[token.start..token.end], token.scopes.join(" ")))
            .collect()
    }

    fn test_grammar() -> Grammar {
        grammar(json!({
            "scopeName": "source.test",
            "patterns": [
                {"include": "#comment"},
                {"include": "#string"},
                {"match": "\\b(let)\\s+(\\w+)", "captures": {
                    "1": {"name": "keyword.test"},
                    "2": {"name": "variable.test"}
                }},
                {"match": "\\d+", "name": "constant.numeric.test"}
            ],
            "repository": {
                "comment": {
                    "begin": "/\\*", "end": "\\*/", "name": "comment.block.test"
                },
                "string": {
                    "begin": "(['\"])", "end": "\\1", "name": "string.quoted.test",
                    "beginCaptures": {"1": {"name": "punctuation.begin.test"}},
                    "endCaptures": {"0": {"name": "punctuation.end.test"}}
                }
            }
        }))
    }

    #[test]
    fn match_rules_and_captures() {
        let grammar = test_grammar();
        let line = "let x 42";
        let result = grammar.tokenize_line(line, &RuleStack::INITIAL);
        assert_eq!(
            spans(line, &result.tokens),
            vec![
                ("let", "source.test keyword.test".to_string()),
                (" ", "source.test".to_string()),
                ("x", "source.test variable.test".to_string()),
                (" ", "source.test".to_string()),
                ("42", "source.test constant.numeric.test".to_string()),
            ]
        );
        assert_eq!(result.rule_stack.depth(), 1);
    }

    #[test]
    fn begin_end_spans_lines() {
        let grammar = test_grammar();
        let first = grammar.tokenize_line("1 /* a", &RuleStack::INITIAL);
        assert_eq!(first.rule_stack.depth(), 2);
        assert_eq!(
            first.rule_stack.scopes(),
            ["source.test".to_string(), "comment.block.test".to_string()]
        );

        let line = "b */ 2";
        let second = grammar.tokenize_line(line, &first.rule_stack);
        assert_eq!(
            spans(line, &second.tokens),
            vec![
                ("b ", "source.test comment.block.test".to_string()),
                ("*/", "source.test comment.block.test".to_string()),
                (" ", "source.test".to_string()),
                ("2", "source.test constant.numeric.test".to_string()),
            ]
        );
        assert_eq!(second.rule_stack.depth(), 1);
    }

    #[test]
    fn end_pattern_uses_begin_back_reference() {
        let grammar = test_grammar();
        let line = r#""it's" 1"#;
        let result = grammar.tokenize_line(line, &RuleStack::INITIAL);
        assert_eq!(
            spans(line, &result.tokens),
            vec![
                ("\"", "source.test string.quoted.test punctuation.begin.test".to_string()),
                ("it's", "source.test string.quoted.test".to_string()),
                ("\"", "source.test string.quoted.test punctuation.end.test".to_string()),
                (" ", "source.test".to_string()),
                ("1", "source.test constant.numeric.test".to_string()),
            ]
        );
    }

    #[test]
    fn empty_line_yields_one_empty_token() {
        let grammar = test_grammar();
        let open = grammar.tokenize_line("/*", &RuleStack::INITIAL);
        let result = grammar.tokenize_line("", &open.rule_stack);
        assert_eq!(
            result.tokens,
            vec![Token {
                start: 0,
                end: 0,
                scopes: vec!["source.test".to_string(), "comment.block.test".to_string()],
            }]
        );
        assert_eq!(result.rule_stack, open.rule_stack);
    }

    #[test]
    fn tokens_cover_the_line_without_gaps() {
        let grammar = test_grammar();
        let line = "let a /* c */ 'q' 7";
        let tokens = grammar.tokenize_line(line, &RuleStack::INITIAL).tokens;
        assert_eq!(tokens.first().unwrap().start, 0);
        assert_eq!(tokens.last().unwrap().end, line.len());
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn zero_width_begin_does_not_loop() {
        let grammar = grammar(json!({
            "scopeName": "source.test",
            "patterns": [{"begin": "(?=x)", "end": "(?=x)", "patterns": [{"include": "$self"}]}]
        }));
        let result = grammar.tokenize_line("xx", &RuleStack::INITIAL);
        assert_eq!(result.tokens.last().unwrap().end, 2);
    }

    #[test]
    fn begin_while_continues_while_pattern_matches() {
        let grammar = grammar(json!({
            "scopeName": "source.test",
            "patterns": [{"begin": "^>", "while": "^>", "name": "quote.test"}]
        }));
        let first = grammar.tokenize_line("> a", &RuleStack::INITIAL);
        let second = grammar.tokenize_line("> b", &first.rule_stack);
        assert_eq!(second.rule_stack.depth(), 2);
        assert!(second.tokens.iter().all(|t| t.scopes.contains(&"quote.test".to_string())));
        let third = grammar.tokenize_line("c", &second.rule_stack);
        assert_eq!(third.rule_stack.depth(), 1);
        assert_eq!(third.tokens[0].scopes, vec!["source.test".to_string()]);
    }

    #[test]
    fn capture_patterns_retokenize_captured_text() {
        let grammar = grammar(json!({
            "scopeName": "source.test",
            "patterns": [{
                "match": "\\[(.*)\\]",
                "name": "list.test",
                "captures": {"1": {"patterns": [{"match": "\\d", "name": "digit.test"}]}}
            }]
        }));
        let line = "[1a]";
        let result = grammar.tokenize_line(line, &RuleStack::INITIAL);
        assert_eq!(
            spans(line, &result.tokens),
            vec![
                ("[", "source.test list.test".to_string()),
                ("1", "source.test list.test digit.test".to_string()),
                ("a", "source.test list.test".to_string()),
                ("]", "source.test list.test".to_string()),
            ]
        );
    }

    #[test]
    fn first_line_anchor_only_matches_first_line() {
        let grammar = grammar(json!({
            "scopeName": "source.test",
            "patterns": [{"match": "\\Ahead", "name": "head.test"}]
        }));
        let first = grammar.tokenize_line("head", &RuleStack::INITIAL);
        assert_eq!(first.tokens[0].scopes.len(), 2);
        let second = grammar.tokenize_line("head", &first.rule_stack);
        assert_eq!(second.tokens[0].scopes.len(), 1);
    }
}
