//! Oniguruma regular expressions for grammar rules
//!
//! Grammar patterns are Oniguruma regexes. Two anchors need special handling: `\A` may only
//! match on the first line of a document and `\G` only where the previous match ended. A
//! pattern that uses either is compiled in four variants, with the forbidden anchors replaced
//! by a character that never occurs in text.

use std::ops::Range;
use std::sync::Arc;

use onig::{Regex, RegexOptions, Region, SearchOptions, Syntax};
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Stand-in for a disabled anchor.
const NEVER: char = '\u{FFFF}';

static BACK_REFERENCE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\\(\d+)").expect("valid back reference pattern"));

static CAPTURE_REFERENCE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"\$(\d+)|\$\{(\d+):/(downcase|upcase)\}")
        .expect("valid capture reference pattern")
});

/// Compiles a single Oniguruma pattern.
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::with_options(
        pattern,
        RegexOptions::REGEX_OPTION_CAPTURE_GROUP,
        Syntax::default(),
    )
    .map_err(|err| Error::InvalidRegex {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

/// A rule pattern with its anchor variants compiled ahead of time.
#[derive(Debug)]
pub(crate) struct RegexSource {
    source: String,
    has_back_references: bool,
    // empty for patterns resolved per match, one entry without anchors, four entries with
    variants: Vec<Arc<Regex>>,
}

impl RegexSource {
    pub fn new(source: &str) -> Result<Self> {
        let variants = if has_anchors(source) {
            let mut variants = Vec::with_capacity(4);
            for allow_a in [false, true] {
                for allow_g in [false, true] {
                    variants.push(Arc::new(compile(&with_anchors(source, allow_a, allow_g))?));
                }
            }
            variants
        } else {
            vec![Arc::new(compile(source)?)]
        };
        Ok(RegexSource {
            source: source.to_string(),
            has_back_references: false,
            variants,
        })
    }

    /// An `end` or `while` pattern, which may refer back to groups of the `begin` match.
    pub fn with_back_references(source: &str) -> Result<Self> {
        if BACK_REFERENCE.is_match(source) {
            Ok(RegexSource {
                source: source.to_string(),
                has_back_references: true,
                variants: Vec::new(),
            })
        } else {
            Self::new(source)
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_back_references(&self) -> bool {
        self.has_back_references
    }

    /// The compiled variant for the given anchor permissions, if compiled ahead of time.
    pub fn resolve(&self, allow_a: bool, allow_g: bool) -> Option<Arc<Regex>> {
        match self.variants.len() {
            1 => Some(self.variants[0].clone()),
            4 => Some(self.variants[usize::from(allow_a) * 2 + usize::from(allow_g)].clone()),
            _ => None,
        }
    }
}

pub(crate) fn has_anchors(source: &str) -> bool {
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some('A' | 'G') = chars.next() {
                return true;
            }
        }
    }
    false
}

/// Rewrites `\A` and `\G` so that disallowed anchors can never match.
pub(crate) fn with_anchors(source: &str, allow_a: bool, allow_g: bool) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('A') if !allow_a => out.push(NEVER),
            Some('G') if !allow_g => out.push(NEVER),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Substitutes `\N` in an end pattern with the escaped text of group N of the begin match.
pub(crate) fn resolve_back_references(
    source: &str,
    line: &str,
    captures: &[Option<Range<usize>>],
) -> String {
    BACK_REFERENCE
        .replace_all(source, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| captures.get(index).cloned().flatten())
                .and_then(|range| line.get(range))
                .map(escape)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Expands `$N` and `${N:/downcase}` references in a scope name.
pub(crate) fn resolve_captures_in_name(
    name: &str,
    line: &str,
    captures: &[Option<Range<usize>>],
) -> String {
    if !name.contains('$') {
        return name.to_string();
    }
    CAPTURE_REFERENCE
        .replace_all(name, |caps: &regex::Captures| {
            let index = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            let text = index
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| captures.get(index).cloned().flatten())
                .and_then(|range| line.get(range))
                .unwrap_or("")
                .trim_start_matches('.');
            match caps.get(3).map(|m| m.as_str()) {
                Some("downcase") => text.to_lowercase(),
                Some("upcase") => text.to_uppercase(),
                _ => text.to_string(),
            }
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if "-\\{}*+?|^$.,[]()#".contains(c) || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A successful scan: which pattern matched and where its groups landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    pub index: usize,
    pub captures: Vec<Option<Range<usize>>>,
}

impl ScanMatch {
    pub fn start(&self) -> usize {
        self.captures[0].as_ref().map_or(0, |range| range.start)
    }

    pub fn end(&self) -> usize {
        self.captures[0].as_ref().map_or(0, |range| range.end)
    }
}

/// Searches a list of patterns for the leftmost match; ties go to the earlier pattern.
#[derive(Debug, Clone, Default)]
pub struct OnigScanner {
    regexes: Vec<Arc<Regex>>,
}

impl OnigScanner {
    pub fn new(patterns: &[&str]) -> Result<Self> {
        let regexes = patterns
            .iter()
            .map(|pattern| compile(pattern).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(OnigScanner { regexes })
    }

    pub(crate) fn from_compiled(regexes: Vec<Arc<Regex>>) -> Self {
        OnigScanner { regexes }
    }

    pub fn len(&self) -> usize {
        self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    pub fn find_next_match(&self, text: &str, start: usize) -> Option<ScanMatch> {
        if start > text.len() {
            return None;
        }

        let mut best: Option<(usize, ScanMatch)> = None;
        for (index, regex) in self.regexes.iter().enumerate() {
            let mut region = Region::new();
            let found = regex.search_with_options(
                text,
                start,
                text.len(),
                SearchOptions::SEARCH_OPTION_NONE,
                Some(&mut region),
            );
            let Some(position) = found else { continue };
            if best.as_ref().is_some_and(|(best_position, _)| *best_position <= position) {
                continue;
            }

            let captures = (0..region.len())
                .map(|group| region.pos(group).map(|(from, to)| from..to))
                .collect();
            best = Some((position, ScanMatch { index, captures }));
            if position == start {
                break;
            }
        }
        best.map(|(_, found)| found)
    }
}
