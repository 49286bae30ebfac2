//! Serde model of a TextMate grammar in its JSON form.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Captures are keyed by group number, written as a string (`"0"`, `"1"`, ...).
pub type RawCaptures = HashMap<String, RawRule>;

pub type RawRepository = HashMap<String, RawRule>;

/// A complete grammar document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    pub scope_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub first_line_match: Option<String>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
    #[serde(default)]
    pub repository: RawRepository,
}

/// One rule: an include, a match, a begin/end or begin/while pair, or a pattern group
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_name: Option<String>,
    #[serde(default, rename = "match")]
    pub match_: Option<String>,
    #[serde(default)]
    pub captures: Option<RawCaptures>,
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub begin_captures: Option<RawCaptures>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub end_captures: Option<RawCaptures>,
    #[serde(default, rename = "while")]
    pub while_: Option<String>,
    #[serde(default)]
    pub while_captures: Option<RawCaptures>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
    #[serde(default)]
    pub repository: Option<RawRepository>,
    #[serde(default, deserialize_with = "flag")]
    pub apply_end_pattern_last: bool,
    #[serde(default, deserialize_with = "flag")]
    pub disabled: bool,
}

/// Grammars write boolean switches as `true` as often as `1`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
