//! Rendering of tokenized lines
//!
//! Three formats are available:
//!     - `json`: an array of lines, each an array of `{ "text", "scopes" }` records
//!     - `yaml`: the same structure as YAML
//!     - `simple`: one token per row, the quoted text followed by its scopes, with a blank row
//!       between source lines

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::harness::ScopedToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    Json,
    Yaml,
    Simple,
}

impl TokenFormat {
    pub const ALL: [TokenFormat; 3] = [TokenFormat::Json, TokenFormat::Yaml, TokenFormat::Simple];

    pub fn name(self) -> &'static str {
        match self {
            TokenFormat::Json => "json",
            TokenFormat::Yaml => "yaml",
            TokenFormat::Simple => "simple",
        }
    }

    /// Renders tokenized lines, one inner vector per source line.
    pub fn render(self, lines: &[Vec<ScopedToken>]) -> Result<String> {
        match self {
            TokenFormat::Json => {
                let mut out = serde_json::to_string_pretty(lines)?;
                out.push('\n');
                Ok(out)
            }
            TokenFormat::Yaml => Ok(serde_yaml::to_string(lines)?),
            TokenFormat::Simple => Ok(render_simple(lines)),
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenFormat::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| format!("unknown token format '{s}' (expected json, yaml or simple)"))
    }
}

fn render_simple(lines: &[Vec<ScopedToken>]) -> String {
    let mut out = String::new();
    for (index, tokens) in lines.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        for token in tokens {
            out.push_str(&format!("{:?}  {}\n", token.text, token.scopes.join(" ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lines() -> Vec<Vec<ScopedToken>> {
        vec![
            vec![
                ScopedToken {
                    text: ".foo".to_string(),
                    scopes: vec!["source.css".to_string(), "entity.class.css".to_string()],
                },
                ScopedToken {
                    text: " ".to_string(),
                    scopes: vec!["source.css".to_string()],
                },
            ],
            vec![ScopedToken {
                text: "}".to_string(),
                scopes: vec!["source.css".to_string()],
            }],
        ]
    }

    #[rstest]
    #[case("json", TokenFormat::Json)]
    #[case("yaml", TokenFormat::Yaml)]
    #[case("simple", TokenFormat::Simple)]
    fn parses_format_names(#[case] name: &str, #[case] expected: TokenFormat) {
        assert_eq!(name.parse::<TokenFormat>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "xml".parse::<TokenFormat>().unwrap_err();
        assert!(err.contains("xml"));
    }

    #[test]
    fn renders_simple() {
        let out = TokenFormat::Simple.render(&lines()).unwrap();
        assert_eq!(
            out,
            "\".foo\"  source.css entity.class.css\n\" \"  source.css\n\n\"}\"  source.css\n"
        );
    }

    #[test]
    fn renders_json() {
        let out = TokenFormat::Json.render(&lines()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0][0]["text"], ".foo");
        assert_eq!(value[1][0]["scopes"][0], "source.css");
        assert!(value[0][0].get("start").is_none());
    }

    #[test]
    fn renders_yaml() {
        let out = TokenFormat::Yaml.render(&lines()).unwrap();
        let value: Vec<Vec<ScopedToken>> = serde_yaml::from_str(&out).unwrap();
        assert_eq!(value, lines());
    }
}
