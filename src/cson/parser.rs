//! CSON parser
//!
//! A chumsky parser over layout tokens, producing a [serde_json::Value].
//!
//! Grammar (layout tokens, see [super::lexing]):
//!
//!     document    := layout* (pair layout*)+        when the first token is a key
//!                  | layout* rhs? layout*
//!     pair        := key ':' rhs
//!     rhs         := block | value
//!     block       := Newline Indent (pair (Newline | ',')*)+ Dedent
//!                  | Newline Indent value (Newline | ',')* Dedent
//!     value       := pair | scalar | '{' layout* (pair layout*)* '}' | '[' layout* element* ']'
//!     element     := (pair layout*)+ | rhs layout*
//!
//! A key is a string, number or identifier directly followed by `:`; keys are marked before
//! parsing so the parser never has to guess between a key and a scalar. A pair used as a value
//! (`a: b: 1`) is a nested object with one entry. Bare pairs inside an array form a single
//! implicit object, as in CoffeeScript.

use std::ops::Range;

use chumsky::error::{Error as _, SimpleReason};
use chumsky::prelude::*;
use chumsky::Stream;
use serde_json::{Map, Number, Value};

use super::tokens::Token;
use super::CsonError;

type ParserError = Simple<Token>;

/// Parses layout tokens into a JSON value.
pub fn parse_tokens(source: &str, tokens: Vec<(Token, Range<usize>)>) -> Result<Value, CsonError> {
    let end = source.len();
    let tokens = mark_keys(tokens);
    let implicit_object = tokens
        .iter()
        .find(|(token, _)| !token.is_layout())
        .is_some_and(|(token, _)| matches!(token, Token::Key(_)));
    let stream = Stream::from_iter(end..end + 1, tokens.into_iter());

    let parsed = if implicit_object {
        object_document().parse(stream)
    } else {
        value_document().parse(stream)
    };
    parsed.map_err(|errors| {
        errors
            .into_iter()
            .next()
            .map(|error| CsonError::at(source, error.span().start.min(end), describe(&error)))
            .unwrap_or_else(|| CsonError::at(source, end, "invalid document".to_string()))
    })
}

fn describe(error: &ParserError) -> String {
    if let SimpleReason::Custom(message) = error.reason() {
        return message.clone();
    }

    let found = error
        .found()
        .map(|token| format!("`{token}`"))
        .unwrap_or_else(|| "end of input".to_string());
    let mut expected: Vec<String> = error
        .expected()
        .map(|token| match token {
            Some(token) => format!("`{token}`"),
            None => "end of input".to_string(),
        })
        .collect();
    expected.sort();
    expected.dedup();

    if expected.is_empty() {
        format!("unexpected {found}")
    } else {
        format!("unexpected {found}, expected {}", expected.join(" or "))
    }
}

/// Turns every string, number or identifier followed by a colon into a key.
fn mark_keys(tokens: Vec<(Token, Range<usize>)>) -> Vec<(Token, Range<usize>)> {
    let mut marked = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();
    while let Some((token, span)) = tokens.next() {
        let before_colon = matches!(tokens.peek(), Some((Token::Colon, _)));
        let token = match token {
            Token::Str(s) | Token::Ident(s) | Token::Number(s) if before_colon => Token::Key(s),
            other => other,
        };
        marked.push((token, span));
    }
    marked
}

fn key() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! {
        Token::Key(k) => k,
    }
}

fn layout() -> impl Parser<Token, (), Error = ParserError> + Clone {
    filter(|token: &Token| token.is_layout())
        .repeated()
        .ignored()
}

fn block_separator() -> impl Parser<Token, (), Error = ParserError> + Clone {
    filter(|token: &Token| matches!(token, Token::Newline | Token::Comma))
        .repeated()
        .ignored()
}

fn scalar() -> impl Parser<Token, Value, Error = ParserError> + Clone {
    filter_map(|span: Range<usize>, token: Token| match token {
        Token::Str(s) => Ok(Value::String(s)),
        Token::Number(n) => number(&n).map_err(|message| Simple::custom(span, message)),
        Token::Ident(word) => keyword(&word)
            .ok_or_else(|| Simple::custom(span, format!("unexpected identifier `{word}`"))),
        other => Err(Simple::expected_input_found(
            span,
            Vec::<Option<Token>>::new(),
            Some(other),
        )),
    })
}

/// Right-hand side of a pair: an indented block or an inline value.
fn rhs() -> impl Parser<Token, Value, Error = ParserError> + Clone {
    recursive(|rhs| {
        let pair = key().then_ignore(just(Token::Colon)).then(rhs.clone());

        let braced_object = pair
            .clone()
            .then_ignore(layout())
            .repeated()
            .delimited_by(just(Token::LBrace).then(layout()), just(Token::RBrace))
            .map(object);

        let element = pair
            .clone()
            .then_ignore(layout())
            .repeated()
            .at_least(1)
            .map(object)
            .or(rhs.then_ignore(layout()));

        let array = element
            .repeated()
            .delimited_by(just(Token::LBracket).then(layout()), just(Token::RBracket))
            .map(Value::Array);

        let inline_object = pair.clone().map(|pair| object(vec![pair]));

        let value = inline_object
            .or(scalar())
            .or(braced_object)
            .or(array)
            .boxed();

        let nested_object = pair
            .then_ignore(block_separator())
            .repeated()
            .at_least(1)
            .map(object);

        let block = just(Token::Newline)
            .ignore_then(just(Token::Indent))
            .ignore_then(nested_object.or(value.clone().then_ignore(block_separator())))
            .then_ignore(just(Token::Dedent));

        block.or(value)
    })
}

/// A document of top-level pairs, read as one implicit object.
fn object_document() -> impl Parser<Token, Value, Error = ParserError> {
    let top_level_object = key()
        .then_ignore(just(Token::Colon))
        .then(rhs())
        .then_ignore(layout())
        .repeated()
        .at_least(1)
        .map(object);

    layout().ignore_then(top_level_object).then_ignore(end())
}

/// A document holding a single value; an empty document is an empty object.
fn value_document() -> impl Parser<Token, Value, Error = ParserError> {
    layout()
        .ignore_then(
            rhs()
                .then_ignore(layout())
                .or_not()
                .map(|value| value.unwrap_or_else(|| Value::Object(Map::new()))),
        )
        .then_ignore(end())
}

/// Builds an object; a repeated key keeps its first position and takes the later value.
fn object(pairs: Vec<(String, Value)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key, value);
    }
    Value::Object(map)
}

fn keyword(word: &str) -> Option<Value> {
    match word {
        "true" | "yes" | "on" => Some(Value::Bool(true)),
        "false" | "no" | "off" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        _ => None,
    }
}

/// Converts a numeric literal with JavaScript semantics: integral values are integers.
fn number(text: &str) -> Result<Value, String> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let radix = match digits.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0b") | Some("0B") => Some(2),
        Some("0o") | Some("0O") => Some(8),
        _ => None,
    };
    if let Some(radix) = radix {
        let magnitude = i64::from_str_radix(&digits[2..], radix)
            .map_err(|_| format!("number out of range `{text}`"))?;
        return Ok(Value::from(if negative { -magnitude } else { magnitude }));
    }

    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Value::from(integer));
    }
    if let Ok(unsigned) = text.parse::<u64>() {
        return Ok(Value::from(unsigned));
    }

    let float: f64 = text
        .parse()
        .map_err(|_| format!("invalid number `{text}`"))?;
    if float.fract() == 0.0 && float.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::from(float as i64));
    }
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| format!("number out of range `{text}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cson::lexing::lex;
    use serde_json::json;

    fn parse(source: &str) -> Result<Value, CsonError> {
        parse_tokens(source, lex(source)?)
    }

    #[test]
    fn test_implicit_object() {
        let value = parse("name: 'CSS'\nscopeName: 'source.css'\n").unwrap();
        assert_eq!(value, json!({"name": "CSS", "scopeName": "source.css"}));
    }

    #[test]
    fn test_indented_object() {
        let value = parse("captures:\n  '1':\n    name: 'a'\n  '2':\n    name: 'b'\nend: 1\n").unwrap();
        assert_eq!(
            value,
            json!({"captures": {"1": {"name": "a"}, "2": {"name": "b"}}, "end": 1})
        );
    }

    #[test]
    fn test_pair_as_value_is_a_nested_object() {
        assert_eq!(parse("a: b: 1\n").unwrap(), json!({"a": {"b": 1}}));

        let value = parse("a: b: c: 'x'\nd: {e: f: 2}\n").unwrap();
        assert_eq!(value, json!({"a": {"b": {"c": "x"}}, "d": {"e": {"f": 2}}}));
    }

    #[test]
    fn test_array_of_braced_objects_with_nested_blocks() {
        let source = "\
patterns: [
  {
    begin: '\\\\{'
    beginCaptures:
      '0':
        name: 'punctuation'
    end: '\\\\}'
  }
  {
    include: '#comment'
  }
]
";
        let value = parse(source).unwrap();
        assert_eq!(
            value,
            json!({"patterns": [
                {"begin": "\\{", "beginCaptures": {"0": {"name": "punctuation"}}, "end": "\\}"},
                {"include": "#comment"}
            ]})
        );
    }

    #[test]
    fn test_inline_collections() {
        let value = parse("fileTypes: ['css', 'css.erb']\nempty: {}\nnone: []\n").unwrap();
        assert_eq!(
            value,
            json!({"fileTypes": ["css", "css.erb"], "empty": {}, "none": []})
        );
    }

    #[test]
    fn test_bare_pairs_in_array_form_one_object() {
        let value = parse("list: [\n  a: 1\n  b: 2\n]\n").unwrap();
        assert_eq!(value, json!({"list": [{"a": 1, "b": 2}]}));
    }

    #[test]
    fn test_scalars() {
        let value = parse("a: yes\nb: off\nc: null\nd: -2.5\ne: 0x10\nf: 1e3\n").unwrap();
        assert_eq!(
            value,
            json!({"a": true, "b": false, "c": null, "d": -2.5, "e": 16, "f": 1000})
        );
    }

    #[test]
    fn test_duplicate_key_keeps_position_and_takes_last_value() {
        let value = parse("a: 1\nb: 2\na: 3\n").unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(value["a"], json!(3));
    }

    #[test]
    fn test_top_level_array_and_empty_document() {
        assert_eq!(parse("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(parse("# only a comment\n").unwrap(), json!({}));
    }

    #[test]
    fn test_missing_colon_is_an_error() {
        let err = parse("name 'CSS'\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unknown_identifier_is_an_error() {
        let err = parse("a: maybe\n").unwrap_err();
        assert!(err.message.contains("maybe"), "{}", err.message);
        assert_eq!((err.line, err.column), (1, 4));
    }

    #[test]
    fn test_error_inside_first_pair_keeps_its_position() {
        let source = "patterns: [\n  {\n    match: 'x'\n    name: oops\n  }\n]\n";
        let err = parse(source).unwrap_err();
        assert_eq!((err.line, err.column), (4, 11), "{}", err.message);
        assert!(err.message.contains("oops"), "{}", err.message);
    }

    #[test]
    fn test_integers_beyond_i64_stay_exact() {
        let value = parse("big: 18446744073709551615\nsmall: -9223372036854775808\n").unwrap();
        assert_eq!(value["big"].as_u64(), Some(u64::MAX));
        assert_eq!(value["small"].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_unclosed_array_is_an_error() {
        assert!(parse("a: [1, 2\n").is_err());
    }
}
