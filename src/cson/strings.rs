//! String literal decoding
//!
//! CSON strings follow CoffeeScript rules: JavaScript escape sequences, quoted strings that
//! span lines fold each line break into a single space, and triple-quoted blocks lose their
//! common indentation.

/// Decodes a single- or double-quoted literal, quotes included.
pub(crate) fn quoted(literal: &str) -> Option<String> {
    let body = literal.get(1..literal.len().checked_sub(1)?)?;
    unescape(body, true)
}

/// Decodes the body of a triple-quoted block (delimiters excluded).
pub(crate) fn block(body: &str) -> Option<String> {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = normalized.split('\n').collect();
    if lines.len() > 1 && is_blank(lines[0]) {
        lines.remove(0);
    }
    if lines.len() > 1 && lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| line.len() - line.trim_start_matches(is_inline_space).len())
        .min()
        .unwrap_or(0);

    let dedented = lines
        .iter()
        .map(|line| if is_blank(line) { "" } else { &line[indent..] })
        .collect::<Vec<_>>()
        .join("\n");

    unescape(&dedented, false)
}

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_blank(line: &str) -> bool {
    line.chars().all(is_inline_space)
}

fn unescape(body: &str, fold_newlines: bool) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                '0' => out.push('\0'),
                'x' => {
                    let code = read_hex(&mut chars, 2)?;
                    out.push(char::from_u32(code)?);
                }
                'u' => out.push(read_unicode_escape(&mut chars)?),
                // line continuation
                '\r' | '\n' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    while chars.peek().copied().is_some_and(is_inline_space) {
                        chars.next();
                    }
                }
                other => out.push(other),
            },
            '\r' | '\n' if fold_newlines => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                while out.ends_with(is_inline_space) {
                    out.pop();
                }
                while chars.peek().copied().is_some_and(is_inline_space) {
                    chars.next();
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    Some(out)
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, digits: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

fn read_unicode_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<char> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut code = 0u32;
        let mut seen = 0;
        loop {
            match chars.next()? {
                '}' if seen > 0 => break,
                c => {
                    code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                    seen += 1;
                }
            }
        }
        return char::from_u32(code);
    }

    let code = read_hex(chars, 4)?;
    if (0xD800..0xDC00).contains(&code) {
        // high surrogate, must be followed by `\uDC00`..`\uDFFF`
        let mut lookahead = chars.clone();
        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
            if let Some(low) = read_hex(&mut lookahead, 4) {
                if (0xDC00..0xE000).contains(&low) {
                    *chars = lookahead;
                    return char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
                }
            }
        }
        return None;
    }
    char::from_u32(code)
}
