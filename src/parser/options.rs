//! Block option parser - parses `:key<value> :flag :!flag` syntax

use std::collections::HashMap;

use super::error::ParseError;

/// A parsed block option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Bool(bool),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            OptionValue::Bool(_) => None,
        }
    }
}

/// Options attached to a `=begin` or `=for` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOptions {
    values: HashMap<String, OptionValue>,
}

impl BlockOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// The code language hint (`:lang` or `:language`)
    pub fn language(&self) -> Option<&str> {
        self.get("lang")
            .or_else(|| self.get("language"))
            .and_then(OptionValue::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Parse block options from the text after a block name
pub fn parse_options(input: &str, line: usize) -> Result<BlockOptions, ParseError> {
    let mut values = HashMap::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos].is_whitespace() {
            pos += 1;
            continue;
        }

        if chars[pos] != ':' {
            return Err(ParseError::malformed(
                line,
                format!("expected `:` to start a block option, found `{}`", chars[pos]),
            ));
        }
        pos += 1;

        let negated = chars.get(pos) == Some(&'!');
        if negated {
            pos += 1;
        }

        let key_start = pos;
        while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '-' || chars[pos] == '_') {
            pos += 1;
        }
        let key: String = chars[key_start..pos].iter().collect();
        if key.is_empty() {
            return Err(ParseError::malformed(line, "block option without a name"));
        }

        let value = match chars.get(pos) {
            Some('<') if !negated => {
                let (raw, next) = take_delimited(&chars, pos, '<', '>')
                    .ok_or_else(|| ParseError::malformed(line, format!("unterminated value for option `:{}`", key)))?;
                pos = next;
                OptionValue::String(raw.trim().to_string())
            }
            Some('(') if !negated => {
                let (raw, next) = take_delimited(&chars, pos, '(', ')')
                    .ok_or_else(|| ParseError::malformed(line, format!("unterminated value for option `:{}`", key)))?;
                pos = next;
                parse_value(&raw)
            }
            _ => OptionValue::Bool(!negated),
        };

        values.insert(key, value);
    }

    Ok(BlockOptions { values })
}

/// Take a bracketed value starting at `start` (which holds `open`).
/// Returns the inner text and the position after the closing bracket.
fn take_delimited(chars: &[char], start: usize, open: char, close: char) -> Option<(String, usize)> {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut inner = String::new();

    for (offset, &c) in chars[start..].iter().enumerate() {
        match c {
            '\'' | '"' if open == '(' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
                inner.push(c);
            }
            c if c == open && quote.is_none() => {
                if depth > 0 {
                    inner.push(c);
                }
                depth += 1;
            }
            c if c == close && quote.is_none() => {
                depth -= 1;
                if depth == 0 {
                    return Some((inner, start + offset + 1));
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
    }

    None
}

/// Parse a parenthesized option value
fn parse_value(raw: &str) -> OptionValue {
    let s = raw.trim();

    // Quoted string
    if s.len() >= 2 {
        let first = s.chars().next();
        if (first == Some('"') || first == Some('\'')) && s.ends_with(first.unwrap_or('"')) {
            return OptionValue::String(s[1..s.len() - 1].to_string());
        }
    }

    match s {
        "True" | "true" => OptionValue::Bool(true),
        "False" | "false" => OptionValue::Bool(false),
        _ => OptionValue::String(s.to_string()),
    }
}
