//! Directive line recognition (`=head1`, `=begin code`, `= Title`, ...)

use lazy_static::lazy_static;
use regex::Regex;

use super::error::ParseError;

lazy_static! {
    // Matches =name or =name rest, optionally indented
    static ref DIRECTIVE_RE: Regex = Regex::new(r"^\s*=([A-Za-z][\w-]*)(?:\s+(.*?))?\s*$").unwrap();

    // Matches the short heading form: a run of = followed by whitespace and text
    static ref SHORT_HEADING_RE: Regex = Regex::new(r"^\s*(=+)\s+(\S.*?)\s*$").unwrap();
}

/// Deepest heading level
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Deepest list item level
pub const MAX_ITEM_LEVEL: u8 = 4;

/// A recognized directive line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `=begin name options`
    Begin { name: &'a str, rest: &'a str },
    /// `=end name`
    End { name: &'a str },
    /// `=for name options`
    For { name: &'a str, rest: &'a str },
    /// `=name text`
    Abbreviated { name: &'a str, rest: &'a str },
    /// `== text`
    ShortHeading { level: u8, text: &'a str },
}

/// What a block name stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Item(u8),
    Code,
    Para,
    Pod,
    Comment,
    /// `=config`, `=alias` and friends carry no content
    Ignored,
    Unknown,
}

/// True if the line starts a new block
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_RE.is_match(line) || SHORT_HEADING_RE.is_match(line)
}

/// Parse a directive from a line, if it is one
pub fn parse_directive(line: &str, line_number: usize) -> Result<Option<Directive<'_>>, ParseError> {
    if let Some(caps) = DIRECTIVE_RE.captures(line) {
        let keyword = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());

        let directive = match keyword {
            "begin" | "for" | "end" => {
                let (name, rest) = split_name(rest);
                if name.is_empty() {
                    return Err(ParseError::malformed(
                        line_number,
                        format!("`={}` without a block name", keyword),
                    ));
                }
                match keyword {
                    "begin" => Directive::Begin { name, rest },
                    "for" => Directive::For { name, rest },
                    _ => Directive::End { name },
                }
            }
            name => Directive::Abbreviated { name, rest },
        };

        return Ok(Some(directive));
    }

    if let Some(caps) = SHORT_HEADING_RE.captures(line) {
        let marks = caps.get(1).map_or(0, |m| m.as_str().len());
        let text = caps.get(2).map_or("", |m| m.as_str());
        if marks > MAX_HEADING_LEVEL as usize {
            return Err(ParseError::malformed(
                line_number,
                format!("heading level {} is deeper than {}", marks, MAX_HEADING_LEVEL),
            ));
        }
        return Ok(Some(Directive::ShortHeading {
            level: marks as u8,
            text,
        }));
    }

    Ok(None)
}

/// Classify a block name
pub fn classify(name: &str, line_number: usize) -> Result<BlockKind, ParseError> {
    let kind = match name {
        "TITLE" => BlockKind::Heading(1),
        "SUBTITLE" => BlockKind::Heading(2),
        "code" => BlockKind::Code,
        "para" => BlockKind::Para,
        "pod" => BlockKind::Pod,
        "comment" => BlockKind::Comment,
        "config" | "alias" | "use" | "encoding" => BlockKind::Ignored,
        _ => {
            if let Some(level) = numbered(name, "head", MAX_HEADING_LEVEL, line_number)? {
                BlockKind::Heading(level)
            } else if let Some(level) = numbered(name, "item", MAX_ITEM_LEVEL, line_number)? {
                BlockKind::Item(level)
            } else {
                BlockKind::Unknown
            }
        }
    };

    Ok(kind)
}

/// Parse `head`, `head2`, `item3`, ... into a level
fn numbered(name: &str, prefix: &str, max: u8, line_number: usize) -> Result<Option<u8>, ParseError> {
    let digits = match name.strip_prefix(prefix) {
        Some(d) => d,
        None => return Ok(None),
    };

    if digits.is_empty() {
        return Ok(Some(1));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }

    match digits.parse::<u8>() {
        Ok(level) if (1..=max).contains(&level) => Ok(Some(level)),
        _ => Err(ParseError::malformed(
            line_number,
            format!("`={}` level must be between 1 and {}", name, max),
        )),
    }
}

fn split_name(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim_start()),
        None => (rest, ""),
    }
}
