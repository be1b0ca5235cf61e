//! Document parsing - turns POD text into an ordered list of blocks

use serde::Serialize;

use super::directive::{classify, is_directive_line, parse_directive, BlockKind, Directive};
use super::error::ParseError;
use super::inline::bare_reference;
use super::options::parse_options;

/// A structural unit of a parsed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    CodeSample {
        language: Option<String>,
        text: String,
    },
    ListItem {
        level: u8,
        text: String,
    },
    CrossReference {
        target: String,
    },
}

/// A parsed document. Blocks keep source order and cannot be changed after parsing.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,

    /// Source line (1-indexed) where each block starts
    lines: Vec<usize>,
}

impl Document {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterate blocks together with their starting line
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.lines.iter().copied().zip(self.blocks.iter())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Parse a POD document
pub fn parse_document(content: &str) -> Result<Document, ParseError> {
    let lines: Vec<&str> = content.lines().collect();
    let mut builder = Builder::default();

    // Open `=begin pod` containers: (name, line)
    let mut containers: Vec<(String, usize)> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let line_num = idx + 1;

        if line.trim().is_empty() {
            idx += 1;
            continue;
        }

        match parse_directive(line, line_num)? {
            Some(Directive::ShortHeading { level, text }) => {
                let (rest, next) = take_paragraph(&lines, idx + 1, true);
                builder.push(line_num, Block::Heading { level, text: join_text(text, &rest) });
                idx = next;
            }

            Some(Directive::Begin { name, rest }) => {
                let kind = classify(name, line_num)?;
                let options = parse_options(rest, line_num)?;

                if kind == BlockKind::Pod {
                    containers.push((name.to_string(), line_num));
                    idx += 1;
                    continue;
                }

                let end = find_block_end(&lines, idx + 1, name).ok_or_else(|| ParseError::Unterminated {
                    block: name.to_string(),
                    line: line_num,
                })?;

                let body = &lines[idx + 1..end];
                builder.push_kind(kind, line_num, "", body, options.language(), "")?;
                idx = end + 1;
            }

            Some(Directive::End { name }) => {
                match containers.last() {
                    Some((open, _)) if open == name => {
                        containers.pop();
                    }
                    _ => {
                        return Err(ParseError::malformed(
                            line_num,
                            format!("`=end {}` without a matching `=begin {}`", name, name),
                        ));
                    }
                }
                idx += 1;
            }

            Some(Directive::For { name, rest }) => {
                let kind = classify(name, line_num)?;
                let options = parse_options(rest, line_num)?;
                let stop_at_directive = kind != BlockKind::Code;
                let (body, next) = take_paragraph(&lines, idx + 1, stop_at_directive);
                builder.push_kind(kind, line_num, "", &body, options.language(), "")?;
                idx = next;
            }

            Some(Directive::Abbreviated { name, rest }) => {
                let kind = classify(name, line_num)?;
                let stop_at_directive = kind != BlockKind::Code;
                let (body, next) = take_paragraph(&lines, idx + 1, stop_at_directive);
                builder.push_kind(kind, line_num, rest, &body, None, line)?;
                idx = next;
            }

            None if line.starts_with(char::is_whitespace) => {
                // Implicit code block: indented lines up to the next blank line
                let (body, next) = take_paragraph(&lines, idx, false);
                builder.push(
                    line_num,
                    Block::CodeSample {
                        language: None,
                        text: dedent(&body),
                    },
                );
                idx = next;
            }

            None => {
                let (body, next) = take_paragraph(&lines, idx, true);
                let text = join_text("", &body);
                let block = match bare_reference(&text) {
                    Some(target) => Block::CrossReference { target },
                    None => Block::Paragraph { text },
                };
                builder.push(line_num, block);
                idx = next;
            }
        }
    }

    if let Some((name, line)) = containers.pop() {
        return Err(ParseError::Unterminated { block: name, line });
    }

    Ok(builder.finish())
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    lines: Vec<usize>,
}

impl Builder {
    fn push(&mut self, line: usize, block: Block) {
        self.blocks.push(block);
        self.lines.push(line);
    }

    /// Build the block for a named block kind.
    /// `first` is text on the directive line itself (abbreviated form only),
    /// `raw` is the directive line kept for unrecognized abbreviated blocks.
    fn push_kind(
        &mut self,
        kind: BlockKind,
        line: usize,
        first: &str,
        body: &[&str],
        language: Option<&str>,
        raw: &str,
    ) -> Result<(), ParseError> {
        match kind {
            BlockKind::Heading(level) => {
                let text = join_text(first, body);
                if text.is_empty() {
                    return Err(ParseError::malformed(line, "heading without text"));
                }
                self.push(line, Block::Heading { level, text });
            }
            BlockKind::Item(level) => {
                let text = join_text(first, body);
                if text.is_empty() {
                    return Err(ParseError::malformed(line, "list item without text"));
                }
                self.push(line, Block::ListItem { level, text });
            }
            BlockKind::Code => {
                let mut code_lines: Vec<&str> = Vec::with_capacity(body.len() + 1);
                if !first.is_empty() {
                    code_lines.push(first);
                }
                code_lines.extend_from_slice(body);
                self.push(
                    line,
                    Block::CodeSample {
                        language: language.map(str::to_string),
                        text: trim_blank_lines(&code_lines),
                    },
                );
            }
            BlockKind::Para | BlockKind::Pod => {
                let text = join_text(first, body);
                if !text.is_empty() {
                    self.push(line, Block::Paragraph { text });
                }
            }
            BlockKind::Comment | BlockKind::Ignored => {}
            BlockKind::Unknown => {
                // Unrecognized blocks pass through as plain text
                let text = join_text(raw.trim(), body);
                if !text.is_empty() {
                    self.push(line, Block::Paragraph { text });
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Document {
        Document {
            blocks: self.blocks,
            lines: self.lines,
        }
    }
}

/// Collect lines from `start` up to the next blank line (or directive line).
/// Returns the lines and the index to continue from.
fn take_paragraph<'a>(lines: &[&'a str], start: usize, stop_at_directive: bool) -> (Vec<&'a str>, usize) {
    let mut idx = start;
    let mut taken = Vec::new();

    while idx < lines.len() {
        let line = lines[idx];
        if line.trim().is_empty() {
            break;
        }
        if stop_at_directive && is_directive_line(line) {
            break;
        }
        taken.push(line);
        idx += 1;
    }

    (taken, idx)
}

/// Find the `=end name` that closes a block opened just before `start`
fn find_block_end(lines: &[&str], start: usize, name: &str) -> Option<usize> {
    let mut depth = 1;

    for (offset, line) in lines[start..].iter().enumerate() {
        match parse_directive(line, start + offset + 1) {
            Ok(Some(Directive::Begin { name: inner, .. })) if inner == name => depth += 1,
            Ok(Some(Directive::End { name: inner })) if inner == name => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Join a first line and continuation lines with single spaces
fn join_text(first: &str, rest: &[&str]) -> String {
    std::iter::once(first)
        .chain(rest.iter().copied())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop leading and trailing blank lines, keep the rest verbatim
fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Remove the common leading whitespace of a block of lines
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.chars().skip(indent).collect::<String>().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
