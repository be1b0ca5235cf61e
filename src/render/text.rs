//! Plain text renderer

use super::Resolver;
use crate::parser::inline::{parse_inline, to_plain, Span};
use crate::parser::{Block, Document};

/// Render a document as plain text
pub fn render_text(doc: &Document, resolver: &mut Resolver) -> String {
    let mut out = String::new();
    let mut previous: Option<&Block> = None;

    for (line, block) in doc.iter() {
        if let Some(prev) = previous {
            // Consecutive list items stay together
            let separator = match (prev, block) {
                (Block::ListItem { .. }, Block::ListItem { .. }) => "\n",
                _ => "\n\n",
            };
            out.push_str(separator);
        }

        match block {
            Block::Heading { level, text } => {
                let title = render_spans(&parse_inline(text), line, resolver);
                out.push_str(&title);
                let underline = match *level {
                    1 => Some('='),
                    2 => Some('-'),
                    _ => None,
                };
                if let Some(c) = underline {
                    out.push('\n');
                    out.extend(std::iter::repeat(c).take(title.chars().count()));
                }
            }
            Block::Paragraph { text } => {
                out.push_str(&render_spans(&parse_inline(text), line, resolver));
            }
            Block::CodeSample { text, .. } => {
                let indented: Vec<String> = text
                    .lines()
                    .map(|l| if l.is_empty() { String::new() } else { format!("    {}", l) })
                    .collect();
                out.push_str(&indented.join("\n"));
            }
            Block::ListItem { level, text } => {
                out.push_str(&"  ".repeat(usize::from(level.saturating_sub(1))));
                out.push_str("* ");
                out.push_str(&render_spans(&parse_inline(text), line, resolver));
            }
            Block::CrossReference { target } => {
                out.push_str(&render_link(None, target, line, resolver));
            }
        }

        previous = Some(block);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_spans(spans: &[Span], line: usize, resolver: &mut Resolver) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text { text } => out.push_str(text),
            Span::Code { text } => {
                out.push('`');
                out.push_str(text);
                out.push('`');
            }
            Span::Bold { content } | Span::Italic { content } => {
                out.push_str(&render_spans(content, line, resolver));
            }
            Span::Link { label, target } => {
                let label = label.as_deref().map(to_plain);
                out.push_str(&render_link(label, target, line, resolver));
            }
        }
    }
    out
}

fn render_link(label: Option<String>, target: &str, line: usize, resolver: &mut Resolver) -> String {
    let shown = label.unwrap_or_else(|| target.to_string());
    match resolver.resolve(target, line) {
        Some(location) if location != shown => format!("{} <{}>", shown, location),
        _ => shown,
    }
}
