//! HTML renderer - builds a pulldown-cmark event stream and serializes it

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd};
use std::collections::HashMap;

use super::Resolver;
use crate::parser::inline::{parse_inline, plain_text, Span};
use crate::parser::{Block, Document};

/// Render a document as HTML
pub fn render_html(doc: &Document, resolver: &mut Resolver, standalone: bool) -> String {
    let mut events: Vec<Event<'static>> = Vec::new();
    let mut lists = ListStack::default();
    let mut anchors = Anchors::default();

    for (line, block) in doc.iter() {
        if let Block::ListItem { level, text } = block {
            lists.open_item(*level, &mut events);
            push_spans(&parse_inline(text), line, resolver, &mut events);
            continue;
        }
        lists.close_all(&mut events);

        match block {
            Block::Heading { level, text } => {
                let level = u8_to_heading_level(*level);
                let id = anchors.next(&plain_text(text), line);
                events.push(Event::Start(Tag::Heading {
                    level,
                    id: Some(CowStr::from(id)),
                    classes: Vec::new(),
                    attrs: Vec::new(),
                }));
                push_spans(&parse_inline(text), line, resolver, &mut events);
                events.push(Event::End(TagEnd::Heading(level)));
            }
            Block::Paragraph { text } => {
                events.push(Event::Start(Tag::Paragraph));
                push_spans(&parse_inline(text), line, resolver, &mut events);
                events.push(Event::End(TagEnd::Paragraph));
            }
            Block::CodeSample { language, text } => {
                let lang = language.clone().unwrap_or_default();
                events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::from(lang)))));
                let mut body = text.clone();
                if !body.is_empty() {
                    body.push('\n');
                }
                events.push(Event::Text(CowStr::from(body)));
                events.push(Event::End(TagEnd::CodeBlock));
            }
            Block::CrossReference { target } => {
                events.push(Event::Start(Tag::Paragraph));
                push_link(None, target, line, resolver, &mut events);
                events.push(Event::End(TagEnd::Paragraph));
            }
            Block::ListItem { .. } => {}
        }
    }
    lists.close_all(&mut events);

    let mut body = String::new();
    html::push_html(&mut body, events.into_iter());

    if !standalone {
        return body;
    }

    let title = doc
        .blocks()
        .iter()
        .find_map(|block| match block {
            Block::Heading { text, .. } => Some(plain_text(text)),
            _ => None,
        })
        .unwrap_or_default();

    let mut escaped_title = String::new();
    html::push_html(&mut escaped_title, std::iter::once(Event::Text(CowStr::from(title))));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escaped_title, body
    )
}

fn push_spans(spans: &[Span], line: usize, resolver: &mut Resolver, events: &mut Vec<Event<'static>>) {
    for span in spans {
        match span {
            Span::Text { text } => events.push(Event::Text(CowStr::from(text.clone()))),
            Span::Code { text } => events.push(Event::Code(CowStr::from(text.clone()))),
            Span::Bold { content } => {
                events.push(Event::Start(Tag::Strong));
                push_spans(content, line, resolver, events);
                events.push(Event::End(TagEnd::Strong));
            }
            Span::Italic { content } => {
                events.push(Event::Start(Tag::Emphasis));
                push_spans(content, line, resolver, events);
                events.push(Event::End(TagEnd::Emphasis));
            }
            Span::Link { label, target } => {
                push_link(label.as_deref(), target, line, resolver, events);
            }
        }
    }
}

fn push_link(
    label: Option<&[Span]>,
    target: &str,
    line: usize,
    resolver: &mut Resolver,
    events: &mut Vec<Event<'static>>,
) {
    let location = resolver.resolve(target, line);

    if let Some(location) = &location {
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url: CowStr::from(location.clone()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
    }

    match label {
        // Anchors cannot nest, so links inside a linked label become text
        Some(label) if location.is_some() => push_spans(&without_links(label), line, resolver, events),
        Some(label) => push_spans(label, line, resolver, events),
        None => events.push(Event::Text(CowStr::from(target.to_string()))),
    }

    if location.is_some() {
        events.push(Event::End(TagEnd::Link));
    }
}

fn without_links(spans: &[Span]) -> Vec<Span> {
    spans
        .iter()
        .flat_map(|span| match span {
            Span::Link { label: Some(label), .. } => without_links(label),
            Span::Link { label: None, target } => vec![Span::Text { text: target.clone() }],
            Span::Bold { content } => vec![Span::Bold { content: without_links(content) }],
            Span::Italic { content } => vec![Span::Italic { content: without_links(content) }],
            other => vec![other.clone()],
        })
        .collect()
}

/// Open `<ul>` lists; each entry records whether an item is open in it
#[derive(Default)]
struct ListStack {
    open_items: Vec<bool>,
}

impl ListStack {
    fn open_item(&mut self, level: u8, events: &mut Vec<Event<'static>>) {
        let level = usize::from(level.max(1));

        while self.open_items.len() > level {
            self.close_list(events);
        }
        if self.open_items.len() == level {
            self.close_item(events);
        }
        while self.open_items.len() < level {
            events.push(Event::Start(Tag::List(None)));
            self.open_items.push(false);
        }

        events.push(Event::Start(Tag::Item));
        if let Some(open) = self.open_items.last_mut() {
            *open = true;
        }
    }

    fn close_item(&mut self, events: &mut Vec<Event<'static>>) {
        if let Some(open) = self.open_items.last_mut() {
            if *open {
                events.push(Event::End(TagEnd::Item));
                *open = false;
            }
        }
    }

    fn close_list(&mut self, events: &mut Vec<Event<'static>>) {
        self.close_item(events);
        events.push(Event::End(TagEnd::List(false)));
        self.open_items.pop();
    }

    fn close_all(&mut self, events: &mut Vec<Event<'static>>) {
        while !self.open_items.is_empty() {
            self.close_list(events);
        }
    }
}

/// Unique heading anchors
#[derive(Default)]
struct Anchors {
    used: HashMap<String, usize>,
}

impl Anchors {
    fn next(&mut self, text: &str, line: usize) -> String {
        let base_slug = slug::slugify(text);
        let slug = if base_slug.is_empty() {
            format!("section-{}", line)
        } else {
            base_slug
        };

        let count = self.used.entry(slug.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            slug
        } else {
            format!("{}-{}", slug, count)
        }
    }
}

fn u8_to_heading_level(level: u8) -> HeadingLevel {
    match level {
        1 => HeadingLevel::H1,
        2 => HeadingLevel::H2,
        3 => HeadingLevel::H3,
        4 => HeadingLevel::H4,
        5 => HeadingLevel::H5,
        _ => HeadingLevel::H6,
    }
}
