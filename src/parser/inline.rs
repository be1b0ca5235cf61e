//! Inline formatting codes (`B<...>`, `C<...>`, `L<...>`, ...)
//!
//! Only the letters in `CODE_LETTERS` open a code; any other `A<...>`
//! stays literal text.

/// Letters recognized as formatting codes
const CODE_LETTERS: &[u8] = b"BCEIKLNTUXZ";

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text { text: String },
    Bold { content: Vec<Span> },
    Italic { content: Vec<Span> },
    Code { text: String },
    Link { label: Option<Vec<Span>>, target: String },
}

impl Span {
    fn text(s: impl Into<String>) -> Self {
        Span::Text { text: s.into() }
    }
}

/// Parse text with formatting codes into spans.
///
/// Unterminated codes are kept as literal text.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < text.len() {
        if let Some(code) = formatting_code_at(text, pos) {
            if !literal.is_empty() {
                push_span(&mut spans, Span::text(std::mem::take(&mut literal)));
            }
            for span in expand_code(code.letter, code.content) {
                push_span(&mut spans, span);
            }
            pos = code.end;
            continue;
        }

        // pos is always on a char boundary
        let c = match text[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        literal.push(c);
        pos += c.len_utf8();
    }

    if !literal.is_empty() {
        push_span(&mut spans, Span::text(literal));
    }

    spans
}

/// Flatten spans into plain text, dropping formatting
pub fn to_plain(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text { text } | Span::Code { text } => out.push_str(text),
            Span::Bold { content } | Span::Italic { content } => out.push_str(&to_plain(content)),
            Span::Link { label: Some(label), .. } => out.push_str(&to_plain(label)),
            Span::Link { label: None, target } => out.push_str(target),
        }
    }
    out
}

/// Plain text of markup, shorthand for `to_plain(&parse_inline(text))`
pub fn plain_text(text: &str) -> String {
    to_plain(&parse_inline(text))
}

/// If the whole text is a single unlabelled `L<target>`, return the target
pub fn bare_reference(text: &str) -> Option<String> {
    match parse_inline(text.trim()).as_slice() {
        [Span::Link { label: None, target }] if !target.is_empty() && text.trim().starts_with('L') => {
            Some(target.clone())
        }
        _ => None,
    }
}

struct FormattingCode<'a> {
    letter: char,
    content: &'a str,
    end: usize,
}

/// Recognize a formatting code starting at byte offset `pos`
fn formatting_code_at(text: &str, pos: usize) -> Option<FormattingCode<'_>> {
    let bytes = text.as_bytes();
    let letter = bytes[pos];
    if !CODE_LETTERS.contains(&letter) {
        return None;
    }

    // A code letter glued to a word (`SomeT<Int>`) is plain text
    if let Some(prev) = text[..pos].chars().next_back() {
        if prev.is_alphanumeric() {
            return None;
        }
    }

    let after = &text[pos + 1..];
    if let Some(inner) = after.strip_prefix('«') {
        let close = find_guillemet_close(inner)?;
        let content_start = pos + 1 + '«'.len_utf8();
        return Some(FormattingCode {
            letter: letter as char,
            content: &text[content_start..content_start + close],
            end: content_start + close + '»'.len_utf8(),
        });
    }

    let opening = after.bytes().take_while(|&b| b == b'<').count();
    if opening == 0 {
        return None;
    }

    let content_start = pos + 1 + opening;
    let inner = &text[content_start..];

    if opening == 1 {
        let close = find_angle_close(inner)?;
        return Some(FormattingCode {
            letter: letter as char,
            content: &inner[..close],
            end: content_start + close + 1,
        });
    }

    // Multi-angle delimiters: content runs to the first matching run of `>`
    let closer = ">".repeat(opening);
    let close = inner.find(&closer)?;
    Some(FormattingCode {
        letter: letter as char,
        content: inner[..close].trim(),
        end: content_start + close + opening,
    })
}

fn find_angle_close(inner: &str) -> Option<usize> {
    let mut depth = 1;
    for (idx, b) in inner.bytes().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_guillemet_close(inner: &str) -> Option<usize> {
    let mut depth = 1;
    for (idx, c) in inner.char_indices() {
        match c {
            '«' => depth += 1,
            '»' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn expand_code(letter: char, content: &str) -> Vec<Span> {
    match letter {
        'B' => vec![Span::Bold { content: parse_inline(content) }],
        'I' => vec![Span::Italic { content: parse_inline(content) }],
        'C' => vec![Span::Code { text: content.to_string() }],
        'L' => {
            let (label, target) = match content.split_once('|') {
                Some((label, target)) => (Some(parse_inline(label.trim())), target.trim()),
                None => (None, content.trim()),
            };
            vec![Span::Link { label, target: target.to_string() }]
        }
        'E' => vec![Span::text(decode_entities(content))],
        'X' => {
            let shown = content.split_once('|').map_or(content, |(text, _)| text);
            parse_inline(shown)
        }
        'Z' => vec![],
        // U, K, T and N show their content
        _ => parse_inline(content),
    }
}

/// Decode `E<>` contents: names, decimal and hex code points separated by `;`
fn decode_entities(content: &str) -> String {
    content
        .split(';')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|entity| match decode_entity(entity) {
            Some(c) => c.to_string(),
            None => format!("E<{}>", entity),
        })
        .collect()
}

fn decode_entity(entity: &str) -> Option<char> {
    let named = match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    let code = if let Some(hex) = entity.strip_prefix("0x").or_else(|| entity.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

/// Push a span, merging adjacent text
fn push_span(spans: &mut Vec<Span>, span: Span) {
    if let Span::Text { text } = &span {
        if let Some(Span::Text { text: last }) = spans.last_mut() {
            last.push_str(text);
            return;
        }
    }
    spans.push(span);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Span {
        Span::text(s)
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_inline("Just words."), vec![text("Just words.")]);
    }

    #[test]
    fn test_bold_and_code() {
        let spans = parse_inline("Returns B<True> for C<$fh.eof>.");
        assert_eq!(
            spans,
            vec![
                text("Returns "),
                Span::Bold { content: vec![text("True")] },
                text(" for "),
                Span::Code { text: "$fh.eof".to_string() },
                text("."),
            ]
        );
    }

    #[test]
    fn test_link_with_label() {
        let spans = parse_inline("See L<the handle|/type/IO::Handle>.");
        assert_eq!(
            spans[1],
            Span::Link {
                label: Some(vec![text("the handle")]),
                target: "/type/IO::Handle".to_string(),
            }
        );
    }

    #[test]
    fn test_double_angle_code() {
        let spans = parse_inline("C<< $a < $b >> holds");
        assert_eq!(spans[0], Span::Code { text: "$a < $b".to_string() });
        assert_eq!(spans[1], text(" holds"));
    }

    #[test]
    fn test_nested_angles_in_code() {
        let spans = parse_inline("C<Array<Int>>");
        assert_eq!(spans, vec![Span::Code { text: "Array<Int>".to_string() }]);
    }

    #[test]
    fn test_guillemet_delimiters() {
        let spans = parse_inline("I«slurpy»");
        assert_eq!(spans, vec![Span::Italic { content: vec![text("slurpy")] }]);
    }

    #[test]
    fn test_entities_and_zero_width() {
        assert_eq!(plain_text("E<lt>fh E<0x41>E<66>Z<>"), "<fh AB");
        assert_eq!(plain_text("E<bogus>"), "E<bogus>");
    }

    #[test]
    fn test_index_entry_shows_text() {
        assert_eq!(plain_text("X<open|IO,open> a file"), "open a file");
    }

    #[test]
    fn test_unterminated_code_is_literal() {
        assert_eq!(parse_inline("B<oops"), vec![text("B<oops")]);
    }

    #[test]
    fn test_glued_letter_is_not_code() {
        assert_eq!(parse_inline("SomeT<Int>"), vec![text("SomeT<Int>")]);
    }

    #[test]
    fn test_unknown_letter_is_literal() {
        assert_eq!(parse_inline("(A<b>)"), vec![text("(A<b>)")]);
        assert_eq!(
            parse_inline("Q<B<x>>"),
            vec![text("Q<"), Span::Bold { content: vec![text("x")] }, text(">")]
        );
    }

    #[test]
    fn test_content_codes_show_text() {
        assert_eq!(plain_text("U<under> K<ls> T<out> N<note>"), "under ls out note");
    }

    #[test]
    fn test_bare_reference() {
        assert_eq!(bare_reference("L<Routine>"), Some("Routine".to_string()));
        assert_eq!(bare_reference("L<x|Routine>"), None);
        assert_eq!(bare_reference("See L<Routine>"), None);
    }
}
