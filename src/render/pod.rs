//! POD renderer - writes a document back in its source dialect

use crate::parser::inline::bare_reference;
use crate::parser::{Block, Document};

/// Render a document as POD that parses back to the same blocks
pub fn render_pod(doc: &Document) -> String {
    if doc.is_empty() {
        return String::new();
    }

    let mut parts = Vec::with_capacity(doc.len());

    for block in doc.blocks() {
        let part = match block {
            Block::Heading { level, text } => format!("=head{} {}", level, text),
            Block::Paragraph { text } => {
                // Text that would read as a directive or a bare reference needs an explicit block
                if text.starts_with('=') || bare_reference(text).is_some() {
                    format!("=para {}", text)
                } else {
                    text.clone()
                }
            }
            Block::CodeSample { language, text } => code_block(language.as_deref(), text),
            Block::ListItem { level: 1, text } => format!("=item {}", text),
            Block::ListItem { level, text } => format!("=item{} {}", level, text),
            Block::CrossReference { target } => reference(target),
        };
        parts.push(part);
    }

    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// Code without blank lines goes in a `=for code` paragraph, whose body
/// ignores directive lines. Code with blank lines only comes from a
/// delimited block, so its body already balances `=begin code`/`=end code`.
fn code_block(language: Option<&str>, text: &str) -> String {
    let options = language.map(lang_option).unwrap_or_default();

    if text.is_empty() {
        return format!("=for code{}", options);
    }
    if !text.lines().any(|l| l.trim().is_empty()) {
        return format!("=for code{}\n{}", options, text);
    }

    format!("=begin code{}\n{}\n=end code", options, text)
}

fn lang_option(lang: &str) -> String {
    if lang.contains(['<', '>']) || lang.trim() != lang {
        let quote = if lang.contains('\'') { '"' } else { '\'' };
        format!(" :lang({}{}{})", quote, lang, quote)
    } else {
        format!(" :lang<{}>", lang)
    }
}

/// `L<target>`, or `L<< target >>` with enough angles to outlast any `>` run in the target
fn reference(target: &str) -> String {
    if !target.contains(['<', '>']) {
        return format!("L<{}>", target);
    }

    let longest_run = target
        .split(|c: char| c != '>')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let angles = (longest_run + 1).max(2);

    format!("L{} {} {}", "<".repeat(angles), target, ">".repeat(angles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn assert_round_trip(content: &str) {
        let doc = parse_document(content).unwrap();
        let pod = render_pod(&doc);
        let reparsed = parse_document(&pod).unwrap_or_else(|e| panic!("{:?} re-parsing:\n{}", e, pod));
        assert_eq!(doc.blocks(), reparsed.blocks(), "re-parsed:\n{}", pod);
    }

    #[test]
    fn test_render_pod_blocks() {
        let doc = parse_document("= Title\n\n=for code :lang<raku>\nsay 1;\n\n=item2 nested\n").unwrap();

        assert_eq!(
            render_pod(&doc),
            "=head1 Title\n\n=for code :lang<raku>\nsay 1;\n\n=item2 nested\n"
        );
    }

    #[test]
    fn test_code_with_blank_lines_is_delimited() {
        let doc = parse_document("=begin code\nmy $x;\n\nsay $x;\n=end code\n").unwrap();

        assert_eq!(render_pod(&doc), "=begin code\nmy $x;\n\nsay $x;\n=end code\n");
    }

    #[test]
    fn test_code_with_directive_lines_round_trips() {
        assert_round_trip("Example:\n\n    say 1;\n    =begin code\n");
        assert_round_trip("=for code\n=begin code\n");
        assert_round_trip("=for code :lang<raku>\nsay 1;\n=end code\n");
        assert_round_trip("=begin code\n=begin code\n\ninner\n=end code\n=end code\n");
        assert_round_trip("=for code\n\nAfter an empty sample.\n");
    }

    #[test]
    fn test_language_with_angles_is_quoted() {
        let doc = parse_document("=begin code :lang('Array<Int')\nx\n=end code\n").unwrap();

        assert_eq!(render_pod(&doc), "=for code :lang('Array<Int')\nx\n");
        assert_round_trip("=begin code :lang(' raku ')\nx\n=end code\n");
        assert_round_trip("=begin code :lang(\"it's<x>\")\nx\n=end code\n");
    }

    #[test]
    fn test_reference_with_angles() {
        let doc = parse_document("L<< a>b >>\n").unwrap();

        assert_eq!(render_pod(&doc), "L<< a>b >>\n");
        assert_round_trip("L<< a>b >>\n");
        assert_round_trip("L<<< a>>b> >>>\n");
        assert_round_trip("L<< <start >>\n");
    }

    #[test]
    fn test_paragraph_escapes_round_trip() {
        assert_round_trip("=para =head1 not a heading\n");
        assert_round_trip("=para L<Mu>\n");
        assert_round_trip("=para = not a heading either\n");
    }
}
