//! Cross-reference extraction (`L<...>` codes and reference blocks)

use super::document::{Block, Document};
use super::inline::{parse_inline, to_plain, Span};

/// A cross-reference found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The raw target (as written)
    pub target: String,

    /// Display text (if different from target)
    pub display_text: Option<String>,

    /// Line of the block containing the reference
    pub line: usize,
}

/// Extract all references from a document, in source order
pub fn extract_refs(doc: &Document) -> Vec<Reference> {
    let mut refs = Vec::new();

    for (line, block) in doc.iter() {
        match block {
            Block::CrossReference { target } => refs.push(Reference {
                target: target.clone(),
                display_text: None,
                line,
            }),
            Block::Heading { text, .. } | Block::Paragraph { text } | Block::ListItem { text, .. } => {
                collect_links(&parse_inline(text), line, &mut refs);
            }
            Block::CodeSample { .. } => {}
        }
    }

    refs
}

fn collect_links(spans: &[Span], line: usize, refs: &mut Vec<Reference>) {
    for span in spans {
        match span {
            Span::Link { label, target } => refs.push(Reference {
                target: target.clone(),
                display_text: label.as_deref().map(to_plain),
                line,
            }),
            Span::Bold { content } | Span::Italic { content } => collect_links(content, line, refs),
            Span::Text { .. } | Span::Code { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn test_extract_refs() {
        let content = "=head1 See L<Routine>\n\nCheck out B<L<IO::Path>> and L<another|/type/Str>.\n\nL<Mu>\n\n    L<not a ref in code>\n";
        let doc = parse_document(content).unwrap();
        let refs = extract_refs(&doc);

        assert_eq!(refs.len(), 4);
        assert_eq!(refs[0].target, "Routine");
        assert_eq!(refs[0].line, 1);
        assert_eq!(refs[1].target, "IO::Path");
        assert_eq!(refs[2].target, "/type/Str");
        assert_eq!(refs[2].display_text, Some("another".to_string()));
        assert_eq!(refs[3].target, "Mu");
        assert_eq!(refs[3].line, 5);
    }

    #[test]
    fn test_no_refs() {
        let doc = parse_document("Just a regular line of text\n").unwrap();
        assert!(extract_refs(&doc).is_empty());
    }
}
