//! Renderer module - turns a parsed document into output text

mod html;
mod links;
mod pod;
mod text;

pub use links::LinkMap;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::Document;

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Plain text
    #[default]
    Text,
    /// HTML
    Html,
    /// POD source, suitable for re-parsing
    Pod,
    /// JSON dump of the document tree
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Text => "text",
            Format::Html => "html",
            Format::Pod => "pod",
            Format::Json => "json",
        };
        f.write_str(name)
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: Format,

    /// Wrap HTML output in a complete page
    pub standalone: bool,
}

/// A cross-reference that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWarning {
    pub target: String,
    pub line: usize,
}

/// Rendered output plus the warnings collected while rendering
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub output: String,
    pub warnings: Vec<ReferenceWarning>,
}

/// Render a document. Never fails: unresolved references become warnings.
pub fn render(doc: &Document, options: &RenderOptions, links: &LinkMap) -> RenderOutput {
    let mut resolver = Resolver::new(links);

    let output = match options.format {
        Format::Text => text::render_text(doc, &mut resolver),
        Format::Html => html::render_html(doc, &mut resolver, options.standalone),
        Format::Pod => pod::render_pod(doc),
        Format::Json => render_json(doc),
    };

    tracing::debug!(
        output_format = %options.format,
        blocks = doc.len(),
        warnings = resolver.warnings.len(),
        "rendered document"
    );

    RenderOutput {
        output,
        warnings: resolver.warnings,
    }
}

#[derive(Serialize)]
struct JsonBlock<'a> {
    line: usize,
    #[serde(flatten)]
    block: &'a crate::parser::Block,
}

fn render_json(doc: &Document) -> String {
    let blocks: Vec<JsonBlock> = doc.iter().map(|(line, block)| JsonBlock { line, block }).collect();
    let mut json = serde_json::to_string_pretty(&blocks).unwrap_or_default();
    json.push('\n');
    json
}

/// Resolves references during a render and records the misses
pub(crate) struct Resolver<'a> {
    links: &'a LinkMap,
    warnings: Vec<ReferenceWarning>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(links: &'a LinkMap) -> Self {
        Resolver {
            links,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn resolve(&mut self, target: &str, line: usize) -> Option<String> {
        let location = self.links.resolve(target);
        if location.is_none() {
            tracing::debug!(target_name = target, line, "unresolved reference");
            self.warnings.push(ReferenceWarning {
                target: target.to_string(),
                line,
            });
        }
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, Block};

    fn render_with(content: &str, format: Format) -> RenderOutput {
        let doc = parse_document(content).unwrap();
        let options = RenderOptions { format, standalone: false };
        render(&doc, &options, &LinkMap::new())
    }

    #[test]
    fn test_empty_document_renders_empty() {
        for format in [Format::Text, Format::Html, Format::Pod] {
            let out = render_with("", format);
            assert_eq!(out.output, "", "format {}", format);
            assert!(out.warnings.is_empty());
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let content = "=head1 Methods\n\nSee L<Routine> and B<bold>.\n\n=item one\n=item2 two\n";
        for format in [Format::Text, Format::Html, Format::Pod, Format::Json] {
            let first = render_with(content, format);
            let second = render_with(content, format);
            assert_eq!(first.output, second.output);
            assert_eq!(first.warnings, second.warnings);
        }
    }

    #[test]
    fn test_unresolved_reference_warns() {
        let out = render_with("Intro.\n\nL<IO::Handle>\n", Format::Text);

        assert!(out.output.contains("IO::Handle"));
        assert_eq!(
            out.warnings,
            vec![ReferenceWarning { target: "IO::Handle".to_string(), line: 3 }]
        );
    }

    #[test]
    fn test_pod_round_trip() {
        let content = r#"=begin pod

=TITLE class IO::Handle

= Short heading

Paragraph with C<code> and
L<a link|/type/Str>.

=para =head1 looks like a directive

=para L<Mu>

    indented code
      keeps relative indent

=begin code :lang<raku>
my $fh = open 'x';

$fh.close;
=end code

=item first
=item3 deep

L<Routine>

=end pod
"#;
        let doc = parse_document(content).unwrap();
        let pod = render(&doc, &RenderOptions { format: Format::Pod, standalone: false }, &LinkMap::new());
        let reparsed = parse_document(&pod.output).unwrap();

        assert_eq!(doc.blocks(), reparsed.blocks());
        assert!(matches!(doc.blocks().last(), Some(Block::CrossReference { .. })));
    }

    #[test]
    fn test_pod_round_trip_special_text() {
        let cases = [
            // paragraphs that need `=para`
            "=para =begin code\n\n=para L<Routine>\n",
            // code bodies with directive lines
            "Example:\n\n    say 1;\n    =begin code\n    =end code\n",
            "=for code\n=end code\n\n=code =head1 inline\n",
            "=begin code :lang<raku>\n=begin code\n\n=end code\n=end code\n",
            // languages that cannot use `:lang<...>`
            "=for code :lang('Array<Int')\nmy Int @a;\n",
            "=for code :lang(' padded ')\nx\n",
            // reference targets with angle brackets
            "L<< a>b >>\n\nL<<< x>>y >>>\n\nL<Array<Int>>\n",
        ];

        for content in cases {
            let doc = parse_document(content).unwrap();
            let pod = render_with(content, Format::Pod);
            let reparsed = parse_document(&pod.output)
                .unwrap_or_else(|e| panic!("{:?} re-parsing:\n{}", e, pod.output));
            assert_eq!(doc.blocks(), reparsed.blocks(), "source:\n{}", content);
        }
    }

    #[test]
    fn test_json_includes_lines() {
        let out = render_with("= Title\n", Format::Json);
        let value: serde_json::Value = serde_json::from_str(&out.output).unwrap();

        assert_eq!(value[0]["kind"], "heading");
        assert_eq!(value[0]["level"], 1);
        assert_eq!(value[0]["text"], "Title");
        assert_eq!(value[0]["line"], 1);
    }
}
