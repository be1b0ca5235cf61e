//! CLI command implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::parser::inline::plain_text;
use crate::parser::{extract_refs, parse_document, Block, Document};
use crate::render::{render as render_document, LinkMap, RenderOptions};

/// File extensions treated as POD sources
const POD_EXTENSIONS: &[&str] = &["pod", "pod6", "rakudoc"];

/// Everything `render` needs besides the paths
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    pub options: RenderOptions,
    pub links: LinkMap,

    /// Unresolved references fail the run
    pub strict: bool,
}

/// Render one file. Returns the process exit code.
pub fn render(input: &Path, output: &Path, settings: &RenderSettings) -> Result<i32> {
    let content = read_source(input)?;

    let doc = match parse_source(&content, input) {
        Some(doc) => doc,
        None => return Ok(1),
    };

    let rendered = render_document(&doc, &settings.options, &settings.links);

    if output == Path::new("-") {
        print!("{}", rendered.output);
    } else {
        std::fs::write(output, &rendered.output)
            .with_context(|| format!("Failed to write output: {}", output.display()))?;
        println!("✓ Rendered {} ({})", output.display(), settings.options.format);
    }

    // Warnings are reported once the output is complete
    for warning in &rendered.warnings {
        eprintln!(
            "WARN:  {}:{} - unresolved reference '{}'",
            input.display(),
            warning.line,
            warning.target
        );
    }

    if settings.strict && !rendered.warnings.is_empty() {
        return Ok(1);
    }

    Ok(0)
}

/// Validate one file or every POD file under a directory
pub fn check(path: &Path, links: &LinkMap, strict: bool) -> Result<i32> {
    println!("Checking: {}", path.display());

    let files = collect_sources(path)?;
    let mut errors = 0;
    let mut warnings = 0;

    for file_path in &files {
        let display_path = file_path.strip_prefix(path).unwrap_or(file_path);
        let display_path = if display_path.as_os_str().is_empty() {
            file_path.as_path()
        } else {
            display_path
        };

        let content = match std::fs::read_to_string(file_path) {
            Ok(c) => c,
            Err(e) => {
                println!("ERROR: {} - Failed to read: {}", display_path.display(), e);
                errors += 1;
                continue;
            }
        };

        let doc = match parse_document(&content) {
            Ok(d) => d,
            Err(e) => {
                println!("ERROR: {}:{} - Parse error: {}", display_path.display(), e.line(), e);
                errors += 1;
                continue;
            }
        };

        for reference in extract_refs(&doc) {
            if links.resolve(&reference.target).is_none() {
                println!(
                    "WARN:  {}:{} - Unresolved reference '{}'",
                    display_path.display(),
                    reference.line,
                    reference.target
                );
                warnings += 1;
            }
        }
    }

    println!();
    if errors == 0 && warnings == 0 {
        println!("✓ No issues found in {} files.", files.len());
    } else {
        println!(
            "Found {} error(s), {} warning(s) in {} files.",
            errors,
            warnings,
            files.len()
        );
    }

    if errors > 0 || (strict && warnings > 0) {
        return Ok(1);
    }

    Ok(0)
}

/// List every cross-reference in a file
pub fn refs(input: &Path, links: &LinkMap) -> Result<i32> {
    let content = read_source(input)?;
    let doc = match parse_source(&content, input) {
        Some(doc) => doc,
        None => return Ok(1),
    };

    let references = extract_refs(&doc);
    if references.is_empty() {
        println!("No references found in {}", input.display());
        return Ok(0);
    }

    println!("References in {}:\n", input.display());
    for reference in references {
        let shown = reference.display_text.as_deref().unwrap_or(&reference.target);
        match links.resolve(&reference.target) {
            Some(location) => println!("  {:>4}  {} → {}", reference.line, shown, location),
            None => println!("  {:>4}  {} (unresolved)", reference.line, shown),
        }
    }

    Ok(0)
}

/// Print the heading tree of a file
pub fn outline(input: &Path) -> Result<i32> {
    let content = read_source(input)?;
    let doc = match parse_source(&content, input) {
        Some(doc) => doc,
        None => return Ok(1),
    };

    let lines = outline_lines(&doc);
    if lines.is_empty() {
        println!("No headings found in {}", input.display());
        return Ok(0);
    }

    for line in lines {
        println!("{}", line);
    }

    Ok(0)
}

/// Write the default config file
pub fn init_config(path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::default_path);

    if Config::create_default(&path)? {
        println!("✓ Created {}", path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }

    Ok(())
}

fn outline_lines(doc: &Document) -> Vec<String> {
    doc.blocks()
        .iter()
        .filter_map(|block| match block {
            Block::Heading { level, text } => Some(format!(
                "{}{}",
                "  ".repeat(usize::from(level.saturating_sub(1))),
                plain_text(text)
            )),
            _ => None,
        })
        .collect()
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read input: {}", path.display()))
}

/// Parse, reporting a failure on stderr
fn parse_source(content: &str, path: &Path) -> Option<Document> {
    match parse_document(content) {
        Ok(doc) => {
            tracing::debug!(path = %path.display(), blocks = doc.len(), "parsed document");
            Some(doc)
        }
        Err(e) => {
            eprintln!("ERROR: {}:{} - Parse error: {}", path.display(), e.line(), e);
            None
        }
    }
}

fn collect_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let files = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| POD_EXTENSIONS.contains(&ext))
        })
        .map(|e| e.into_path())
        .collect();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Format;

    fn settings(format: Format, strict: bool) -> RenderSettings {
        RenderSettings {
            options: RenderOptions { format, standalone: false },
            links: LinkMap::new(),
            strict,
        }
    }

    #[test]
    fn test_render_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pod");
        let output = dir.path().join("doc.txt");
        std::fs::write(&input, "= Title\n\nSome text.\n").unwrap();

        let code = render(&input, &output, &settings(Format::Text, false)).unwrap();

        assert_eq!(code, 0);
        let text = std::fs::read_to_string(&output).unwrap();
        let title = text.find("Title").unwrap();
        let body = text.find("Some text.").unwrap();
        assert!(title < body);
    }

    #[test]
    fn test_unresolved_reference_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pod");
        let output = dir.path().join("doc.html");
        std::fs::write(&input, "See L<Nowhere>.\n").unwrap();

        let code = render(&input, &output, &settings(Format::Html, false)).unwrap();

        assert_eq!(code, 0);
        assert!(std::fs::read_to_string(&output).unwrap().contains("Nowhere"));
    }

    #[test]
    fn test_strict_fails_on_unresolved_reference() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pod");
        let output = dir.path().join("doc.txt");
        std::fs::write(&input, "L<Nowhere>\n").unwrap();

        let code = render(&input, &output, &settings(Format::Text, true)).unwrap();

        assert_eq!(code, 1);
        assert!(output.exists());
    }

    #[test]
    fn test_parse_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pod");
        let output = dir.path().join("doc.txt");
        std::fs::write(&input, "=begin code\nsay 1;\n").unwrap();

        let code = render(&input, &output, &settings(Format::Text, false)).unwrap();

        assert_eq!(code, 1);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = render(
            &dir.path().join("missing.pod"),
            &dir.path().join("out.txt"),
            &settings(Format::Text, false),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_check_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.rakudoc"), "=head1 Fine\n\nL<Routine>\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "=begin code\n").unwrap();

        let mut links = LinkMap::new();
        links.insert("Routine", "/type/Routine");
        assert_eq!(check(dir.path(), &links, true).unwrap(), 0);

        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("bad.pod6"), "=begin code\n").unwrap();
        assert_eq!(check(dir.path(), &links, false).unwrap(), 1);
    }

    #[test]
    fn test_check_strict_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pod");
        std::fs::write(&file, "L<Routine>\n").unwrap();

        assert_eq!(check(&file, &LinkMap::new(), false).unwrap(), 0);
        assert_eq!(check(&file, &LinkMap::new(), true).unwrap(), 1);
    }

    #[test]
    fn test_outline_lines() {
        let doc = parse_document("=TITLE class B<IO::Handle>\n\n=head2 method open\n\nText.\n\n=head3 Modes\n").unwrap();
        assert_eq!(
            outline_lines(&doc),
            vec!["class IO::Handle", "  method open", "    Modes"]
        );
    }

    #[test]
    fn test_init_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(Some(&path)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[links]"));

        // A second run keeps the existing file
        std::fs::write(&path, "strict = true\n").unwrap();
        init_config(Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "strict = true\n");
    }
}
