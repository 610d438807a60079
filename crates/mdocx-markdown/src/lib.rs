//! DOCX and HTML to Markdown conversion.
//!
//! # Pipeline
//!
//! 1. The package is read into a generic [`Node`] tree of HTML elements
//!    (or, for [`DocxToMarkdown::convert_html`], the markup is parsed)
//! 2. [`cleanup::clean`] drops vendor markup and normalizes inline styles
//! 3. [`tables::repair`] fixes broken table structure
//! 4. [`lists::reconstruct`] rebuilds nested lists from flat marker paragraphs
//! 5. The tree is transcoded to Markdown
//! 6. [`postprocess::postprocess`] applies the line-level passes
//!
//! # Example
//!
//! ```
//! use mdocx_config::ConvertOptions;
//! use mdocx_markdown::DocxToMarkdown;
//!
//! let converter = DocxToMarkdown::new(ConvertOptions::default());
//! let result = converter
//!     .convert_html("<h1>Title</h1><p>Some <b>bold</b> text</p>")
//!     .unwrap();
//! assert_eq!(result.output, "# Title\n\nSome **bold** text\n");
//! ```

pub mod cleanup;
pub mod entities;
mod error;
mod extract;
pub mod lists;
pub mod node;
pub mod parser;
pub mod postprocess;
pub mod tables;
mod transcode;

use std::sync::LazyLock;
use std::time::Instant;

use mdocx_config::ConvertOptions;
use mdocx_core::{
    Conversion, ConversionError, ConversionMetadata, ConversionWarning, WarningCode, Warnings,
};
use regex::Regex;

pub use error::{ExtractError, TranscodeError};
pub use node::Node;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("invalid tag regex"));

static BLOCK_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|tr|pre|blockquote)>")
        .expect("invalid block end regex")
});

/// Converts DOCX packages (or already extracted HTML) to Markdown.
///
/// Holds configuration only, so one converter can serve any number of
/// calls and threads.
#[derive(Debug, Clone, Default)]
pub struct DocxToMarkdown {
    options: ConvertOptions,
}

impl DocxToMarkdown {
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a DOCX package.
    ///
    /// A package whose body cannot be walked still converts, as plain
    /// paragraphs, with an [`WarningCode::ExtractionFailed`] warning.
    pub fn convert(&self, bytes: &[u8]) -> Result<Conversion<String>, ConversionError> {
        let started = Instant::now();
        if bytes.is_empty() {
            return Err(ConversionError::EmptyInput);
        }

        let extraction = extract::extract(bytes, &self.options).map_err(|e| match e {
            ExtractError::MissingPart(part) => ConversionError::NotFound(part),
            other => ConversionError::InvalidFile(other.to_string()),
        })?;
        tracing::debug!(
            images = extraction.images.len(),
            image_count = extraction.image_count,
            "extracted document tree"
        );

        let mut warnings = Warnings::new();
        warnings.extend(extraction.warnings);
        let mut conversion = self.finish(
            extraction.root,
            bytes.len(),
            extraction.image_count,
            warnings,
            started,
        )?;
        conversion.images = extraction.images;
        Ok(conversion)
    }

    /// Convert (X)HTML, e.g. a word processor's "save as web page" output.
    ///
    /// Unparseable markup degrades to its text content.
    pub fn convert_html(&self, html: &str) -> Result<Conversion<String>, ConversionError> {
        let started = Instant::now();
        if html.trim().is_empty() {
            return Err(ConversionError::EmptyInput);
        }

        let mut warnings = Warnings::new();
        let root = match parser::parse_html(html) {
            Ok(root) => root,
            Err(error) => {
                warnings.push(
                    ConversionWarning::new(
                        WarningCode::ExtractionFailed,
                        "markup unreadable, falling back to text content",
                    )
                    .with_detail(error.to_string()),
                );
                text_fallback(html)
            }
        };
        let image_count = count_images(&root);
        self.finish(root, html.len(), image_count, warnings, started)
    }

    fn finish(
        &self,
        mut root: Node,
        input_size: usize,
        image_count: usize,
        warnings: Warnings,
        started: Instant,
    ) -> Result<Conversion<String>, ConversionError> {
        cleanup::clean(&mut root);
        tables::repair(&mut root);
        lists::reconstruct(&mut root, self.options.list_indent);

        let transcoded = transcode::transcode(&root, self.options.preserve_links)
            .map_err(|e| ConversionError::TranscodeFailed(e.to_string()))?;
        let markdown =
            postprocess::postprocess(&transcoded.markdown, self.options.heading_anchor_style);

        let metadata = ConversionMetadata {
            input_size,
            output_size: markdown.len(),
            processing_time_ms: elapsed_ms(started),
            diagram_count: 0,
            internal_link_count: transcoded.internal_links,
            external_link_count: transcoded.external_links,
            image_count,
        };
        tracing::info!(
            input_size = metadata.input_size,
            output_size = metadata.output_size,
            warnings = warnings.len(),
            elapsed_ms = metadata.processing_time_ms,
            "converted document to markdown"
        );
        Ok(Conversion {
            output: markdown,
            metadata,
            warnings: warnings.into_vec(),
            images: Vec::new(),
        })
    }
}

/// One paragraph per block of tag-stripped text.
fn text_fallback(html: &str) -> Node {
    let text = BLOCK_END_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = entities::convert_html_entities(&text);
    let paragraphs = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Node::new("p").with_text(entities::decode_references(line)))
        .collect();
    Node::new("root").with_children(paragraphs)
}

fn count_images(node: &Node) -> usize {
    usize::from(node.tag == "img") + node.children.iter().map(count_images).sum::<usize>()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdocx_config::HeadingAnchorStyle;
    use mdocx_core::ErrorCode;
    use mdocx_diagrams::testing::FakeLauncher;
    use mdocx_docx::MarkdownToDocx;
    use pretty_assertions::assert_eq;

    fn to_docx(markdown: &str) -> Vec<u8> {
        MarkdownToDocx::new(ConvertOptions::default())
            .without_diagrams()
            .convert(markdown)
            .unwrap()
            .output
    }

    fn round_trip(markdown: &str) -> String {
        DocxToMarkdown::default()
            .convert(&to_docx(markdown))
            .unwrap()
            .output
    }

    #[test]
    fn test_heading_round_trip() {
        assert_eq!(round_trip("# Title\n"), "# Title\n");
    }

    #[test]
    fn test_heading_round_trip_with_anchor() {
        let options = ConvertOptions::default().with_anchor_style(HeadingAnchorStyle::Attribute);
        let result = DocxToMarkdown::new(options)
            .convert(&to_docx("# Title\n\nBody text.\n"))
            .unwrap();
        assert_eq!(result.output, "# Title {#title}\n\nBody text.\n");
    }

    #[test]
    fn test_ordered_lists_restart() {
        let markdown = round_trip("1. one\n2. two\n\nBetween.\n\n1. three\n2. four\n");
        assert_eq!(markdown, "1. one\n2. two\n\nBetween.\n\n1. three\n2. four\n");
    }

    #[test]
    fn test_table_shape() {
        for (rows, cols) in [(1, 1), (2, 3), (4, 1), (10, 10)] {
            let mut markdown = String::new();
            let header: Vec<String> = (0..cols).map(|c| format!("H{c}")).collect();
            markdown.push_str(&format!("| {} |\n", header.join(" | ")));
            markdown.push_str(&format!("|{}\n", " --- |".repeat(cols)));
            for r in 0..rows {
                let cells: Vec<String> = (0..cols).map(|c| format!("r{r}c{c}")).collect();
                markdown.push_str(&format!("| {} |\n", cells.join(" | ")));
            }

            let output = round_trip(&markdown);
            let lines: Vec<&str> = output.lines().filter(|l| l.starts_with('|')).collect();
            // Header, separator and one line per body row.
            assert_eq!(lines.len(), rows + 2, "{rows}x{cols}:\n{output}");
            for line in lines {
                assert_eq!(line.matches('|').count(), cols + 1, "{rows}x{cols}: {line}");
            }
            assert!(output.contains(&format!("r{}c{}", rows - 1, cols - 1)));
        }
    }

    #[test]
    fn test_diagram_round_trip() {
        let docx = MarkdownToDocx::new(ConvertOptions::default())
            .with_diagram_launcher(FakeLauncher::default())
            .convert("# Flow\n\n```mermaid\ngraph TD\n  A --> B\n```\n")
            .unwrap();
        assert_eq!(docx.metadata.diagram_count, 1);

        let result = DocxToMarkdown::default().convert(&docx.output).unwrap();
        assert_eq!(result.metadata.image_count, 1);
        assert!(result.output.starts_with("# Flow\n\n!["));
        assert!(result.output.contains("](data:image/"));
    }

    #[test]
    fn test_extracted_images_returned() {
        let docx = MarkdownToDocx::new(ConvertOptions::default())
            .with_diagram_launcher(FakeLauncher::default())
            .convert("```mermaid\ngraph TD\n  A --> B\n```\n")
            .unwrap();
        let options = ConvertOptions {
            extract_images: true,
            ..ConvertOptions::default()
        };
        let result = DocxToMarkdown::new(options).convert(&docx.output).unwrap();
        assert_eq!(result.images.len(), 1);
        assert!(!result.images[0].bytes.is_empty());
        let reference = format!("](images/{})", result.images[0].file_name);
        assert!(result.output.contains(&reference), "{}", result.output);
    }

    #[test]
    fn test_internal_link_round_trip() {
        let result = DocxToMarkdown::default()
            .convert(&to_docx(
                "# Guide\n\nRead [Intro Section](#intro-section) first.\n\n## Intro Section\n\nHello.\n",
            ))
            .unwrap();
        assert!(
            result
                .output
                .contains("Read [Intro Section](#intro-section) first."),
            "{}",
            result.output
        );
        assert!(result.output.contains("## Intro Section\n"));
        assert_eq!(result.metadata.internal_link_count, 1);
    }

    #[test]
    fn test_underlined_heading_anchor_matches_link() {
        let options = ConvertOptions::default().with_anchor_style(HeadingAnchorStyle::Attribute);
        let result = DocxToMarkdown::new(options)
            .convert(&to_docx(
                "# Guide\n\nSee [Use this](#use-this).\n\n## Use <u>this</u>\n\nBody.\n",
            ))
            .unwrap();
        assert!(
            result.output.contains("## Use <u>this</u> {#use-this}\n"),
            "{}",
            result.output
        );
        assert!(result.output.contains("[Use this](#use-this)"), "{}", result.output);
    }

    #[test]
    fn test_external_links() {
        let docx = to_docx("See [site](https://example.com).\n");
        let kept = DocxToMarkdown::default().convert(&docx).unwrap();
        assert_eq!(kept.output, "See [site](https://example.com).\n");
        assert_eq!(kept.metadata.external_link_count, 1);

        let options = ConvertOptions {
            preserve_links: false,
            ..ConvertOptions::default()
        };
        let dropped = DocxToMarkdown::new(options).convert(&docx).unwrap();
        assert_eq!(dropped.output, "See site.\n");
        assert_eq!(dropped.metadata.external_link_count, 0);
    }

    #[test]
    fn test_inline_formatting_round_trip() {
        assert_eq!(
            round_trip("Some **bold**, *italic*, ~~gone~~ and `code`.\n"),
            "Some **bold**, *italic*, ~~gone~~ and `code`.\n"
        );
    }

    #[test]
    fn test_code_block_round_trip() {
        assert_eq!(
            round_trip("```\nlet x = 1;\nlet y = 2;\n```\n"),
            "```\nlet x = 1;\nlet y = 2;\n```\n"
        );
    }

    #[test]
    fn test_nested_list_from_flat_paragraphs() {
        let html = r#"
            <p style="margin-left:18pt">&bull; parent</p>
            <p style="margin-left:36pt">&bull; child</p>
            <p style="margin-left:54pt">&bull; grandchild</p>
        "#;
        let result = DocxToMarkdown::default().convert_html(html).unwrap();
        assert_eq!(result.output, "- parent\n  - child\n    - grandchild\n");
    }

    #[test]
    fn test_word_html_cleanup() {
        let html = r#"<html xmlns:o="urn:schemas-microsoft-com:office:office">
            <head><style>p.MsoNormal {}</style></head>
            <body><div class=WordSection1>
            <h2>Setup<o:p></o:p></h2>
            <p class=MsoNormal><span style="mso-bidi-font-weight:bold;font-weight:bold">Note</span>: keep <span style="text-decoration:underline">this</span>.<o:p></o:p></p>
            <p class=MsoNormal><o:p>&nbsp;</o:p></p>
            </div></body></html>"#;
        let result = DocxToMarkdown::default().convert_html(html).unwrap();
        assert_eq!(result.output, "## Setup\n\n**Note**: keep <u>this</u>.\n");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_html_images_counted() {
        let result = DocxToMarkdown::default()
            .convert_html(r#"<p><img src="a.png" alt="A"> and <img src="b.png"></p>"#)
            .unwrap();
        assert_eq!(result.metadata.image_count, 2);
        assert_eq!(result.output, "![A](a.png) and ![](b.png)\n");
    }

    #[test]
    fn test_text_fallback() {
        let root = text_fallback("<p>One &amp; <b>two</b></p><p>three<br>four</p>");
        let texts: Vec<&str> = root.children.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["One & two", "three", "four"]);
    }

    #[test]
    fn test_metadata_sizes() {
        let html = "<p>Hello</p>";
        let result = DocxToMarkdown::default().convert_html(html).unwrap();
        assert_eq!(result.metadata.input_size, html.len());
        assert_eq!(result.metadata.output_size, "Hello\n".len());
        assert_eq!(result.metadata.diagram_count, 0);
    }

    #[test]
    fn test_empty_input() {
        let converter = DocxToMarkdown::default();
        assert_eq!(converter.convert(b"").unwrap_err().code(), ErrorCode::EmptyInput);
        assert_eq!(
            converter.convert_html(" \n ").unwrap_err().code(),
            ErrorCode::EmptyInput
        );
    }

    #[test]
    fn test_not_a_package() {
        let err = DocxToMarkdown::default()
            .convert(b"plain text, not a zip")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFile);
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = extract::package::tests::package(&[("word/styles.xml", b"<w:styles/>")]);
        let err = DocxToMarkdown::default().convert(&bytes).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_converter_reuse() {
        let converter = DocxToMarkdown::default();
        let docx = to_docx("# A\n\n## A\n");
        let first = converter.convert(&docx).unwrap();
        let second = converter.convert(&docx).unwrap();
        assert_eq!(first.output, second.output);
    }
}
