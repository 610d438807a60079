//! DOCX package to HTML node tree.
//!
//! The package is opened once; `styles.xml`, `numbering.xml` and the
//! document relationships are optional and read leniently. When
//! `document.xml` itself cannot be walked, extraction degrades to plain
//! paragraphs of run text and reports [`WarningCode::ExtractionFailed`].

mod document;
mod numbering;
pub(crate) mod package;
mod styles;

use std::sync::LazyLock;

use mdocx_config::ConvertOptions;
use mdocx_core::{ConversionWarning, ExtractedImage, WarningCode};
use regex::Regex;

use self::document::Walker;
use self::numbering::Numbering;
use self::package::{DOCUMENT_PART, Media, NUMBERING_PART, Package, RELS_PART, Relationships, STYLES_PART};
use self::styles::StyleMap;
use crate::entities::decode_references;
use crate::error::ExtractError;
use crate::node::Node;
use crate::parser::parse_xml;

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p\b[^>]*>(.*?)</w:p>").expect("invalid paragraph regex"));

static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("invalid text regex"));

/// Result of reading one package.
#[derive(Debug)]
pub(crate) struct Extraction {
    /// HTML tree under a `root` node.
    pub root: Node,
    pub images: Vec<ExtractedImage>,
    /// Image references in the body, including repeats.
    pub image_count: usize,
    pub warnings: Vec<ConversionWarning>,
}

/// Read a DOCX package into an HTML tree.
///
/// Fails only when the bytes are not a package or `word/document.xml` is
/// missing or unreadable.
pub(crate) fn extract(bytes: &[u8], options: &ConvertOptions) -> Result<Extraction, ExtractError> {
    let mut package = Package::open(bytes)?;
    let document = package
        .read_text(DOCUMENT_PART)?
        .ok_or_else(|| ExtractError::MissingPart(DOCUMENT_PART.to_owned()))?;

    let mut warnings = Vec::new();
    let styles = optional_part(&mut package, STYLES_PART, &mut warnings)
        .map(|tree| StyleMap::from_tree(&tree))
        .unwrap_or_default();
    let mut numbering = optional_part(&mut package, NUMBERING_PART, &mut warnings)
        .map(|tree| Numbering::from_tree(&tree))
        .unwrap_or_default();
    let rels = optional_part(&mut package, RELS_PART, &mut warnings)
        .map(|tree| Relationships::from_tree(&tree))
        .unwrap_or_default();

    let extract_to = options
        .extract_images
        .then_some(options.image_output_dir.as_path());
    let mut media = Media::new(extract_to);

    let walked = parse_xml(&document).and_then(|tree| {
        let Some(body) = tree
            .child("w:document")
            .and_then(|d| d.child("w:body"))
        else {
            return Err(ExtractError::MissingPart("w:body".to_owned()));
        };
        let mut walker = Walker {
            package: &mut package,
            styles: &styles,
            numbering: &mut numbering,
            rels: &rels,
            media: &mut media,
            unit_pt: options.list_indent.unit_pt,
            warnings: Vec::new(),
        };
        let children = walker.body(body)?;
        Ok((children, walker.warnings))
    });

    match walked {
        Ok((children, walk_warnings)) => {
            warnings.extend(walk_warnings);
            Ok(Extraction {
                root: Node::new("root").with_children(children),
                images: media.images,
                image_count: media.count,
                warnings,
            })
        }
        Err(error) => {
            let warning = ConversionWarning::new(
                WarningCode::ExtractionFailed,
                "document structure unreadable, images, links and formatting dropped",
            )
            .with_detail(error.to_string());
            tracing::debug!(error = %error, "falling back to raw text extraction");
            warnings.push(warning);
            Ok(Extraction {
                root: raw_text(&document),
                images: Vec::new(),
                image_count: 0,
                warnings,
            })
        }
    }
}

/// Parse an optional part; absent or malformed parts yield `None`.
fn optional_part(
    package: &mut Package<'_>,
    name: &str,
    warnings: &mut Vec<ConversionWarning>,
) -> Option<Node> {
    let parsed = package
        .read_text(name)
        .and_then(|text| text.map(|t| parse_xml(&t)).transpose());
    match parsed {
        Ok(tree) => tree,
        Err(error) => {
            let warning = ConversionWarning::new(
                WarningCode::ExtractionFailed,
                format!("ignoring unreadable part {name}"),
            )
            .with_detail(error.to_string());
            tracing::debug!(part = name, error = %error, "ignoring unreadable part");
            warnings.push(warning);
            None
        }
    }
}

/// Paragraphs of run text pulled out with patterns instead of a parser.
pub(crate) fn raw_text(xml: &str) -> Node {
    let mut root = Node::new("root");
    for paragraph in PARAGRAPH_RE.captures_iter(xml) {
        let text: String = TEXT_RE
            .captures_iter(&paragraph[1])
            .map(|t| decode_references(&t[1]))
            .collect();
        if !text.trim().is_empty() {
            root.push(Node::new("p").with_text(text));
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::package::tests::package;
    use pretty_assertions::assert_eq;

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    #[test]
    fn test_extract_paragraphs() {
        let xml = document(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p><w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
        );
        let bytes = package(&[(DOCUMENT_PART, xml.as_bytes())]);
        let extraction = extract(&bytes, &ConvertOptions::default()).unwrap();
        let root = extraction.root;
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].tag, "h1");
        assert_eq!(root.children[1].text_content(), "Body");
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = package(&[("word/styles.xml", b"<w:styles/>".as_slice())]);
        assert!(matches!(
            extract(&bytes, &ConvertOptions::default()),
            Err(ExtractError::MissingPart(_))
        ));
    }

    #[test]
    fn test_malformed_document_falls_back_to_raw_text() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Salvaged &amp; kept</w:t></w:r></w:p><w:p><!-- unterminated"#;
        let bytes = package(&[(DOCUMENT_PART, xml.as_bytes())]);
        let extraction = extract(&bytes, &ConvertOptions::default()).unwrap();
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].code, WarningCode::ExtractionFailed);
        assert_eq!(extraction.root.children[0].text, "Salvaged & kept");
    }

    #[test]
    fn test_malformed_styles_are_ignored() {
        let xml = document(r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#);
        let bytes = package(&[
            (DOCUMENT_PART, xml.as_bytes()),
            (STYLES_PART, b"\xff\xfe".as_slice()),
        ]);
        let extraction = extract(&bytes, &ConvertOptions::default()).unwrap();
        assert_eq!(extraction.root.children[0].text_content(), "Body");
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_raw_text() {
        let root = raw_text(
            r#"<w:p><w:r><w:t>a</w:t></w:r><w:r><w:t xml:space="preserve"> b</w:t></w:r></w:p><w:p></w:p>"#,
        );
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text, "a b");
    }
}
