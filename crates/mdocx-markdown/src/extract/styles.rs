//! Paragraph style classification from `word/styles.xml`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::node::Node;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^heading\s*([1-9])$").expect("invalid heading regex"));

/// Semantic role of a paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParagraphKind {
    Normal,
    Title,
    Heading(u8),
    Code,
    Quote,
    Rule,
}

/// Style id to display name.
#[derive(Debug, Default)]
pub(crate) struct StyleMap {
    names: HashMap<String, String>,
}

impl StyleMap {
    pub(crate) fn from_tree(root: &Node) -> Self {
        let mut names = HashMap::new();
        if let Some(styles) = root.child("w:styles") {
            for style in styles.children_named("w:style") {
                let Some(id) = style.attr("w:styleId") else {
                    continue;
                };
                let name = style
                    .child("w:name")
                    .and_then(|n| n.attr("w:val"))
                    .unwrap_or(id);
                names.insert(id.to_owned(), name.to_owned());
            }
        }
        Self { names }
    }

    fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map_or(id, String::as_str)
    }

    /// Classify a paragraph style id; unknown ids are classified by the id.
    pub(crate) fn paragraph_kind(&self, id: &str) -> ParagraphKind {
        let kind = classify(self.name(id));
        if kind == ParagraphKind::Normal {
            classify(id)
        } else {
            kind
        }
    }

    /// Whether a character style marks inline code.
    pub(crate) fn is_code_char(&self, id: &str) -> bool {
        let name = self.name(id).to_ascii_lowercase();
        name.contains("code") || name.contains("verbatim")
    }
}

fn classify(name: &str) -> ParagraphKind {
    let lower = name.trim().to_ascii_lowercase();
    if lower == "title" {
        return ParagraphKind::Title;
    }
    if let Some(caps) = HEADING_RE.captures(&lower) {
        let level = caps[1].parse::<u8>().unwrap_or(1).min(6);
        return ParagraphKind::Heading(level);
    }
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == "horizontalrule" {
        ParagraphKind::Rule
    } else if compact.contains("code")
        || compact.contains("preformatted")
        || compact.contains("verbatim")
    {
        ParagraphKind::Code
    } else if compact.contains("quote") || compact == "blocktext" {
        ParagraphKind::Quote
    } else {
        ParagraphKind::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    const STYLES: &str = r#"<w:styles>
        <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
        <w:style w:type="paragraph" w:styleId="a3"><w:name w:val="Title"/></w:style>
        <w:style w:type="paragraph" w:styleId="HTMLPreformatted"><w:name w:val="HTML Preformatted"/></w:style>
        <w:style w:type="paragraph" w:styleId="IntenseQuote"><w:name w:val="Intense Quote"/></w:style>
        <w:style w:type="character" w:styleId="CodeInline"><w:name w:val="Code Inline"/></w:style>
        <w:style w:type="paragraph" w:styleId="TOCHeading"><w:name w:val="TOC Heading"/></w:style>
    </w:styles>"#;

    fn styles() -> StyleMap {
        StyleMap::from_tree(&parse_xml(STYLES).unwrap())
    }

    #[test]
    fn test_classify_by_name() {
        let styles = styles();
        assert_eq!(styles.paragraph_kind("Heading2"), ParagraphKind::Heading(2));
        assert_eq!(styles.paragraph_kind("a3"), ParagraphKind::Title);
        assert_eq!(styles.paragraph_kind("HTMLPreformatted"), ParagraphKind::Code);
        assert_eq!(styles.paragraph_kind("IntenseQuote"), ParagraphKind::Quote);
        assert_eq!(styles.paragraph_kind("TOCHeading"), ParagraphKind::Normal);
    }

    #[test]
    fn test_classify_unknown_id() {
        let styles = StyleMap::default();
        assert_eq!(styles.paragraph_kind("Heading8"), ParagraphKind::Heading(6));
        assert_eq!(styles.paragraph_kind("Normal"), ParagraphKind::Normal);
        assert_eq!(styles.paragraph_kind("Heading3"), ParagraphKind::Heading(3));
        assert_eq!(styles.paragraph_kind("CodeBlock"), ParagraphKind::Code);
        assert_eq!(styles.paragraph_kind("HorizontalRule"), ParagraphKind::Rule);
    }

    #[test]
    fn test_code_char_style() {
        assert!(styles().is_code_char("CodeInline"));
        assert!(!styles().is_code_char("Hyperlink"));
    }
}
