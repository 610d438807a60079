use mdocx_anchors::AnchorMap;

use crate::model::{DocElement, InlineElement, Paragraph, ParagraphStyle, Run, RunStyle};

/// Deepest heading level listed.
const TOC_MAX_LEVEL: u8 = 3;

/// Table of contents: a heading plus one bookmark link per heading.
#[must_use]
pub fn build_toc(anchors: &AnchorMap) -> Vec<DocElement> {
    let entries = anchors.toc(TOC_MAX_LEVEL);
    if entries.is_empty() {
        return Vec::new();
    }

    let mut elements = Vec::with_capacity(entries.len() + 1);
    elements.push(DocElement::Paragraph(Paragraph::new(
        ParagraphStyle::TocHeading,
        vec![InlineElement::Run(Run::new("Contents", RunStyle::default()))],
    )));
    let link_style = RunStyle {
        hyperlink: true,
        ..RunStyle::default()
    };
    for entry in entries {
        elements.push(DocElement::Paragraph(Paragraph::new(
            ParagraphStyle::Toc(entry.level),
            vec![InlineElement::InternalRef {
                anchor: entry.bookmark,
                runs: vec![Run::new(entry.title, link_style.clone())],
            }],
        )));
    }
    elements
}
