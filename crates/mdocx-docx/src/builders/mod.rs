//! Token-to-element builders.
//!
//! Each block kind has its own builder returning zero or more elements.
//! A failing builder only loses its own top-level element.

mod heading;
mod image;
mod inline;
mod list;
mod table;
mod text;
mod toc;

use mdocx_anchors::AnchorMap;
use mdocx_core::{ConversionWarning, WarningCode};

use crate::error::BuildError;
use crate::model::{Alignment, DocElement, InlineElement, Paragraph, ParagraphStyle, RunStyle};
use crate::session::ConversionSession;
use crate::tokens::{self, Block};

pub(crate) use inline::build_inlines;
pub use toc::build_toc;

/// Twips per indentation step.
pub(crate) const INDENT_STEP: i32 = 720;

/// Nesting position of the block being built.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Context {
    pub list_depth: usize,
    pub quote_depth: usize,
}

impl Context {
    fn in_list(self) -> Self {
        Self {
            list_depth: self.list_depth + 1,
            ..self
        }
    }

    fn in_quote(self) -> Self {
        Self {
            quote_depth: self.quote_depth + 1,
            ..self
        }
    }
}

/// Headings in builder traversal order.
#[must_use]
pub fn collect_headings(blocks: &[Block]) -> Vec<(u8, String)> {
    let mut headings = Vec::new();
    walk_headings(blocks, &mut headings);
    headings
}

fn walk_headings(blocks: &[Block], out: &mut Vec<(u8, String)>) {
    for block in blocks {
        match block {
            Block::Heading { level, inlines } => out.push((*level, tokens::plain_text(inlines))),
            Block::BlockQuote(children) => walk_headings(children, out),
            Block::List(list) => {
                for item in &list.items {
                    walk_headings(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

/// Anchor map of every heading in `blocks`.
#[must_use]
pub fn anchor_map(blocks: &[Block]) -> AnchorMap {
    let mut anchors = AnchorMap::new();
    for (level, text) in collect_headings(blocks) {
        anchors.insert(level, &text);
    }
    anchors
}

/// Build the body elements, skipping elements whose builder fails.
pub fn build_body(blocks: &[Block], session: &mut ConversionSession<'_>) -> Vec<DocElement> {
    let mut elements = Vec::new();
    let mut headings_seen = 0;

    for block in blocks {
        match build_block(block, Context::default(), session) {
            Ok(built) => elements.extend(built),
            Err(e) => {
                session.warnings.push(
                    ConversionWarning::new(WarningCode::BuildFailed, "element skipped")
                        .with_detail(e.to_string()),
                );
            }
        }
        headings_seen += collect_headings(std::slice::from_ref(block)).len();
        session.set_heading_cursor(headings_seen);
    }
    elements
}

pub(crate) fn build_blocks(
    blocks: &[Block],
    ctx: Context,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<DocElement>, BuildError> {
    let mut elements = Vec::new();
    for block in blocks {
        elements.extend(build_block(block, ctx, session)?);
    }
    Ok(elements)
}

pub(crate) fn build_block(
    block: &Block,
    ctx: Context,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<DocElement>, BuildError> {
    let elements = match block {
        Block::Heading { level, inlines } => {
            vec![DocElement::Paragraph(heading::build(*level, inlines, session)?)]
        }
        Block::Paragraph(inlines) => vec![DocElement::Paragraph(paragraph(inlines, session)?)],
        Block::List(list) => list::build(list, ctx, session)?,
        Block::CodeBlock { text, .. } => text::code_block(text),
        Block::BlockQuote(children) => text::block_quote(children, ctx, session)?,
        Block::Table(table) => vec![DocElement::Table(table::build(table, session)?)],
        Block::Rule => vec![text::rule()],
        Block::Html(html) => text::html_block(html),
        Block::Unsupported(kind) => {
            session.warn(
                WarningCode::UnsupportedToken,
                format!("skipped {}", kind.as_str()),
            );
            Vec::new()
        }
    };
    Ok(elements)
}

fn paragraph(
    inlines: &[tokens::Inline],
    session: &mut ConversionSession<'_>,
) -> Result<Paragraph, BuildError> {
    let children = build_inlines(inlines, &RunStyle::default(), session)?;
    let image_only = !children.is_empty()
        && children
            .iter()
            .all(|c| matches!(c, InlineElement::Image(_)));
    let mut paragraph = Paragraph::new(ParagraphStyle::Normal, children);
    if image_only {
        paragraph.alignment = Alignment::Center;
    }
    Ok(paragraph)
}

/// Left indent for nesting `depth` (0-based).
pub(crate) fn indent_for(depth: usize) -> i32 {
    i32::try_from(depth + 1).map_or(i32::MAX, |n| n.saturating_mul(INDENT_STEP))
}

/// Indent paragraphs that carry no indentation of their own.
pub(crate) fn indent_unset(elements: &mut [DocElement], indent: i32) {
    for element in elements {
        if let DocElement::Paragraph(p) = element
            && p.indent.is_none()
            && p.numbering.is_none()
        {
            p.indent = Some(indent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::parse;
    use pretty_assertions::assert_eq;

    fn build(markup: &str) -> (Vec<DocElement>, ConversionSession<'static>) {
        let blocks = parse(markup);
        let mut session = ConversionSession::new(anchor_map(&blocks));
        let elements = build_body(&blocks, &mut session);
        (elements, session)
    }

    #[test]
    fn test_collect_headings_includes_nested() {
        let blocks = parse("# A\n\n> ## B\n\n- ### C\n");
        assert_eq!(
            collect_headings(&blocks),
            vec![
                (1, "A".to_owned()),
                (2, "B".to_owned()),
                (3, "C".to_owned()),
            ]
        );
    }

    #[test]
    fn test_element_order_matches_token_order() {
        let (elements, _) = build("# One\n\npara\n\n---\n\n## Two\n");
        let styles: Vec<ParagraphStyle> = elements
            .iter()
            .map(|e| match e {
                DocElement::Paragraph(p) => p.style,
                DocElement::Table(_) => panic!("unexpected table"),
            })
            .collect();
        assert_eq!(
            styles,
            vec![
                ParagraphStyle::Heading(1),
                ParagraphStyle::Normal,
                ParagraphStyle::HorizontalRule,
                ParagraphStyle::Heading(2),
            ]
        );
    }

    #[test]
    fn test_unsupported_token_warns_and_skips() {
        let (elements, session) = build("Body\n\n[^1]: A footnote\n");
        assert_eq!(elements.len(), 1);
        assert_eq!(session.warnings.count(WarningCode::UnsupportedToken), 1);
    }

    #[test]
    fn test_failed_element_is_skipped_with_warning() {
        let (elements, session) = build("# Kept\n\n![bad](data:image/png;base64,@@@)\n\n## Also kept\n");
        assert_eq!(elements.len(), 2);
        assert_eq!(session.warnings.count(WarningCode::BuildFailed), 1);
        let DocElement::Paragraph(last) = &elements[1] else {
            panic!("expected paragraph");
        };
        assert!(matches!(
            &last.children[0],
            InlineElement::BookmarkStart { name, .. } if name == "also_kept"
        ));
    }
}
