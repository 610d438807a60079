use std::sync::LazyLock;

use regex::Regex;

use crate::builders::{Context, build_block, build_inlines, indent_for, indent_unset};
use crate::error::BuildError;
use crate::model::{DocElement, InlineElement, NumberingRef, Paragraph, ParagraphStyle, Run, RunStyle};
use crate::session::ConversionSession;
use crate::tokens::{Block, Inline, List};

static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([ xX])\]\s+").expect("invalid task regex"));

const UNCHECKED: &str = "\u{2610} ";
const CHECKED: &str = "\u{2612} ";

/// Build one list occurrence.
///
/// Each occurrence, nested ones included, gets its own numbering instance
/// so ordered lists always restart at 1.
pub(super) fn build(
    list: &List,
    ctx: Context,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<DocElement>, BuildError> {
    let level = ctx.list_depth;
    let indent = indent_for(level);
    let mut num_id = None;
    let mut elements = Vec::new();

    for item in &list.items {
        let mut blocks = item.blocks.as_slice();

        let first: &[Inline] = match blocks.first() {
            Some(Block::Paragraph(inlines)) => {
                blocks = &blocks[1..];
                inlines.as_slice()
            }
            _ => &[],
        };

        let paragraph = if let Some((checked, rest)) = task_item(first) {
            let glyph = if checked { CHECKED } else { UNCHECKED };
            let mut children = vec![InlineElement::Run(Run::new(glyph, RunStyle::default()))];
            children.extend(build_inlines(&rest, &RunStyle::default(), session)?);
            Paragraph {
                indent: Some(indent),
                ..Paragraph::new(ParagraphStyle::Normal, children)
            }
        } else {
            let num_id = *num_id.get_or_insert_with(|| session.new_numbering(list.ordered));
            Paragraph {
                numbering: Some(NumberingRef { num_id, level }),
                ..Paragraph::new(
                    ParagraphStyle::Normal,
                    build_inlines(first, &RunStyle::default(), session)?,
                )
            }
        };
        elements.push(DocElement::Paragraph(paragraph));

        for block in blocks {
            let mut built = build_block(block, ctx.in_list(), session)?;
            if !matches!(block, Block::List(_)) {
                indent_unset(&mut built, indent);
            }
            elements.extend(built);
        }
    }
    Ok(elements)
}

/// Checkbox state and remaining inlines of a `[ ]` / `[x]` item.
fn task_item(inlines: &[Inline]) -> Option<(bool, Vec<Inline>)> {
    let Some(Inline::Text(text)) = inlines.first() else {
        return None;
    };
    let caps = TASK_RE.captures(text)?;
    let checked = &caps[1] != " ";
    let remainder = &text[caps.get(0)?.end()..];

    let mut rest = Vec::with_capacity(inlines.len());
    if !remainder.is_empty() {
        rest.push(Inline::Text(remainder.to_owned()));
    }
    rest.extend_from_slice(&inlines[1..]);
    Some((checked, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{anchor_map, build_body};
    use crate::tokens::parse;
    use pretty_assertions::assert_eq;

    fn paragraphs(markup: &str) -> (Vec<Paragraph>, ConversionSession<'static>) {
        let blocks = parse(markup);
        let mut session = ConversionSession::new(anchor_map(&blocks));
        let paragraphs = build_body(&blocks, &mut session)
            .into_iter()
            .filter_map(|e| match e {
                DocElement::Paragraph(p) => Some(p),
                DocElement::Table(_) => None,
            })
            .collect();
        (paragraphs, session)
    }

    fn numbering(paragraphs: &[Paragraph]) -> Vec<Option<(usize, usize)>> {
        paragraphs
            .iter()
            .map(|p| p.numbering.map(|n| (n.num_id, n.level)))
            .collect()
    }

    #[test]
    fn test_sibling_ordered_lists_get_fresh_numbering() {
        let (paragraphs, session) = paragraphs("1. a\n2. b\n\nText\n\n1. c\n2. d\n");
        assert_eq!(
            numbering(&paragraphs),
            vec![Some((1, 0)), Some((1, 0)), None, Some((2, 0)), Some((2, 0))]
        );
        let (numberings, _, _) = session.into_parts();
        assert_eq!(numberings.len(), 2);
        assert!(numberings.iter().all(|n| n.ordered));
    }

    #[test]
    fn test_nested_lists_get_own_instances_and_levels() {
        let (paragraphs, session) = paragraphs("1. a\n   1. a1\n   2. a2\n2. b\n   - b1\n");
        assert_eq!(
            numbering(&paragraphs),
            vec![
                Some((1, 0)),
                Some((2, 1)),
                Some((2, 1)),
                Some((1, 0)),
                Some((3, 1)),
            ]
        );
        let (numberings, _, _) = session.into_parts();
        assert_eq!(
            numberings.iter().map(|n| n.ordered).collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_task_items_use_glyph_not_numbering() {
        let (paragraphs, session) = paragraphs("- [ ] todo\n- [x] done\n");
        assert_eq!(numbering(&paragraphs), vec![None, None]);
        assert_eq!(paragraphs[0].text(), "\u{2610} todo");
        assert_eq!(paragraphs[1].text(), "\u{2612} done");
        assert_eq!(paragraphs[0].indent, Some(720));
        let (numberings, _, _) = session.into_parts();
        assert!(numberings.is_empty());
    }

    #[test]
    fn test_continuation_paragraph_is_indented() {
        let (paragraphs, _) = paragraphs("- first\n\n  more text\n- second\n");
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[1].text(), "more text");
        assert_eq!(paragraphs[1].numbering, None);
        assert_eq!(paragraphs[1].indent, Some(720));
    }

    #[test]
    fn test_task_item_detection() {
        let inlines = vec![Inline::Text("[x] ship it".to_owned())];
        assert_eq!(
            task_item(&inlines),
            Some((true, vec![Inline::Text("ship it".to_owned())]))
        );
        assert_eq!(task_item(&[Inline::Text("[link] text".to_owned())]), None);
    }
}
