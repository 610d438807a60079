use crate::builders::build_inlines;
use crate::error::BuildError;
use crate::model::{InlineElement, Paragraph, ParagraphStyle, RunStyle};
use crate::session::ConversionSession;
use crate::tokens::Inline;

/// Heading paragraph wrapped in a bookmark named after its anchor.
pub(super) fn build(
    level: u8,
    inlines: &[Inline],
    session: &mut ConversionSession<'_>,
) -> Result<Paragraph, BuildError> {
    let mut children = Vec::new();
    let bookmark = session.next_heading().map(|anchor| {
        let id = session.next_bookmark_id();
        children.push(InlineElement::BookmarkStart {
            id,
            name: anchor.bookmark,
        });
        id
    });

    children.extend(build_inlines(inlines, &RunStyle::default(), session)?);

    if let Some(id) = bookmark {
        children.push(InlineElement::BookmarkEnd { id });
    }
    Ok(Paragraph::new(
        ParagraphStyle::Heading(level.clamp(1, 6)),
        children,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::anchor_map;
    use crate::model::Run;
    use crate::tokens::{Block, parse};
    use pretty_assertions::assert_eq;

    fn headings(markup: &str) -> Vec<Paragraph> {
        let blocks = parse(markup);
        let mut session = ConversionSession::new(anchor_map(&blocks));
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level, inlines } => Some(build(*level, inlines, &mut session).unwrap()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_heading_wrapped_in_bookmark() {
        let built = headings("## Intro Section\n");
        assert_eq!(
            built[0],
            Paragraph::new(
                ParagraphStyle::Heading(2),
                vec![
                    InlineElement::BookmarkStart {
                        id: 0,
                        name: "intro_section".to_owned(),
                    },
                    InlineElement::Run(Run::new("Intro Section", RunStyle::default())),
                    InlineElement::BookmarkEnd { id: 0 },
                ],
            )
        );
    }

    #[test]
    fn test_duplicate_headings_get_distinct_bookmarks() {
        let built = headings("# Setup\n\n# Setup\n");
        let names: Vec<&str> = built
            .iter()
            .map(|p| match &p.children[0] {
                InlineElement::BookmarkStart { name, .. } => name.as_str(),
                other => panic!("expected bookmark, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["setup", "setup_1"]);
    }

    #[test]
    fn test_punctuation_only_heading_gets_fallback_bookmark() {
        let built = headings("# ???\n");
        assert!(matches!(
            &built[0].children[0],
            InlineElement::BookmarkStart { name, .. } if name == "section"
        ));
    }
}
