//! Markup repairs applied before tokenizing.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

use crate::tokens::parser_options;

/// `[A]([B](URL))`: a link whose destination is itself a link.
static NESTED_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(\[[^\]]*\]\(([^)\s]+)\)\)").expect("invalid nested link regex")
});

/// Collapse nested links into `[A](URL)`. Code blocks and code spans are
/// left as written.
#[must_use]
pub fn fix_nested_links(text: &str) -> Cow<'_, str> {
    if !NESTED_LINK_RE.is_match(text) {
        return Cow::Borrowed(text);
    }
    let code = code_ranges(text);
    NESTED_LINK_RE.replace_all(text, |caps: &Captures<'_>| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if code.iter().any(|range| range.contains(&start)) {
            caps[0].to_owned()
        } else {
            format!("[{}]({})", &caps[1], &caps[2])
        }
    })
}

/// Byte ranges of fenced/indented code blocks and inline code spans.
fn code_ranges(text: &str) -> Vec<Range<usize>> {
    Parser::new_ext(text, parser_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_link_collapsed() {
        assert_eq!(
            fix_nested_links("See [Guide]([guide](https://example.com/guide)) now"),
            "See [Guide](https://example.com/guide) now"
        );
    }

    #[test]
    fn test_plain_links_untouched() {
        let text = "[a](https://a.example) and [b](#b)";
        assert!(matches!(fix_nested_links(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_code_left_as_written() {
        let text = "```md\n[A]([B](https://x.test))\n```\n\nInline `[A]([B](u))` span.\n";
        assert_eq!(fix_nested_links(text), text);
    }

    #[test]
    fn test_code_and_prose_mixed() {
        assert_eq!(
            fix_nested_links("`[A]([B](u))` then [C]([D](v))\n\n    [E]([F](w))\n"),
            "`[A]([B](u))` then [C](v)\n\n    [E]([F](w))\n"
        );
    }

    #[test]
    fn test_multiple_nested_links() {
        assert_eq!(
            fix_nested_links("[A]([x](u1)) [B]([y](u2))"),
            "[A](u1) [B](u2)"
        );
    }
}
