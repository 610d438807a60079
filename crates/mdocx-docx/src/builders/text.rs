use std::sync::LazyLock;

use regex::Regex;

use crate::builders::{Context, build_blocks, indent_for};
use crate::error::BuildError;
use crate::model::{DocElement, InlineElement, Paragraph, ParagraphStyle, Run, RunStyle};
use crate::session::ConversionSession;
use crate::tokens::Block;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("invalid tag regex"));
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("invalid br regex"));

/// One monospace paragraph per source line.
pub(super) fn code_block(text: &str) -> Vec<DocElement> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let style = RunStyle {
        code: true,
        ..RunStyle::default()
    };
    text.split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let children = if line.is_empty() {
                Vec::new()
            } else {
                vec![InlineElement::Run(Run::new(line, style.clone()))]
            };
            DocElement::Paragraph(Paragraph {
                spacing_after: Some(0),
                ..Paragraph::new(ParagraphStyle::CodeBlock, children)
            })
        })
        .collect()
}

/// Quote-styled, indented paragraphs. Nested quotes indent further.
pub(super) fn block_quote(
    children: &[Block],
    ctx: Context,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<DocElement>, BuildError> {
    let ctx = ctx.in_quote();
    let indent = indent_for(ctx.quote_depth - 1);
    let mut elements = build_blocks(children, ctx, session)?;
    for element in &mut elements {
        if let DocElement::Paragraph(p) = element {
            if p.style == ParagraphStyle::Normal {
                p.style = ParagraphStyle::Quote;
            }
            if p.indent.is_none() && p.numbering.is_none() {
                p.indent = Some(indent);
            }
        }
    }
    Ok(elements)
}

pub(super) fn rule() -> DocElement {
    DocElement::Paragraph(Paragraph::new(ParagraphStyle::HorizontalRule, Vec::new()))
}

/// Tag-stripped text of a raw HTML block; `<br>` becomes a line break.
pub(super) fn html_block(html: &str) -> Vec<DocElement> {
    let mut children = Vec::new();
    for (i, segment) in BR_RE.split(html).enumerate() {
        let text = decode_entities(&TAG_RE.replace_all(segment, ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if i > 0 && !children.is_empty() {
            children.push(InlineElement::Break);
        }
        if !text.is_empty() {
            children.push(InlineElement::Run(Run::new(text, RunStyle::default())));
        }
    }
    if matches!(children.last(), Some(InlineElement::Break)) {
        children.pop();
    }
    if children.is_empty() {
        return Vec::new();
    }
    vec![DocElement::Paragraph(Paragraph::new(
        ParagraphStyle::Normal,
        children,
    ))]
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
