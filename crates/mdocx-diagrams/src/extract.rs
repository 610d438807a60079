//! Fenced diagram block extraction from raw markup text.
//!
//! Runs before tokenizing so a rendered diagram can be swapped for an
//! ordinary image reference the tokenizer understands.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::language::DiagramLanguage;

/// URL scheme of image references that point at a rendered diagram.
pub const DIAGRAM_SCHEME: &str = "diagram:";

/// A fenced diagram block found in markup text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Zero-based position among diagram blocks.
    pub index: usize,
    pub language: DiagramLanguage,
    /// Block content without the fences.
    pub source: String,
    /// Byte range of the whole block, fences included.
    pub span: Range<usize>,
}

struct OpenFence {
    language: Option<DiagramLanguage>,
    span: Range<usize>,
    source: String,
}

/// Find all closed fenced diagram blocks in `text`.
///
/// Blocks nested in block quotes and list items are found too; their
/// source has the container prefixes removed. Unclosed diagram fences and
/// fences inside other code blocks are ignored.
#[must_use]
pub fn find_diagram_blocks(text: &str) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence> = None;

    let options = Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES;
    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                open = Some(OpenFence {
                    language: DiagramLanguage::parse(fence_tag(&info)),
                    span: range,
                    source: String::new(),
                });
            }
            Event::Text(content) => {
                if let Some(fence) = &mut open {
                    fence.source.push_str(&content);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                let Some(fence) = open.take() else {
                    continue;
                };
                let Some(language) = fence.language else {
                    continue;
                };
                if !is_closed(&text[fence.span.clone()]) {
                    continue;
                }
                let mut end = fence.span.end;
                if text[end..].starts_with('\n') {
                    end += 1;
                }
                blocks.push(DiagramBlock {
                    index: blocks.len(),
                    language,
                    source: fence.source,
                    span: fence.span.start..end,
                });
            }
            _ => {}
        }
    }

    blocks
}

/// Language tag of an info string: first word, `{.lang}` braces removed.
fn fence_tag(info: &str) -> &str {
    info.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| c == '{' || c == '}' || c == '.')
}

/// Whether a fenced block's last line is a closing fence.
fn is_closed(block: &str) -> bool {
    let opening = block.trim_start_matches([' ', '>']);
    let Some(marker) = opening.chars().next().filter(|c| *c == '`' || *c == '~') else {
        return false;
    };
    let min_len = opening.chars().take_while(|c| *c == marker).count();

    let closing = block.trim_end_matches(['\n', '\r']).lines().skip(1).last();
    closing.is_some_and(|line| {
        let fence = line.trim_start_matches([' ', '\t', '>']).trim_end();
        let len = fence.chars().take_while(|c| *c == marker).count();
        len >= min_len && len == fence.chars().count()
    })
}

/// Replace blocks with image references, keeping everything else intact.
///
/// `replacement` returns the image reference for a block, or `None` to leave
/// the block untouched. Blocks must be in document order.
pub fn splice<F>(text: &str, blocks: &[DiagramBlock], mut replacement: F) -> String
where
    F: FnMut(&DiagramBlock) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for block in blocks {
        let Some(image_ref) = replacement(block) else {
            continue;
        };
        // Quote markers stay, list markers become indentation.
        let line_start = text[..block.span.start].rfind('\n').map_or(0, |i| i + 1);
        let continuation: String = text[line_start..block.span.start]
            .chars()
            .map(|c| if c == '>' { '>' } else { ' ' })
            .collect();

        // Blank lines keep the image a block of its own.
        out.push_str(&text[cursor..block.span.start]);
        out.push('\n');
        out.push_str(&continuation);
        out.push_str(&image_ref);
        out.push('\n');
        out.push_str(continuation.trim_end());
        out.push('\n');
        cursor = block.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Image reference markup for a rendered diagram.
#[must_use]
pub fn image_reference(language: DiagramLanguage, id: &str) -> String {
    format!("![{} diagram]({DIAGRAM_SCHEME}{id})", language.kroki_endpoint())
}
