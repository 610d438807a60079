//! Markup token tree.
//!
//! pulldown-cmark's flat event stream is folded once into closed block and
//! inline enums, so builders match on shapes instead of tracking open tags.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Column alignment of a markup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Align {
    fn from(value: pulldown_cmark::Alignment) -> Self {
        match value {
            pulldown_cmark::Alignment::None => Self::None,
            pulldown_cmark::Alignment::Left => Self::Left,
            pulldown_cmark::Alignment::Center => Self::Center,
            pulldown_cmark::Alignment::Right => Self::Right,
        }
    }
}

/// Constructs with no document counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    FootnoteDefinition,
    FootnoteReference,
    DefinitionList,
    Math,
    MetadataBlock,
    Other,
}

impl Unsupported {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FootnoteDefinition => "footnote definition",
            Self::FootnoteReference => "footnote reference",
            Self::DefinitionList => "definition list",
            Self::Math => "math",
            Self::MetadataBlock => "metadata block",
            Self::Other => "unknown construct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    List(List),
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    BlockQuote(Vec<Block>),
    Table(Table),
    Rule,
    Html(String),
    Unsupported(Unsupported),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

/// One list item; nested lists appear as [`Block::List`] in `blocks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<Align>,
    pub header: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        href: String,
        title: String,
        children: Vec<Inline>,
    },
    Image {
        src: String,
        alt: String,
        title: String,
    },
    Html(String),
    SoftBreak,
    HardBreak,
    Unsupported(Unsupported),
}

pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Parse markup into a block tree.
#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    let mut builder = TreeBuilder {
        events: Parser::new_ext(text, parser_options()),
    };
    builder.blocks(None)
}

/// Concatenated visible text of `inlines`.
#[must_use]
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    collect_text(inlines, &mut out);
    out
}

fn collect_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => collect_text(children, out),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Html(_) | Inline::Unsupported(_) => {}
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(text) = &inline
        && let Some(Inline::Text(last)) = inlines.last_mut()
    {
        last.push_str(text);
        return;
    }
    inlines.push(inline);
}

struct TreeBuilder<'a> {
    events: Parser<'a>,
}

impl TreeBuilder<'_> {
    /// Blocks up to `end` (or end of input).
    ///
    /// Inline events outside a paragraph (tight list items) are gathered
    /// into an implicit paragraph.
    fn blocks(&mut self, end: Option<TagEnd>) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut loose = Vec::new();

        while let Some(event) = self.events.next() {
            let block = match event {
                Event::End(tag) if end.as_ref() == Some(&tag) => break,
                Event::End(_) => continue,
                Event::Start(tag) => match self.start_block(tag) {
                    Started::Block(block) => block,
                    Started::Inline(inline) => {
                        push_inline(&mut loose, inline);
                        continue;
                    }
                },
                Event::Rule => Block::Rule,
                Event::DisplayMath(_) => Block::Unsupported(Unsupported::Math),
                Event::Html(html) => Block::Html(html.into_string()),
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut loose, inline);
                    }
                    continue;
                }
            };
            flush(&mut blocks, &mut loose);
            blocks.push(block);
        }
        flush(&mut blocks, &mut loose);
        blocks
    }

    fn start_block(&mut self, tag: Tag<'_>) -> Started {
        let block = match tag {
            Tag::Paragraph => Block::Paragraph(self.inlines(&TagEnd::Paragraph)),
            Tag::Heading { level, .. } => Block::Heading {
                level: heading_level(level),
                inlines: self.inlines(&TagEnd::Heading(level)),
            },
            Tag::BlockQuote(kind) => Block::BlockQuote(self.blocks(Some(TagEnd::BlockQuote(kind)))),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.trim_matches(|c| c == '{' || c == '}' || c == '.'))
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                Block::CodeBlock {
                    language,
                    text: self.raw_text(),
                }
            }
            Tag::HtmlBlock => Block::Html(self.raw_text()),
            Tag::List(start) => Block::List(self.list(start.is_some())),
            Tag::Table(alignments) => Block::Table(self.table(alignments)),
            Tag::FootnoteDefinition(_) => {
                self.skip();
                Block::Unsupported(Unsupported::FootnoteDefinition)
            }
            Tag::DefinitionList => {
                self.skip();
                Block::Unsupported(Unsupported::DefinitionList)
            }
            Tag::MetadataBlock(_) => {
                self.skip();
                Block::Unsupported(Unsupported::MetadataBlock)
            }
            Tag::Item
            | Tag::TableHead
            | Tag::TableRow
            | Tag::TableCell
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition => {
                self.skip();
                Block::Unsupported(Unsupported::Other)
            }
            inline => return Started::Inline(self.start_inline(inline)),
        };
        Started::Block(block)
    }

    /// Inlines up to `end`.
    fn inlines(&mut self, end: &TagEnd) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(tag) if &tag == end => break,
                Event::End(_) => {}
                Event::Start(tag) => {
                    let inline = self.start_inline(tag);
                    push_inline(&mut inlines, inline);
                }
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut inlines, inline);
                    }
                }
            }
        }
        inlines
    }

    fn start_inline(&mut self, tag: Tag<'_>) -> Inline {
        match tag {
            Tag::Emphasis => Inline::Emphasis(self.inlines(&TagEnd::Emphasis)),
            Tag::Strong => Inline::Strong(self.inlines(&TagEnd::Strong)),
            Tag::Strikethrough => Inline::Strikethrough(self.inlines(&TagEnd::Strikethrough)),
            Tag::Link {
                dest_url, title, ..
            } => Inline::Link {
                href: dest_url.into_string(),
                title: title.into_string(),
                children: self.inlines(&TagEnd::Link),
            },
            Tag::Image {
                dest_url, title, ..
            } => Inline::Image {
                src: dest_url.into_string(),
                title: title.into_string(),
                alt: plain_text(&self.inlines(&TagEnd::Image)),
            },
            _ => Inline::Text(self.skip()),
        }
    }

    fn list(&mut self, ordered: bool) -> List {
        let mut items = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(ListItem {
                    blocks: self.blocks(Some(TagEnd::Item)),
                }),
                Event::End(TagEnd::List(_)) => break,
                _ => {}
            }
        }
        List { ordered, items }
    }

    fn table(&mut self, alignments: Vec<pulldown_cmark::Alignment>) -> Table {
        let mut table = Table {
            alignments: alignments.into_iter().map(Align::from).collect(),
            header: Vec::new(),
            rows: Vec::new(),
        };
        let mut row = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::TableCell) => row.push(self.inlines(&TagEnd::TableCell)),
                Event::End(TagEnd::TableHead) => table.header = std::mem::take(&mut row),
                Event::End(TagEnd::TableRow) => table.rows.push(std::mem::take(&mut row)),
                Event::End(TagEnd::Table) => break,
                _ => {}
            }
        }
        table
    }

    /// Text content up to the end of the current tag.
    fn raw_text(&mut self) -> String {
        let mut text = String::new();
        for event in self.events.by_ref() {
            match event {
                Event::Text(t) | Event::Html(t) => text.push_str(&t),
                Event::End(_) => break,
                _ => {}
            }
        }
        text
    }

    /// Consume up to the matching end tag, returning the text seen.
    fn skip(&mut self) -> String {
        let mut depth = 1usize;
        let mut text = String::new();
        for event in self.events.by_ref() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                _ => {}
            }
        }
        text
    }
}

enum Started {
    Block(Block),
    Inline(Inline),
}

fn leaf_inline(event: Event<'_>) -> Option<Inline> {
    Some(match event {
        Event::Text(text) => Inline::Text(text.into_string()),
        Event::Code(code) => Inline::Code(code.into_string()),
        Event::InlineHtml(html) => Inline::Html(html.into_string()),
        Event::SoftBreak => Inline::SoftBreak,
        Event::HardBreak => Inline::HardBreak,
        Event::InlineMath(_) => Inline::Unsupported(Unsupported::Math),
        Event::FootnoteReference(_) => Inline::Unsupported(Unsupported::FootnoteReference),
        Event::TaskListMarker(checked) => {
            Inline::Text(if checked { "[x] " } else { "[ ] " }.to_owned())
        }
        _ => return None,
    })
}

fn flush(blocks: &mut Vec<Block>, loose: &mut Vec<Inline>) {
    if !loose.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(loose)));
    }
}
