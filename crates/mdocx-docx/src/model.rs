//! Document element tree handed to the writer.

/// Paragraph style, mapped to a style id by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Title,
    Heading(u8),
    CodeBlock,
    Quote,
    TocHeading,
    Toc(u8),
    HorizontalRule,
}

/// Character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub code: bool,
    pub hyperlink: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    #[must_use]
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Embedded raster with its intrinsic pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// PNG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineElement {
    Run(Run),
    Break,
    Image(Image),
    BookmarkStart { id: usize, name: String },
    BookmarkEnd { id: usize },
    /// Hyperlink to a bookmark in this document.
    InternalRef { anchor: String, runs: Vec<Run> },
    ExternalRef { url: String, runs: Vec<Run> },
}

/// Reference to a numbering instance at a nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: usize,
    pub level: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub children: Vec<InlineElement>,
    /// Left indent in twips.
    pub indent: Option<i32>,
    /// Space after in twips.
    pub spacing_after: Option<u32>,
    pub numbering: Option<NumberingRef>,
    pub alignment: Alignment,
}

impl Paragraph {
    #[must_use]
    pub fn new(style: ParagraphStyle, children: Vec<InlineElement>) -> Self {
        Self {
            style,
            children,
            ..Self::default()
        }
    }

    /// Visible text of runs and links.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                InlineElement::Run(run) => out.push_str(&run.text),
                InlineElement::InternalRef { runs, .. } | InlineElement::ExternalRef { runs, .. } => {
                    runs.iter().for_each(|r| out.push_str(&r.text));
                }
                InlineElement::Break => out.push('\n'),
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
    /// Background fill as hex RGB.
    pub shading: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocElement {
    Paragraph(Paragraph),
    Table(Table),
}

/// One list instance. Every instance restarts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingDefinition {
    pub id: usize,
    pub ordered: bool,
}

/// Core document properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
}

/// Complete element tree of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub elements: Vec<DocElement>,
    pub numberings: Vec<NumberingDefinition>,
    pub properties: DocumentProperties,
}

impl Document {
    /// Top-level paragraphs in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(|e| match e {
            DocElement::Paragraph(p) => Some(p),
            DocElement::Table(_) => None,
        })
    }
}
