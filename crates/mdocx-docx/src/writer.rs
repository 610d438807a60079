//! Element tree to DOCX bytes via docx-rs.

use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, Hyperlink, HyperlinkType, IndentLevel,
    Level, LevelJc, LevelText, LineSpacing, NumberFormat, Numbering, NumberingId,
    PageOrientationType, Pic, Run as DocxRun, Shading, SpecialIndentType, Start,
    Table as DocxTable, TableCell as DocxTableCell, TableRow as DocxTableRow,
};

use mdocx_config::{PageOrientation, StylePreset};

use crate::error::WriteError;
use crate::model::{
    Alignment, DocElement, Document, InlineElement, NumberingDefinition, Paragraph, Run, Table,
};
use crate::styles::{self, CODE_INLINE, HYPERLINK, TABLE};

const EMU_PER_PIXEL: u32 = 9525;
/// 6 inches of text width.
const MAX_IMAGE_WIDTH_EMU: u32 = 5_486_400;

/// A4 in twips.
const A4_SHORT: u32 = 11_906;
const A4_LONG: u32 = 16_838;

const BULLETS: [&str; 6] = ["\u{2022}", "\u{25cb}", "\u{25aa}", "\u{25ab}", "\u{25c6}", "\u{25c7}"];
const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

/// Page and style settings for packing.
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    pub style: StylePreset,
    pub orientation: PageOrientation,
}

/// Pack `document` into DOCX bytes.
pub fn write_docx(document: &Document, options: &WriterOptions) -> Result<Vec<u8>, WriteError> {
    let mut docx = styles::register(Docx::new(), &options.style);

    if options.orientation == PageOrientation::Landscape {
        docx = docx
            .page_size(A4_LONG, A4_SHORT)
            .page_orient(PageOrientationType::Landscape);
    }

    let properties = &document.properties;
    for (name, value) in [
        ("title", &properties.title),
        ("author", &properties.author),
        ("subject", &properties.subject),
        ("description", &properties.description),
    ] {
        if let Some(value) = value {
            docx = docx.custom_property(name, value);
        }
    }

    for definition in &document.numberings {
        docx = docx
            .add_abstract_numbering(abstract_numbering(*definition))
            .add_numbering(Numbering::new(definition.id, definition.id));
    }

    for element in &document.elements {
        docx = match element {
            DocElement::Paragraph(p) => docx.add_paragraph(paragraph(p)),
            DocElement::Table(t) => docx.add_table(table(t)),
        };
    }

    let mut buffer = Vec::new();
    docx.build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| WriteError::Pack(e.to_string()))?;
    tracing::debug!(bytes = buffer.len(), "packed document");
    Ok(buffer)
}

/// Nine levels; each numbering instance has its own abstract definition so
/// it restarts at 1.
fn abstract_numbering(definition: NumberingDefinition) -> AbstractNumbering {
    let mut numbering = AbstractNumbering::new(definition.id);
    for level in 0..9 {
        let (format, text) = if definition.ordered {
            (
                ORDERED_FORMATS[level % ORDERED_FORMATS.len()],
                format!("%{}.", level + 1),
            )
        } else {
            ("bullet", BULLETS[level.min(BULLETS.len() - 1)].to_owned())
        };
        let indent = i32::try_from(720 * (level + 1)).unwrap_or(i32::MAX);
        let hanging = if definition.ordered { 420 } else { 360 };
        numbering = numbering.add_level(
            Level::new(
                level,
                Start::new(1),
                NumberFormat::new(format),
                LevelText::new(text),
                LevelJc::new("left"),
            )
            .indent(
                Some(indent),
                Some(SpecialIndentType::Hanging(hanging)),
                None,
                None,
            ),
        );
    }
    numbering
}

fn paragraph(p: &Paragraph) -> docx_rs::Paragraph {
    let mut para = docx_rs::Paragraph::new();
    if let Some(style) = styles::style_id(p.style) {
        para = para.style(&style);
    }
    if let Some(numbering) = p.numbering {
        para = para.numbering(
            NumberingId::new(numbering.num_id),
            IndentLevel::new(numbering.level),
        );
    }
    if let Some(indent) = p.indent {
        para = para.indent(Some(indent), None, None, None);
    }
    if let Some(after) = p.spacing_after {
        para = para.line_spacing(LineSpacing::new().after(after));
    }
    match p.alignment {
        Alignment::Left => {}
        Alignment::Center => para = para.align(AlignmentType::Center),
        Alignment::Right => para = para.align(AlignmentType::Right),
    }

    for child in &p.children {
        para = match child {
            InlineElement::Run(r) => para.add_run(run(r)),
            InlineElement::Break => para.add_run(DocxRun::new().add_break(BreakType::TextWrapping)),
            InlineElement::Image(image) => {
                let (width, height) = image_size_emu(image.width, image.height);
                para.add_run(DocxRun::new().add_image(Pic::new(&image.bytes).size(width, height)))
            }
            InlineElement::BookmarkStart { id, name } => para.add_bookmark_start(*id, name),
            InlineElement::BookmarkEnd { id } => para.add_bookmark_end(*id),
            InlineElement::InternalRef { anchor, runs } => {
                para.add_hyperlink(hyperlink(anchor, HyperlinkType::Anchor, runs))
            }
            InlineElement::ExternalRef { url, runs } => {
                para.add_hyperlink(hyperlink(url, HyperlinkType::External, runs))
            }
        };
    }
    para
}

fn hyperlink(target: &str, kind: HyperlinkType, runs: &[Run]) -> Hyperlink {
    runs.iter()
        .fold(Hyperlink::new(target, kind), |link, r| link.add_run(run(r)))
}

fn run(r: &Run) -> DocxRun {
    let style = &r.style;
    let mut run = DocxRun::new();
    if style.code {
        run = run.style(CODE_INLINE);
    } else if style.hyperlink {
        run = run.style(HYPERLINK);
    }
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    if style.strike {
        run = run.strike();
    }
    if style.underline {
        run = run.underline("single");
    }
    run.add_text(&r.text)
}

fn table(t: &Table) -> DocxTable {
    let rows = t
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .cells
                .iter()
                .map(|cell| {
                    let mut out = DocxTableCell::new();
                    for p in &cell.paragraphs {
                        out = out.add_paragraph(paragraph(p));
                    }
                    if cell.paragraphs.is_empty() {
                        out = out.add_paragraph(docx_rs::Paragraph::new());
                    }
                    if let Some(fill) = &cell.shading {
                        out = out.shading(Shading::new().fill(fill));
                    }
                    out
                })
                .collect();
            DocxTableRow::new(cells)
        })
        .collect();
    DocxTable::new(rows).style(TABLE)
}

/// Intrinsic pixel size in EMU, scaled down to the text width.
fn image_size_emu(width: u32, height: u32) -> (u32, u32) {
    let width_emu = u64::from(width) * u64::from(EMU_PER_PIXEL);
    let height_emu = u64::from(height) * u64::from(EMU_PER_PIXEL);
    let max = u64::from(MAX_IMAGE_WIDTH_EMU);
    let (w, h) = if width_emu > max {
        (max, height_emu * max / width_emu)
    } else {
        (width_emu, height_emu)
    };
    (
        u32::try_from(w).unwrap_or(MAX_IMAGE_WIDTH_EMU),
        u32::try_from(h).unwrap_or(u32::MAX),
    )
}
