//! Paragraph and character styles registered in every document.

use docx_rs::{AlignmentType, Docx, RunFonts, Style, StyleType, TableAlignmentType};

use mdocx_config::StylePreset;

use crate::model::ParagraphStyle;

/// Heading sizes in half-points, level 1 first.
const HEADING_SIZES: [usize; 6] = [32, 28, 26, 24, 22, 20];

pub(crate) const CODE_INLINE: &str = "CodeInline";
pub(crate) const HYPERLINK: &str = "Hyperlink";
pub(crate) const TABLE: &str = "Table";

/// Style id for a paragraph style, `None` for the document default.
#[must_use]
pub fn style_id(style: ParagraphStyle) -> Option<String> {
    Some(match style {
        ParagraphStyle::Normal => return None,
        ParagraphStyle::Title => "Title".to_owned(),
        ParagraphStyle::Heading(level) => format!("Heading{}", level.clamp(1, 6)),
        ParagraphStyle::CodeBlock => "CodeBlock".to_owned(),
        ParagraphStyle::Quote => "Quote".to_owned(),
        ParagraphStyle::TocHeading => "TOCHeading".to_owned(),
        ParagraphStyle::Toc(level) => format!("TOC{}", level.clamp(1, 9)),
        ParagraphStyle::HorizontalRule => "HorizontalRule".to_owned(),
    })
}

fn fonts(name: &str) -> RunFonts {
    RunFonts::new()
        .ascii(name)
        .hi_ansi(name)
        .east_asia(name)
        .cs(name)
}

/// Register default fonts and all styles from `preset`.
pub(crate) fn register(docx: Docx, preset: &StylePreset) -> Docx {
    let code_fonts = fonts(&preset.code_font);
    let code_size = preset.code_size_pt * 2;

    let mut docx = docx
        .default_fonts(fonts(&preset.body_font))
        .default_size(preset.base_size_pt * 2);

    docx = docx.add_style(
        Style::new("Title", StyleType::Paragraph)
            .name("Title")
            .size(56)
            .bold()
            .color(&preset.heading_color),
    );
    for (i, size) in HEADING_SIZES.into_iter().enumerate() {
        let level = i + 1;
        docx = docx.add_style(
            Style::new(format!("Heading{level}"), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(size)
                .bold()
                .color(&preset.heading_color),
        );
    }

    docx = docx
        .add_style(
            Style::new("CodeBlock", StyleType::Paragraph)
                .name("Code Block")
                .fonts(code_fonts.clone())
                .size(code_size),
        )
        .add_style(
            Style::new(CODE_INLINE, StyleType::Character)
                .name("Code Inline")
                .fonts(code_fonts)
                .size(code_size),
        )
        .add_style(
            Style::new(HYPERLINK, StyleType::Character)
                .name("Hyperlink")
                .color("0000FF")
                .underline("single"),
        )
        .add_style(
            Style::new("Quote", StyleType::Paragraph)
                .name("Quote")
                .italic()
                .color("595959"),
        )
        .add_style(
            Style::new("TOCHeading", StyleType::Paragraph)
                .name("TOC Heading")
                .size(HEADING_SIZES[0])
                .bold()
                .color(&preset.heading_color),
        );

    for level in 1..=3 {
        docx = docx.add_style(
            Style::new(format!("TOC{level}"), StyleType::Paragraph)
                .name(format!("toc {level}"))
                .indent(Some(240 * (level - 1)), None, None, None),
        );
    }

    docx.add_style(
        Style::new("HorizontalRule", StyleType::Paragraph)
            .name("Horizontal Rule")
            .align(AlignmentType::Center),
    )
    .add_style(
        Style::new(TABLE, StyleType::Table)
            .name("Table")
            .table_align(TableAlignmentType::Center),
    )
}
