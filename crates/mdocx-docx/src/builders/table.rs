use crate::builders::build_inlines;
use crate::error::BuildError;
use crate::model::{Alignment, Paragraph, ParagraphStyle, RunStyle, Table, TableCell, TableRow};
use crate::session::ConversionSession;
use crate::tokens::{self, Align, Inline};

/// Header cell fill.
pub(crate) const HEADER_SHADING: &str = "D9D9D9";

/// Build a table. Rows are padded to the widest row.
pub(super) fn build(
    table: &tokens::Table,
    session: &mut ConversionSession<'_>,
) -> Result<Table, BuildError> {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.header.len()))
        .max()
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    if !table.header.is_empty() {
        let bold = RunStyle {
            bold: true,
            ..RunStyle::default()
        };
        rows.push(TableRow {
            cells: row_cells(&table.header, columns, &table.alignments, &bold, session)?
                .into_iter()
                .map(|cell| TableCell {
                    shading: Some(HEADER_SHADING.to_owned()),
                    ..cell
                })
                .collect(),
            header: true,
        });
    }
    for row in &table.rows {
        rows.push(TableRow {
            cells: row_cells(row, columns, &table.alignments, &RunStyle::default(), session)?,
            header: false,
        });
    }
    Ok(Table { rows })
}

fn row_cells(
    cells: &[Vec<Inline>],
    columns: usize,
    alignments: &[Align],
    style: &RunStyle,
    session: &mut ConversionSession<'_>,
) -> Result<Vec<TableCell>, BuildError> {
    (0..columns)
        .map(|col| {
            let inlines = cells.get(col).map_or(&[][..], Vec::as_slice);
            let paragraph = Paragraph {
                alignment: match alignments.get(col) {
                    Some(Align::Center) => Alignment::Center,
                    Some(Align::Right) => Alignment::Right,
                    _ => Alignment::Left,
                },
                ..Paragraph::new(
                    ParagraphStyle::Normal,
                    build_inlines(inlines, style, session)?,
                )
            };
            Ok(TableCell {
                paragraphs: vec![paragraph],
                shading: None,
            })
        })
        .collect()
}
