/*!
 * Regenerated word-processor output for PDF and image sources.
 *
 * Headings become bold runs sized by level, list items bulleted paragraphs,
 * tables grids with every cell kept (empty ones included). Source pages are
 * separated by one empty paragraph, and runs of blank paragraphs collapse
 * into one.
 */

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::io::Cursor;

use crate::document::{DocumentBlock, Page};
use crate::errors::RenderError;
use crate::render::layout::BULLET;
use crate::render::RenderConfig;

/// docx-rs sizes are in half-points
fn half_points(points: f32) -> usize {
    (points * 2.0).round() as usize
}

fn text_paragraph(text: &str, size: f32, bold: bool) -> Paragraph {
    let mut run = Run::new().add_text(text).size(half_points(size));
    if bold {
        run = run.bold();
    }
    Paragraph::new().add_run(run)
}

fn table(rows: &[Vec<crate::document::TableCell>], size: f32) -> Table {
    let rows = rows
        .iter()
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| TableCell::new().add_paragraph(text_paragraph(&cell.text, size, false)))
                    .collect(),
            )
        })
        .collect();
    Table::new(rows)
}

/// Accumulates body content, inserting at most one empty paragraph per gap.
struct Body {
    docx: Docx,
    has_content: bool,
    gap_pending: bool,
}

impl Body {
    fn flush_gap(&mut self) {
        if self.gap_pending && self.has_content {
            self.docx = std::mem::take(&mut self.docx).add_paragraph(Paragraph::new());
        }
        self.gap_pending = false;
        self.has_content = true;
    }

    fn paragraph(&mut self, paragraph: Paragraph) {
        self.flush_gap();
        self.docx = std::mem::take(&mut self.docx).add_paragraph(paragraph);
    }

    fn table(&mut self, table: Table) {
        self.flush_gap();
        self.docx = std::mem::take(&mut self.docx).add_table(table);
    }
}

/// Build the document model without packing it.
///
/// Blank headings and paragraphs are not written; a run of them, like a page
/// boundary, becomes a single empty paragraph before the next content.
fn build(pages: &[Page], config: &RenderConfig) -> Docx {
    let body_size = config.body_font_size;
    let mut body = Body {
        docx: Docx::new(),
        has_content: false,
        gap_pending: false,
    };

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            body.gap_pending = true;
        }
        for block in &page.blocks {
            match block {
                DocumentBlock::Heading { text, .. } | DocumentBlock::Paragraph { text, .. }
                    if text.trim().is_empty() =>
                {
                    body.gap_pending = true;
                }
                DocumentBlock::Heading { level, text, .. } => {
                    body.paragraph(text_paragraph(text, config.heading_font_size(*level), true))
                }
                DocumentBlock::Paragraph { text, .. } => body.paragraph(text_paragraph(text, body_size, false)),
                DocumentBlock::ListItem { text, .. } => {
                    body.paragraph(text_paragraph(&format!("{}{}", BULLET, text), body_size, false))
                }
                DocumentBlock::Table { rows, .. } if rows.is_empty() => {}
                DocumentBlock::Table { rows, .. } => body.table(table(rows, body_size)),
            }
        }
    }
    body.docx
}

/// Render translated pages as a DOCX package.
pub fn render_docx(pages: &[Page], config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    config.validate()?;

    let mut buf = Cursor::new(Vec::new());
    build(pages, config)
        .build()
        .pack(&mut buf)
        .map_err(|e| RenderError::Engine {
            format: "docx",
            message: e.to_string(),
        })?;
    Ok(buf.into_inner())
}
