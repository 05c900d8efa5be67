/*!
 * Metadata merge of a source page onto its translation.
 */

use crate::document::{DocumentBlock, Page, Stage, TableCell};
use crate::errors::CongruenceError;
use crate::translation::congruence::check_congruence;

/// Build the merged translated page.
///
/// Blocks and cells are paired by position, not by id. Text comes from
/// `translated`; ids, heading levels, cell positions, bbox and confidence come
/// from `source`. Neither input is modified.
pub fn merge_metadata(source: &Page, translated: &Page) -> Result<Page, CongruenceError> {
    check_congruence(source, translated)?;

    let blocks = source
        .blocks
        .iter()
        .zip(&translated.blocks)
        .map(|(src, dst)| {
            let text = dst.text().unwrap_or_default().to_string();
            match src {
                DocumentBlock::Heading { id, level, bbox, confidence, .. } => DocumentBlock::Heading {
                    id: id.clone(),
                    level: *level,
                    text,
                    bbox: *bbox,
                    confidence: *confidence,
                },
                DocumentBlock::Paragraph { id, bbox, confidence, .. } => DocumentBlock::Paragraph {
                    id: id.clone(),
                    text,
                    bbox: *bbox,
                    confidence: *confidence,
                },
                DocumentBlock::ListItem { id, bbox, confidence, .. } => DocumentBlock::ListItem {
                    id: id.clone(),
                    text,
                    bbox: *bbox,
                    confidence: *confidence,
                },
                DocumentBlock::Table { id, rows, bbox } => DocumentBlock::Table {
                    id: id.clone(),
                    rows: rows
                        .iter()
                        .zip(dst.rows())
                        .map(|(src_row, dst_row)| {
                            src_row
                                .iter()
                                .zip(dst_row)
                                .map(|(src_cell, dst_cell)| TableCell {
                                    id: src_cell.id.clone(),
                                    text: dst_cell.text.clone(),
                                    row: src_cell.row,
                                    col: src_cell.col,
                                    confidence: src_cell.confidence,
                                })
                                .collect()
                        })
                        .collect(),
                    bbox: *bbox,
                },
            }
        })
        .collect();

    Ok(Page {
        page_number: source.page_number,
        stage: Stage::Translated,
        blocks,
    })
}
