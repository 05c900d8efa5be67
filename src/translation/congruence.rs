/*!
 * Structural congruence between a source page and its translation.
 *
 * Two pages are congruent when they have the same number of blocks, the same
 * block kinds in the same order, and every table has the same row count and
 * per-row cell count. Text is not compared. There is no repair: the first
 * mismatch is reported.
 */

use crate::document::Page;
use crate::errors::CongruenceError;

/// Check that `translated` has exactly the shape of `source`.
pub fn check_congruence(source: &Page, translated: &Page) -> Result<(), CongruenceError> {
    if source.blocks.len() != translated.blocks.len() {
        return Err(CongruenceError::BlockCount {
            source_count: source.blocks.len(),
            translated_count: translated.blocks.len(),
        });
    }

    for (index, (src, dst)) in source.blocks.iter().zip(&translated.blocks).enumerate() {
        if src.kind() != dst.kind() {
            return Err(CongruenceError::BlockKind {
                index,
                source_kind: src.kind().as_str(),
                translated_kind: dst.kind().as_str(),
            });
        }

        let (src_rows, dst_rows) = (src.rows(), dst.rows());
        if src_rows.len() != dst_rows.len() {
            return Err(CongruenceError::RowCount {
                index,
                source_rows: src_rows.len(),
                translated_rows: dst_rows.len(),
            });
        }

        for (row, (src_row, dst_row)) in src_rows.iter().zip(dst_rows).enumerate() {
            if src_row.len() != dst_row.len() {
                return Err(CongruenceError::CellCount {
                    index,
                    row,
                    source_cells: src_row.len(),
                    translated_cells: dst_row.len(),
                });
            }
        }
    }

    Ok(())
}
