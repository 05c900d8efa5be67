/*!
 * Flattening of structured content into translation units.
 *
 * A unit is the text of one heading, paragraph or list item, or of one table
 * cell. Units are produced in block order, row-major inside tables, and in
 * ascending page order across pages. `reinsert` is the inverse: given exactly
 * as many strings as there were units, it rebuilds the same shape with the
 * new text.
 */

use crate::document::{DocumentBlock, Page, Stage, TableCell};
use crate::errors::TranslationError;

/// Something that can be flattened into translation units and rebuilt from them.
pub trait TranslationUnits {
    /// The shape produced by `reinsert`
    type Output;

    /// Ordered unit texts.
    fn units(&self) -> Vec<String>;

    /// Rebuild the shape with translated units.
    ///
    /// Fails with `TranslationError::Cardinality` when the number of strings differs
    /// from the number of units; nothing is truncated or padded.
    fn reinsert(&self, translated: Vec<String>) -> Result<Self::Output, TranslationError>;
}

/// True when there is nothing worth sending to an oracle.
pub fn all_blank(units: &[String]) -> bool {
    units.iter().all(|unit| unit.trim().is_empty())
}

fn check_cardinality(expected: usize, actual: usize) -> Result<(), TranslationError> {
    if expected != actual {
        return Err(TranslationError::Cardinality { expected, actual });
    }
    Ok(())
}

/// Append the units of one page to `out`.
fn collect_page_units(page: &Page, out: &mut Vec<String>) {
    for block in &page.blocks {
        match block {
            DocumentBlock::Heading { text, .. }
            | DocumentBlock::Paragraph { text, .. }
            | DocumentBlock::ListItem { text, .. } => out.push(text.clone()),
            DocumentBlock::Table { rows, .. } => {
                out.extend(rows.iter().flatten().map(|cell| cell.text.clone()));
            }
        }
    }
}

/// Rebuild one page, consuming exactly `page.unit_count()` strings from `texts`.
///
/// Bbox and confidence are not carried; they are restored by the metadata merge.
fn rebuild_page(page: &Page, texts: &mut impl Iterator<Item = String>) -> Page {
    let blocks = page
        .blocks
        .iter()
        .map(|block| match block {
            DocumentBlock::Heading { id, level, .. } => DocumentBlock::Heading {
                id: id.clone(),
                level: *level,
                text: texts.next().unwrap_or_default(),
                bbox: None,
                confidence: None,
            },
            DocumentBlock::Paragraph { id, .. } => DocumentBlock::Paragraph {
                id: id.clone(),
                text: texts.next().unwrap_or_default(),
                bbox: None,
                confidence: None,
            },
            DocumentBlock::ListItem { id, .. } => DocumentBlock::ListItem {
                id: id.clone(),
                text: texts.next().unwrap_or_default(),
                bbox: None,
                confidence: None,
            },
            DocumentBlock::Table { id, rows, .. } => DocumentBlock::Table {
                id: id.clone(),
                rows: rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| TableCell {
                                id: cell.id.clone(),
                                text: texts.next().unwrap_or_default(),
                                row: cell.row,
                                col: cell.col,
                                confidence: None,
                            })
                            .collect()
                    })
                    .collect(),
                bbox: None,
            },
        })
        .collect();

    Page {
        page_number: page.page_number,
        stage: Stage::Translated,
        blocks,
    }
}

impl TranslationUnits for Page {
    type Output = Page;

    fn units(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.unit_count());
        collect_page_units(self, &mut out);
        out
    }

    fn reinsert(&self, translated: Vec<String>) -> Result<Page, TranslationError> {
        check_cardinality(self.unit_count(), translated.len())?;
        Ok(rebuild_page(self, &mut translated.into_iter()))
    }
}

impl TranslationUnits for [Page] {
    type Output = Vec<Page>;

    fn units(&self) -> Vec<String> {
        let mut out = Vec::new();
        for page in self {
            collect_page_units(page, &mut out);
        }
        out
    }

    fn reinsert(&self, translated: Vec<String>) -> Result<Vec<Page>, TranslationError> {
        let expected = self.iter().map(Page::unit_count).sum();
        check_cardinality(expected, translated.len())?;

        let mut texts = translated.into_iter();
        Ok(self.iter().map(|page| rebuild_page(page, &mut texts)).collect())
    }
}
