/*!
 * Structural document model.
 *
 * Pages, blocks, tables and cells as produced by extraction, corrected by the
 * user, and consumed by translation and rendering.
 */

pub mod model;

pub use model::{
    page_from_lines, validate_pages, BlockKind, BoundingBox, Document, DocumentBlock, Page, Stage,
    TableCell, TranslatedLine, TranslationOutcome,
};
