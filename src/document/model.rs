/*!
 * Core structural model for extracted and translated documents.
 *
 * These types are the JSON-serializable representation shared by the
 * extraction oracle, the translation pipeline and the renderers. Block order
 * within a page is presentation order and is preserved by every
 * transformation.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::StructureError;

/// Page-relative coordinates of an OCR region. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// Which side of the translation a page belongs to.
///
/// Confidence values survive the metadata merge, so their presence cannot be
/// used to tell source pages from translated ones; this marker can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Produced by extraction (possibly edited by the user)
    #[default]
    Source,
    /// Produced by reinserting translated units
    Translated,
}

/// A single cell of a table block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub id: String,

    #[serde(default)]
    pub text: String,

    pub row: usize,

    pub col: usize,

    /// OCR confidence score (0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TableCell {
    /// Create a cell at the given grid position.
    pub fn new(id: impl Into<String>, text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            row,
            col,
            confidence: None,
        }
    }

    /// Set the OCR confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Kind of a block, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
    Table,
}

impl BlockKind {
    /// Wire name of the kind, as used in the `type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::ListItem => "list_item",
            Self::Table => "table",
        }
    }
}

fn default_heading_level() -> u8 {
    1
}

/// One content block of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentBlock {
    Heading {
        id: String,
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bbox: Option<BoundingBox>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
    },
    Paragraph {
        id: String,
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bbox: Option<BoundingBox>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
    },
    ListItem {
        id: String,
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bbox: Option<BoundingBox>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
    },
    Table {
        id: String,
        #[serde(default)]
        rows: Vec<Vec<TableCell>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bbox: Option<BoundingBox>,
    },
}

impl DocumentBlock {
    /// Create a heading block.
    pub fn heading(id: impl Into<String>, level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            id: id.into(),
            level,
            text: text.into(),
            bbox: None,
            confidence: None,
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Paragraph {
            id: id.into(),
            text: text.into(),
            bbox: None,
            confidence: None,
        }
    }

    /// Create a list item block.
    pub fn list_item(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ListItem {
            id: id.into(),
            text: text.into(),
            bbox: None,
            confidence: None,
        }
    }

    /// Create a table block from a grid of cell texts, assigning ids and positions.
    pub fn table_from_texts(id: impl Into<String>, grid: &[Vec<&str>]) -> Self {
        let id = id.into();
        let rows = grid
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, text)| TableCell::new(format!("{}-cell-{}-{}", id, r, c), *text, r, c))
                    .collect()
            })
            .collect();

        Self::Table { id, rows, bbox: None }
    }

    /// Attach a bounding box.
    pub fn with_bbox(mut self, value: BoundingBox) -> Self {
        match &mut self {
            Self::Heading { bbox, .. }
            | Self::Paragraph { bbox, .. }
            | Self::ListItem { bbox, .. }
            | Self::Table { bbox, .. } => *bbox = Some(value),
        }
        self
    }

    /// Attach a confidence score. Tables carry confidence per cell, so this is a no-op for them.
    pub fn with_confidence(mut self, value: f32) -> Self {
        match &mut self {
            Self::Heading { confidence, .. }
            | Self::Paragraph { confidence, .. }
            | Self::ListItem { confidence, .. } => *confidence = Some(value),
            Self::Table { .. } => {}
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Heading { id, .. }
            | Self::Paragraph { id, .. }
            | Self::ListItem { id, .. }
            | Self::Table { id, .. } => id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Heading { .. } => BlockKind::Heading,
            Self::Paragraph { .. } => BlockKind::Paragraph,
            Self::ListItem { .. } => BlockKind::ListItem,
            Self::Table { .. } => BlockKind::Table,
        }
    }

    /// Text of a text-bearing block; `None` for tables.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. } | Self::Paragraph { text, .. } | Self::ListItem { text, .. } => {
                Some(text)
            }
            Self::Table { .. } => None,
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::Heading { bbox, .. }
            | Self::Paragraph { bbox, .. }
            | Self::ListItem { bbox, .. }
            | Self::Table { bbox, .. } => *bbox,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            Self::Heading { confidence, .. }
            | Self::Paragraph { confidence, .. }
            | Self::ListItem { confidence, .. } => *confidence,
            Self::Table { .. } => None,
        }
    }

    /// Table rows; empty for non-table blocks.
    pub fn rows(&self) -> &[Vec<TableCell>] {
        match self {
            Self::Table { rows, .. } => rows,
            _ => &[],
        }
    }

    /// Number of translation units this block contributes.
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Table { rows, .. } => rows.iter().map(Vec::len).sum(),
            _ => 1,
        }
    }
}

/// A single page of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number
    pub page_number: u32,

    #[serde(default)]
    pub stage: Stage,

    /// Blocks in presentation order
    #[serde(default)]
    pub blocks: Vec<DocumentBlock>,
}

impl Page {
    /// Create an empty source page.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            stage: Stage::Source,
            blocks: Vec::new(),
        }
    }

    /// Append a block.
    pub fn with_block(mut self, block: DocumentBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Total number of translation units on this page.
    pub fn unit_count(&self) -> usize {
        self.blocks.iter().map(DocumentBlock::unit_count).sum()
    }

    /// Correct the text of a block, or of one cell when `cell_id` is given.
    ///
    /// Returns false when no matching text position exists.
    pub fn edit_text(&mut self, block_id: &str, cell_id: Option<&str>, new_text: &str) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id() == block_id) else {
            return false;
        };

        match (block, cell_id) {
            (
                DocumentBlock::Heading { text, .. }
                | DocumentBlock::Paragraph { text, .. }
                | DocumentBlock::ListItem { text, .. },
                None,
            ) => {
                *text = new_text.to_string();
                true
            }
            (DocumentBlock::Table { rows, .. }, Some(cell_id)) => {
                match rows.iter_mut().flatten().find(|cell| cell.id == cell_id) {
                    Some(cell) => {
                        cell.text = new_text.to_string();
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Check the page-local invariants.
    pub fn validate(&self) -> Vec<StructureError> {
        let page = self.page_number;
        let mut problems = Vec::new();
        let mut seen_ids = HashSet::new();

        let mut check_id = |id: &str, problems: &mut Vec<StructureError>| {
            if !seen_ids.insert(id.to_string()) {
                problems.push(StructureError::DuplicateId { page, id: id.to_string() });
            }
        };

        for block in &self.blocks {
            check_id(block.id(), &mut problems);

            if let DocumentBlock::Heading { id, level, .. } = block {
                if !(1..=6).contains(level) {
                    problems.push(StructureError::HeadingLevel {
                        page,
                        block_id: id.clone(),
                        level: *level,
                    });
                }
            }

            if let Some(value) = block.confidence() {
                if !(0.0..=1.0).contains(&value) {
                    problems.push(StructureError::Confidence { page, id: block.id().to_string(), value });
                }
            }

            if let DocumentBlock::Table { id, rows, .. } = block {
                let expected = rows.first().map(Vec::len).unwrap_or(0);
                for (r, row) in rows.iter().enumerate() {
                    if row.len() != expected {
                        problems.push(StructureError::JaggedTable {
                            page,
                            block_id: id.clone(),
                            row: r,
                            expected,
                            found: row.len(),
                        });
                    }
                    for (c, cell) in row.iter().enumerate() {
                        check_id(&cell.id, &mut problems);
                        if cell.row != r || cell.col != c {
                            problems.push(StructureError::CellPosition {
                                page,
                                cell_id: cell.id.clone(),
                                claimed_row: cell.row,
                                claimed_col: cell.col,
                                row: r,
                                col: c,
                            });
                        }
                        if let Some(value) = cell.confidence {
                            if !(0.0..=1.0).contains(&value) {
                                problems.push(StructureError::Confidence { page, id: cell.id.clone(), value });
                            }
                        }
                    }
                }
            }
        }

        problems
    }
}

/// An ordered sequence of pages, as returned by the extraction oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Check page numbering and every page's invariants.
    pub fn validate(&self) -> Result<(), StructureError> {
        validate_pages(&self.pages)
    }
}

/// Check that page numbers run 1..=N and every page is well-formed.
pub fn validate_pages(pages: &[Page]) -> Result<(), StructureError> {
    for (index, page) in pages.iter().enumerate() {
        let expected = index as u32 + 1;
        if page.page_number != expected {
            return Err(StructureError::PageNumbering { expected, found: page.page_number });
        }
        if let Some(problem) = page.validate().into_iter().next() {
            return Err(problem);
        }
    }
    Ok(())
}

/// Result of translating one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Success(Page),
    Failure {
        #[serde(rename = "pageNumber")]
        page_number: u32,
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl TranslationOutcome {
    pub fn page_number(&self) -> u32 {
        match self {
            Self::Success(page) => page.page_number,
            Self::Failure { page_number, .. } => *page_number,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The translated page, if this outcome is a success.
    pub fn page(&self) -> Option<&Page> {
        match self {
            Self::Success(page) => Some(page),
            Self::Failure { .. } => None,
        }
    }
}

/// A line returned by the image translation oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedLine {
    pub text: String,
    #[serde(default)]
    pub is_heading: bool,
}

impl TranslatedLine {
    pub fn new(text: impl Into<String>, is_heading: bool) -> Self {
        Self { text: text.into(), is_heading }
    }
}

/// Build a translated page from image-oracle lines: headings become level-1 headings,
/// everything else a paragraph.
pub fn page_from_lines(page_number: u32, lines: &[TranslatedLine]) -> Page {
    let blocks = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let id = format!("line-{}", i + 1);
            if line.is_heading {
                DocumentBlock::heading(id, 1, line.text.clone())
            } else {
                DocumentBlock::paragraph(id, line.text.clone())
            }
        })
        .collect();

    Page {
        page_number,
        stage: Stage::Translated,
        blocks,
    }
}
