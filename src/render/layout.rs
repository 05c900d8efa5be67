/*!
 * Flow layout and pagination for print-style output.
 *
 * Translated pages are poured into fixed-size output pages top to bottom.
 * All coordinates are in points with the origin at the top-left corner of
 * the output page; `y` is the top of a line box.
 */

use crate::document::{DocumentBlock, Page, TableCell};
use crate::errors::RenderError;
use crate::render::RenderConfig;

/// Average glyph advance of Helvetica, as a fraction of the font size
const REGULAR_ADVANCE: f32 = 0.52;
const BOLD_ADVANCE: f32 = 0.56;

/// Bullet prefix for list items (WinAnsi 0x95)
pub const BULLET: &str = "\u{2022} ";

/// One positioned element on an output page
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    /// A single line of text
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        bold: bool,
    },
    /// One table cell with its wrapped lines
    TableCell {
        row: usize,
        col: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        lines: Vec<String>,
        font_size: f32,
    },
}

/// Items placed on one output page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    pub items: Vec<LayoutItem>,
}

impl LayoutPage {
    /// Text lines on this page, in placement order
    pub fn text_lines(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                LayoutItem::Text { text, .. } => Some(text.as_str()),
                LayoutItem::TableCell { .. } => None,
            })
            .collect()
    }

    /// Cells on this page grouped by table row, in placement order
    pub fn table_rows(&self) -> Vec<Vec<&LayoutItem>> {
        let mut rows: Vec<Vec<&LayoutItem>> = Vec::new();
        for item in &self.items {
            if let LayoutItem::TableCell { col, .. } = item {
                if *col == 0 || rows.is_empty() {
                    rows.push(Vec::new());
                }
                if let Some(row) = rows.last_mut() {
                    row.push(item);
                }
            }
        }
        rows
    }
}

/// Complete layout of one render call
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<LayoutPage>,
}

/// Pagination state for one layout run
#[derive(Debug)]
struct Cursor {
    /// Top of the next line box
    y: f32,
    top: f32,
    bottom: f32,
    /// A vertical gap is owed before the next content
    gap_pending: bool,
    /// The last placed block was a list item
    in_list: bool,
    pages: Vec<LayoutPage>,
}

impl Cursor {
    fn new(config: &RenderConfig) -> Self {
        Self {
            y: config.margin,
            top: config.margin,
            bottom: config.page_height - config.margin,
            gap_pending: false,
            in_list: false,
            pages: vec![LayoutPage::default()],
        }
    }

    fn at_page_top(&self) -> bool {
        self.y <= self.top
    }

    fn remaining(&self) -> f32 {
        self.bottom - self.y
    }

    fn new_page(&mut self) {
        self.pages.push(LayoutPage::default());
        self.y = self.top;
    }

    /// Make room for `height`, breaking the page unless already at its top.
    fn reserve(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Emit the owed gap, never at the top of a page.
    fn settle_gap(&mut self, gap: f32) {
        if self.gap_pending && !self.at_page_top() {
            self.y += gap;
        }
        self.gap_pending = false;
    }

    fn push(&mut self, item: LayoutItem) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }
}

/// Estimated rendered width of `text`
pub fn text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let advance = if bold { BOLD_ADVANCE } else { REGULAR_ADVANCE };
    text.chars().count() as f32 * font_size * advance
}

/// Greedy word wrap. Explicit newlines are kept; words wider than the line are split.
pub fn wrap_text(text: &str, font_size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let advance = if bold { BOLD_ADVANCE } else { REGULAR_ADVANCE };
    let max_chars = ((max_width / (font_size * advance)).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let word: String = word.into_iter().collect();

            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn place_lines(cursor: &mut Cursor, lines: Vec<String>, x: f32, font_size: f32, bold: bool, line_height: f32) {
    for text in lines {
        cursor.reserve(line_height);
        cursor.push(LayoutItem::Text {
            x,
            y: cursor.y,
            text,
            font_size,
            bold,
        });
        cursor.y += line_height;
    }
}

fn place_table(cursor: &mut Cursor, rows: &[Vec<TableCell>], config: &RenderConfig) {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    if columns == 0 {
        return;
    }

    let font_size = config.body_font_size;
    let line_height = config.line_height(font_size);
    let padding = config.cell_padding;
    let column_width = config.content_width() / columns as f32;
    let text_width = (column_width - 2.0 * padding).max(font_size);

    cursor.reserve(line_height);

    for (r, row) in rows.iter().enumerate() {
        let wrapped: Vec<Vec<String>> = row
            .iter()
            .map(|cell| wrap_text(&cell.text, font_size, false, text_width))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let height = line_count as f32 * line_height + 2.0 * padding;

        cursor.reserve(height);
        for (c, lines) in wrapped.into_iter().enumerate() {
            cursor.push(LayoutItem::TableCell {
                row: r,
                col: c,
                x: config.margin + c as f32 * column_width,
                y: cursor.y,
                width: column_width,
                height,
                lines,
                font_size,
            });
        }
        cursor.y += height;
    }
}

/// Lay out translated pages onto output pages.
///
/// The input is not modified and nothing is kept between calls.
pub fn layout_pages(pages: &[Page], config: &RenderConfig) -> Result<Layout, RenderError> {
    config.validate()?;

    let mut cursor = Cursor::new(config);
    let body = config.body_font_size;
    let body_line = config.line_height(body);
    let width = config.content_width();

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            cursor.gap_pending = true;
        }

        for block in &page.blocks {
            let is_list = matches!(block, DocumentBlock::ListItem { .. });
            if cursor.in_list && !is_list {
                cursor.gap_pending = true;
            }

            match block {
                DocumentBlock::Heading { level, text, .. } => {
                    if !text.trim().is_empty() {
                        let size = config.heading_font_size(*level);
                        cursor.settle_gap(config.paragraph_gap);
                        let lines = wrap_text(text, size, true, width);
                        place_lines(&mut cursor, lines, config.margin, size, true, config.line_height(size));
                    }
                    cursor.gap_pending = true;
                }
                DocumentBlock::Paragraph { text, .. } => {
                    // blank paragraphs only request a gap, so runs of them collapse
                    if !text.trim().is_empty() {
                        cursor.settle_gap(config.paragraph_gap);
                        let lines = wrap_text(text, body, false, width);
                        place_lines(&mut cursor, lines, config.margin, body, false, body_line);
                    }
                    cursor.gap_pending = true;
                }
                DocumentBlock::ListItem { text, .. } => {
                    cursor.settle_gap(config.paragraph_gap);
                    let indent = text_width(BULLET, body, false);
                    let mut lines = wrap_text(text, body, false, width - indent);
                    if lines.is_empty() {
                        lines.push(String::new());
                    }
                    let mut first = true;
                    for line in lines {
                        let (x, text) = if first {
                            (config.margin, format!("{}{}", BULLET, line))
                        } else {
                            (config.margin + indent, line)
                        };
                        first = false;
                        place_lines(&mut cursor, vec![text], x, body, false, body_line);
                    }
                }
                DocumentBlock::Table { rows, .. } => {
                    cursor.settle_gap(config.paragraph_gap);
                    place_table(&mut cursor, rows, config);
                    cursor.gap_pending = true;
                }
            }
            cursor.in_list = is_list;
        }
    }

    Ok(Layout {
        page_width: config.page_width,
        page_height: config.page_height,
        pages: cursor.pages,
    })
}
